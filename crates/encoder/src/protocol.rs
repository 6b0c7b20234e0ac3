//! Wire contract between the exporter and the encoding worker.
//!
//! Both directions are closed sets of tagged messages. Decoding a message
//! with an unknown tag fails; nothing is silently ignored.
//!
//! Ordering: exactly one `CONFIG` -> `READY` handshake precedes any
//! `ENCODE_FRAME`, and exactly one `FINALIZE` follows the last frame and
//! yields exactly one terminal `COMPLETE` or `ERROR`.

use serde::{Deserialize, Serialize};

use scenecast_common::{SceneCastError, SceneCastResult};
use scenecast_render_engine::Frame;

/// Version sent in `CONFIG`. Workers refuse newer versions.
pub const PROTOCOL_VERSION: u32 = 1;

/// Exporter to worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerRequest {
    Config {
        width: u32,
        height: u32,
        fps: u32,
        bitrate: u32,
        protocol_version: u32,
    },
    EncodeFrame {
        frame: Frame,
        timestamp_us: i64,
        is_key_frame: bool,
        #[serde(default)]
        duration_us: Option<i64>,
    },
    Finalize,
}

/// Which part of the worker failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Encoder,
    Muxer,
    Protocol,
}

/// Worker to exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerResponse {
    Ready,
    Progress {
        /// Frames accepted by the encoder but not yet emitted.
        queue_depth: usize,
        /// `ENCODE_FRAME` messages taken off the channel so far.
        frames_received: usize,
    },
    Complete {
        buffer: Vec<u8>,
    },
    Error {
        class: FailureClass,
        message: String,
    },
}

impl WorkerRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerRequest::Config { .. } => "CONFIG",
            WorkerRequest::EncodeFrame { .. } => "ENCODE_FRAME",
            WorkerRequest::Finalize => "FINALIZE",
        }
    }

    /// Decode a JSON message, rejecting unknown kinds.
    pub fn from_json(json: &str) -> SceneCastResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| SceneCastError::protocol(format!("bad worker request: {e}")))
    }
}

impl WorkerResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerResponse::Ready => "READY",
            WorkerResponse::Progress { .. } => "PROGRESS",
            WorkerResponse::Complete { .. } => "COMPLETE",
            WorkerResponse::Error { .. } => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerResponse::Complete { .. } | WorkerResponse::Error { .. }
        )
    }

    /// Decode a JSON message, rejecting unknown kinds.
    pub fn from_json(json: &str) -> SceneCastResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| SceneCastError::protocol(format!("bad worker response: {e}")))
    }

    pub fn error(class: FailureClass, message: impl Into<String>) -> Self {
        WorkerResponse::Error {
            class,
            message: message.into(),
        }
    }
}

impl FailureClass {
    /// Map a worker-reported failure back into the error taxonomy.
    pub fn into_error(self, message: String) -> SceneCastError {
        match self {
            FailureClass::Encoder => SceneCastError::encoder(message),
            FailureClass::Muxer => SceneCastError::muxer_finalize(message),
            FailureClass::Protocol => SceneCastError::protocol(message),
        }
    }

    /// Classify a worker-side error for the wire.
    pub fn of(err: &SceneCastError) -> Self {
        match err {
            SceneCastError::MuxerFinalize { .. } => FailureClass::Muxer,
            SceneCastError::Protocol { .. } => FailureClass::Protocol,
            _ => FailureClass::Encoder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_screaming_snake_case() {
        let json = serde_json::to_value(WorkerRequest::Finalize).unwrap();
        assert_eq!(json["type"], "FINALIZE");
        let json = serde_json::to_value(WorkerResponse::Progress {
            queue_depth: 3,
            frames_received: 7,
        })
        .unwrap();
        assert_eq!(json["type"], "PROGRESS");
        assert_eq!(json["queue_depth"], 3);
    }

    #[test]
    fn test_unknown_kinds_are_rejected() {
        let err = WorkerRequest::from_json(r#"{"type":"PAUSE"}"#).unwrap_err();
        assert!(matches!(err, SceneCastError::Protocol { .. }));
        assert!(WorkerResponse::from_json(r#"{"type":"HEARTBEAT"}"#).is_err());
        assert!(WorkerRequest::from_json(r#"{"kind":"FINALIZE"}"#).is_err());
    }

    #[test]
    fn test_encode_frame_decodes_with_optional_duration() {
        let json = r#"{"type":"ENCODE_FRAME","frame":{"width":1,"height":1,"data":[1,2,3,4]},"timestamp_us":33333,"is_key_frame":false}"#;
        let req = WorkerRequest::from_json(json).unwrap();
        let WorkerRequest::EncodeFrame {
            timestamp_us,
            duration_us,
            ..
        } = req
        else {
            panic!("wrong kind");
        };
        assert_eq!(timestamp_us, 33_333);
        assert_eq!(duration_us, None);
    }

    #[test]
    fn test_failure_class_maps_to_taxonomy() {
        let err = FailureClass::Muxer.into_error("no buffer".to_string());
        assert!(matches!(err, SceneCastError::MuxerFinalize { .. }));
        assert!(err.is_encoder_class());
        assert_eq!(FailureClass::of(&err), FailureClass::Muxer);
        assert_eq!(
            FailureClass::of(&SceneCastError::encoder("x")),
            FailureClass::Encoder
        );
    }
}
