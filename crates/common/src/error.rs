//! Error types shared across SceneCast crates.

use std::path::PathBuf;

/// Top-level error type for SceneCast operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneCastError {
    /// Surface or context acquisition failed. Fatal for the engine.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Codec configuration or per-frame encode failure.
    #[error("Encoder error: {message}")]
    Encoder { message: String },

    /// The container produced no buffer after finalize.
    #[error("Muxer finalize error: {message}")]
    MuxerFinalize { message: String },

    /// Caller-initiated cancellation. Not a failure.
    #[error("Export cancelled")]
    Cancelled,

    /// A recorder finished with a zero-byte result.
    #[error("Empty output: {message}")]
    EmptyOutput { message: String },

    /// Worker message out of order, unknown, or from a newer protocol.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("Scene error: {message}")]
    Scene { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using SceneCastError.
pub type SceneCastResult<T> = Result<T, SceneCastError>;

impl SceneCastError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder {
            message: msg.into(),
        }
    }

    pub fn muxer_finalize(msg: impl Into<String>) -> Self {
        Self::MuxerFinalize {
            message: msg.into(),
        }
    }

    pub fn empty_output(msg: impl Into<String>) -> Self {
        Self::EmptyOutput {
            message: msg.into(),
        }
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol {
            message: msg.into(),
        }
    }

    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// True when the export was stopped by the caller rather than broken.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Encoder and muxer failures are reported to the UI the same way.
    pub fn is_encoder_class(&self) -> bool {
        matches!(self, Self::Encoder { .. } | Self::MuxerFinalize { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_distinguishable() {
        let err = SceneCastError::Cancelled;
        assert!(err.is_cancelled());
        assert!(!err.is_encoder_class());
        assert_eq!(err.to_string(), "Export cancelled");
    }

    #[test]
    fn test_muxer_finalize_is_encoder_class() {
        let err = SceneCastError::muxer_finalize("no buffer");
        assert!(err.is_encoder_class());
        assert!(!err.is_cancelled());
        assert!(err.to_string().contains("no buffer"));
    }
}
