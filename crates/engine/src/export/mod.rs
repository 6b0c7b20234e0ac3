//! Video export.
//!
//! Two pipelines share one entry point:
//!
//! - **Offline**: seeks frame by frame and feeds an isolated encode worker.
//!   Frame-exact and independent of CPU speed.
//! - **Realtime**: plays the timeline at wall-clock speed while a streaming
//!   recorder captures what is painted. Progress is time-based.
//!
//! Both disable looping and editor overlays for their duration and restore
//! them on every exit path. An export borrows the engine mutably, so only
//! one can run per engine.

mod offline;
mod realtime;

use std::path::Path;
use std::time::Instant;

use scenecast_common::{CancelToken, ExportMode, SceneCastError, SceneCastResult};

use crate::engine::Engine;

pub use offline::OFFLINE_MIME_TYPE;

/// Progress callback for exports.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames submitted (offline) or captured (realtime) so far.
    pub frames_rendered: u64,

    /// Total frames to render. Zero when not known in advance.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    /// The export ended with an error other than cancellation.
    Failed,
}

/// A finished video file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoBlob {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl VideoBlob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Conventional file extension for the container.
    pub fn extension(&self) -> &'static str {
        match self.mime_type {
            "video/webm" => "webm",
            _ => "mkv",
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SceneCastResult<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Engine state an export overrides and must put back.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SavedState {
    looping: bool,
    overlays: bool,
}

/// Reports progress with a running ETA.
pub(crate) struct ProgressReporter {
    callback: Option<ProgressCallback>,
    started: Instant,
    total_frames: u64,
    last_progress: f64,
    last_frames: u64,
}

impl ProgressReporter {
    pub(crate) fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            started: Instant::now(),
            total_frames: 0,
            last_progress: 0.0,
            last_frames: 0,
        }
    }

    pub(crate) fn set_total_frames(&mut self, total_frames: u64) {
        self.total_frames = total_frames;
    }

    pub(crate) fn report(&mut self, progress: f64, frames_rendered: u64, stage: ExportStage) {
        let progress = progress.clamp(0.0, 1.0);
        self.last_progress = progress;
        self.last_frames = frames_rendered;
        let Some(cb) = &self.callback else {
            return;
        };
        let elapsed = self.started.elapsed().as_secs_f64();
        let eta_secs = if progress > 0.0 && progress < 1.0 {
            elapsed / progress * (1.0 - progress)
        } else {
            0.0
        };
        cb(ExportProgress {
            progress,
            frames_rendered,
            total_frames: self.total_frames,
            eta_secs,
            stage,
        });
    }

    /// Close out a failed export at the last reported position.
    /// Cancellation is not reported.
    pub(crate) fn finish(&mut self, result: &SceneCastResult<VideoBlob>) {
        if let Err(err) = result {
            if !err.is_cancelled() {
                self.report(self.last_progress, self.last_frames, ExportStage::Failed);
            }
        }
    }
}

impl Engine {
    /// Export the timeline as a video with the chosen pipeline.
    pub async fn export_video(
        &mut self,
        duration_ms: f64,
        fps: u32,
        mode: ExportMode,
        on_progress: Option<ProgressCallback>,
        cancel: &CancelToken,
    ) -> SceneCastResult<VideoBlob> {
        match mode {
            ExportMode::Offline => {
                self.export_offline(duration_ms, fps, on_progress, cancel)
                    .await
            }
            ExportMode::Realtime => {
                self.export_realtime(duration_ms, fps, on_progress, cancel)
                    .await
            }
        }
    }

    /// Disable looping and overlays for an export.
    pub(crate) fn begin_export(&mut self) -> SavedState {
        let saved = SavedState {
            looping: self.looping,
            overlays: self.overlays,
        };
        self.looping = false;
        self.overlays = false;
        saved
    }

    /// Undo [`Engine::begin_export`] and detach any recorder.
    pub(crate) fn end_export(&mut self, saved: SavedState) {
        if let Some(mut capture) = self.capture.take() {
            capture.recorder.abort();
        }
        self.looping = saved.looping;
        self.overlays = saved.overlays;
        self.render();
    }
}

/// Log an export outcome. Cancellation is not a failure.
pub(crate) fn log_outcome(pipeline: &str, result: &SceneCastResult<VideoBlob>) {
    match result {
        Ok(blob) => tracing::info!(pipeline, bytes = blob.len(), "Export complete"),
        Err(err) if err.is_cancelled() => tracing::info!(pipeline, "Export cancelled"),
        Err(err) => tracing::warn!(pipeline, error = %err, "Export failed"),
    }
}

pub(crate) fn validate_request(duration_ms: f64, fps: u32) -> SceneCastResult<()> {
    if !(duration_ms.is_finite() && duration_ms >= 0.0) {
        return Err(SceneCastError::configuration(format!(
            "export duration must be non-negative, got {duration_ms}"
        )));
    }
    if fps == 0 {
        return Err(SceneCastError::configuration(
            "export fps must be positive",
        ));
    }
    Ok(())
}
