//! Live-playback export through a streaming recorder.

use std::time::{Duration, Instant};

use scenecast_common::{CancelToken, SceneCastError, SceneCastResult};
use scenecast_encoder::{StreamConfig, StreamRecorder};
use scenecast_render_engine::even_dimensions;

use super::{
    log_outcome, validate_request, ExportStage, ProgressCallback, ProgressReporter, VideoBlob,
};
use crate::engine::{Capture, Engine};

/// Progress never reads complete until the recorder has finished.
const MAX_LIVE_PROGRESS: f64 = 0.99;

impl Engine {
    /// Play `duration_ms` of timeline in real time and record it.
    ///
    /// Progress is wall-clock derived and therefore approximate.
    pub async fn export_realtime(
        &mut self,
        duration_ms: f64,
        fps: u32,
        on_progress: Option<ProgressCallback>,
        cancel: &CancelToken,
    ) -> SceneCastResult<VideoBlob> {
        let recorder = (self.recorder_factory)();
        self.export_realtime_with(recorder, duration_ms, fps, on_progress, cancel)
            .await
    }

    /// [`Engine::export_realtime`] with an explicit recorder.
    pub async fn export_realtime_with(
        &mut self,
        recorder: Box<dyn StreamRecorder>,
        duration_ms: f64,
        fps: u32,
        on_progress: Option<ProgressCallback>,
        cancel: &CancelToken,
    ) -> SceneCastResult<VideoBlob> {
        self.pause();
        let saved = self.begin_export();
        let mut reporter = ProgressReporter::new(on_progress);
        let result = self
            .run_realtime(recorder, duration_ms, fps, &mut reporter, cancel)
            .await;
        if self.playing {
            self.pause();
        }
        self.end_export(saved);
        reporter.finish(&result);
        log_outcome("realtime", &result);
        result
    }

    async fn run_realtime(
        &mut self,
        mut recorder: Box<dyn StreamRecorder>,
        duration_ms: f64,
        fps: u32,
        reporter: &mut ProgressReporter,
        cancel: &CancelToken,
    ) -> SceneCastResult<VideoBlob> {
        validate_request(duration_ms, fps)?;
        let (width, height) = even_dimensions(self.scene.width, self.scene.height);
        if width == 0 || height == 0 {
            return Err(SceneCastError::encoder(format!(
                "canvas {}x{} is too small to record",
                self.scene.width, self.scene.height
            )));
        }
        reporter.report(0.0, 0, ExportStage::Preparing);

        let config = StreamConfig {
            width,
            height,
            fps,
            bitrate_bps: self.export_defaults.bitrate_bps,
            jpeg_quality: self.export_defaults.jpeg_quality,
        };
        cancel.check()?;
        recorder.start(&config)?;
        let mime_type = recorder.mime_type();
        tracing::info!(
            recorder = recorder.name(),
            width,
            height,
            fps,
            duration_ms,
            "Realtime export started"
        );
        self.capture = Some(Capture::new(recorder, width, height, fps));

        self.seek(0.0);
        self.play();

        let poll = Duration::from_millis(self.export_defaults.progress_poll_ms.max(1));
        let mut last_report: Option<Instant> = None;
        let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if cancel.is_cancelled() {
                self.pause();
                return Err(SceneCastError::Cancelled);
            }
            self.tick(Instant::now());
            if let Some(err) = self.capture.as_mut().and_then(|c| c.error.take()) {
                return Err(err);
            }

            if last_report.map_or(true, |at| at.elapsed() >= poll) {
                let progress = if duration_ms > 0.0 {
                    (self.current_time_ms / duration_ms).min(MAX_LIVE_PROGRESS)
                } else {
                    MAX_LIVE_PROGRESS
                };
                reporter.report(progress, self.captured_frames(), ExportStage::Rendering);
                last_report = Some(Instant::now());
            }

            if !self.playing || self.current_time_ms >= duration_ms {
                break;
            }
        }

        self.pause();
        let Some(mut capture) = self.capture.take() else {
            return Err(SceneCastError::encoder("recorder detached during export"));
        };
        if let Some(err) = capture.error.take() {
            capture.recorder.abort();
            return Err(err);
        }
        let frames = capture.recorder.stats().frames_captured;
        reporter.report(MAX_LIVE_PROGRESS, frames, ExportStage::Finalizing);
        let bytes = capture.recorder.stop()?;
        if bytes.is_empty() {
            return Err(SceneCastError::empty_output(format!(
                "{} recorder produced no data",
                capture.recorder.name()
            )));
        }
        reporter.report(1.0, frames, ExportStage::Complete);
        Ok(VideoBlob { bytes, mime_type })
    }

    fn captured_frames(&self) -> u64 {
        self.capture
            .as_ref()
            .map(|c| c.recorder.stats().frames_captured)
            .unwrap_or(0)
    }
}
