//! Seek-driven export through the encode worker.

use std::sync::Arc;
use std::time::Duration;

use scenecast_common::{
    frame_duration_us, frame_time_ms, frame_timestamp_us, CancelToken, SceneCastError,
    SceneCastResult,
};
use scenecast_encoder::{
    EncodeWorker, WorkerLink, WorkerRequest, WorkerResponse, DEFAULT_CHANNEL_CAPACITY,
    PROTOCOL_VERSION,
};
use scenecast_render_engine::even_dimensions;

use super::{
    log_outcome, validate_request, ExportStage, ProgressCallback, ProgressReporter, VideoBlob,
};
use crate::engine::Engine;

/// MIME type of offline exports (MJPEG in Matroska).
pub const OFFLINE_MIME_TYPE: &str = "video/x-matroska";

/// How long to wait on the worker before re-checking cancellation.
const WORKER_POLL: Duration = Duration::from_millis(5);

/// Yield to the runtime every this many frames.
const YIELD_EVERY: u64 = 4;

/// Producer-side view of the worker's backlog.
#[derive(Debug, Default)]
struct Backlog {
    /// Last queue depth the worker reported.
    reported_depth: usize,
    /// Frames the worker has taken off the channel.
    frames_received: usize,
    /// Frames sent.
    frames_sent: usize,
}

impl Backlog {
    /// Frames sent but not yet encoded, as far as the producer knows.
    fn depth(&self) -> usize {
        self.reported_depth + self.frames_sent.saturating_sub(self.frames_received)
    }

    /// Fold in a non-terminal message.
    fn absorb(&mut self, msg: WorkerResponse) -> SceneCastResult<()> {
        match msg {
            WorkerResponse::Progress {
                queue_depth,
                frames_received,
            } => {
                self.reported_depth = queue_depth;
                self.frames_received = self.frames_received.max(frames_received);
                Ok(())
            }
            WorkerResponse::Error { class, message } => Err(class.into_error(message)),
            other => Err(SceneCastError::protocol(format!(
                "unexpected {} while encoding",
                other.kind()
            ))),
        }
    }
}

impl Engine {
    /// Export `duration_ms` of timeline at `fps`, frame-exactly.
    ///
    /// Submits `ceil(duration_ms * fps / 1000) + 1` frames. Fails with
    /// `Cancelled` when `cancel` fires before the worker's terminal message.
    pub async fn export_offline(
        &mut self,
        duration_ms: f64,
        fps: u32,
        on_progress: Option<ProgressCallback>,
        cancel: &CancelToken,
    ) -> SceneCastResult<VideoBlob> {
        let worker =
            EncodeWorker::spawn(Arc::clone(&self.encoder_factory), DEFAULT_CHANNEL_CAPACITY)?;
        self.export_offline_with(worker, duration_ms, fps, on_progress, cancel)
            .await
    }

    /// [`Engine::export_offline`] over an already-started worker link.
    pub async fn export_offline_with<W: WorkerLink>(
        &mut self,
        mut link: W,
        duration_ms: f64,
        fps: u32,
        on_progress: Option<ProgressCallback>,
        cancel: &CancelToken,
    ) -> SceneCastResult<VideoBlob> {
        self.pause();
        let saved = self.begin_export();
        let mut reporter = ProgressReporter::new(on_progress);
        let result = self
            .run_offline(&mut link, duration_ms, fps, &mut reporter, cancel)
            .await;
        // No graceful drain on any path.
        link.terminate();
        self.end_export(saved);
        reporter.finish(&result);
        log_outcome("offline", &result);
        result
    }

    async fn run_offline<W: WorkerLink>(
        &mut self,
        link: &mut W,
        duration_ms: f64,
        fps: u32,
        reporter: &mut ProgressReporter,
        cancel: &CancelToken,
    ) -> SceneCastResult<VideoBlob> {
        validate_request(duration_ms, fps)?;
        let (width, height) = even_dimensions(self.scene.width, self.scene.height);
        if width == 0 || height == 0 {
            return Err(SceneCastError::encoder(format!(
                "canvas {}x{} is too small to encode",
                self.scene.width, self.scene.height
            )));
        }
        let total_frames = (duration_ms * fps as f64 / 1000.0).ceil() as u64;
        // At or above the channel bound the producer would block in `send`
        // instead of stalling here.
        let threshold = self
            .export_defaults
            .max_queue_depth
            .min(DEFAULT_CHANNEL_CAPACITY - 1);
        reporter.set_total_frames(total_frames + 1);
        reporter.report(0.0, 0, ExportStage::Preparing);

        tracing::info!(
            width,
            height,
            fps,
            duration_ms,
            frames = total_frames + 1,
            "Offline export started"
        );

        cancel.check()?;
        link.send(WorkerRequest::Config {
            width,
            height,
            fps,
            bitrate: self.export_defaults.bitrate_bps,
            protocol_version: PROTOCOL_VERSION,
        })
        .await?;
        loop {
            match next_message(link, cancel).await? {
                WorkerResponse::Ready => break,
                WorkerResponse::Error { class, message } => return Err(class.into_error(message)),
                other => {
                    return Err(SceneCastError::protocol(format!(
                        "expected READY, got {}",
                        other.kind()
                    )))
                }
            }
        }
        tracing::debug!("Encode worker ready");

        let mut backlog = Backlog::default();
        let mut stalled = false;
        for i in 0..=total_frames {
            cancel.check()?;

            while let Some(msg) = link.try_recv() {
                backlog.absorb(msg)?;
            }
            while backlog.depth() > threshold {
                if !stalled {
                    tracing::debug!(
                        depth = backlog.depth(),
                        threshold,
                        frame = i,
                        "Backpressure stall"
                    );
                    stalled = true;
                }
                let msg = next_message(link, cancel).await?;
                backlog.absorb(msg)?;
            }
            stalled = false;

            self.seek(frame_time_ms(i, fps));
            let frame = self.surface.snapshot(width, height)?;
            let request = WorkerRequest::EncodeFrame {
                frame,
                timestamp_us: frame_timestamp_us(i, fps) as i64,
                is_key_frame: i % fps as u64 == 0,
                duration_us: Some(frame_duration_us(fps) as i64),
            };
            send_or_cancel(link, request, cancel).await?;
            backlog.frames_sent += 1;

            let done = i + 1;
            reporter.report(
                i as f64 / total_frames.max(1) as f64,
                done,
                ExportStage::Rendering,
            );
            if done % YIELD_EVERY == 0 {
                tokio::task::yield_now().await;
            }
        }

        cancel.check()?;
        reporter.report(1.0, total_frames + 1, ExportStage::Finalizing);
        send_or_cancel(link, WorkerRequest::Finalize, cancel).await?;
        loop {
            match next_message(link, cancel).await? {
                WorkerResponse::Progress { .. } => continue,
                WorkerResponse::Complete { buffer } => {
                    if buffer.is_empty() {
                        return Err(SceneCastError::muxer_finalize(
                            "worker returned an empty buffer",
                        ));
                    }
                    reporter.report(1.0, total_frames + 1, ExportStage::Complete);
                    return Ok(VideoBlob {
                        bytes: buffer,
                        mime_type: OFFLINE_MIME_TYPE,
                    });
                }
                WorkerResponse::Error { class, message } => return Err(class.into_error(message)),
                WorkerResponse::Ready => {
                    return Err(SceneCastError::protocol("unexpected READY after FINALIZE"))
                }
            }
        }
    }
}

/// Send `request`, giving up with `Cancelled` if `cancel` fires while the
/// worker's channel is full.
async fn send_or_cancel<W: WorkerLink>(
    link: &mut W,
    request: WorkerRequest,
    cancel: &CancelToken,
) -> SceneCastResult<()> {
    tokio::select! {
        sent = link.send(request) => sent,
        _ = cancelled(cancel) => Err(SceneCastError::Cancelled),
    }
}

/// Resolves once `cancel` fires.
async fn cancelled(cancel: &CancelToken) {
    while !cancel.is_cancelled() {
        tokio::time::sleep(WORKER_POLL).await;
    }
}

/// Wait for the next worker message, checking `cancel` between polls.
async fn next_message<W: WorkerLink>(
    link: &mut W,
    cancel: &CancelToken,
) -> SceneCastResult<WorkerResponse> {
    loop {
        cancel.check()?;
        match tokio::time::timeout(WORKER_POLL, link.recv()).await {
            Ok(Some(msg)) => return Ok(msg),
            Ok(None) => {
                return Err(SceneCastError::protocol(
                    "encode worker exited without a terminal message",
                ))
            }
            Err(_) => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlog_counts_unreceived_frames() {
        let mut backlog = Backlog {
            frames_sent: 12,
            ..Backlog::default()
        };
        assert_eq!(backlog.depth(), 12);
        backlog
            .absorb(WorkerResponse::Progress {
                queue_depth: 1,
                frames_received: 10,
            })
            .unwrap();
        assert_eq!(backlog.depth(), 3);
    }

    #[test]
    fn test_backlog_surfaces_worker_errors() {
        let mut backlog = Backlog::default();
        let err = backlog
            .absorb(WorkerResponse::error(
                scenecast_encoder::FailureClass::Encoder,
                "boom",
            ))
            .unwrap_err();
        assert!(err.is_encoder_class());
        assert!(backlog.absorb(WorkerResponse::Ready).is_err());
    }
}
