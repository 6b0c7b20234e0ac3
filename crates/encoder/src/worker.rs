//! The isolated encoding worker.
//!
//! A dedicated OS thread owns the encoder and the muxer. The exporter talks
//! to it only through [`WorkerRequest`] / [`WorkerResponse`] messages; frames
//! are moved into the request, so the producer cannot touch them again.
//!
//! ```text
//!   exporter ── bounded mpsc<WorkerRequest> ──►  encode-worker thread
//!            ◄── mpsc<WorkerResponse> ────────   (encoder + muxer)
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;

use scenecast_common::{SceneCastError, SceneCastResult};

use crate::codec::{EncodedChunk, EncoderConfig, EncoderFactory, VideoEncoder};
use crate::muxer::MatroskaMuxer;
use crate::protocol::{FailureClass, WorkerRequest, WorkerResponse, PROTOCOL_VERSION};

/// Request channel capacity used when the caller has no preference.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// The exporter's side of a worker connection.
///
/// Implemented by [`EncodeWorker`]; tests substitute simulated workers.
pub trait WorkerLink: Send {
    /// Deliver a request, waiting while the channel is full.
    fn send(&mut self, request: WorkerRequest) -> impl Future<Output = SceneCastResult<()>> + Send;

    /// Next response, or `None` once the worker is gone.
    fn recv(&mut self) -> impl Future<Output = Option<WorkerResponse>> + Send;

    /// A response if one is already waiting.
    fn try_recv(&mut self) -> Option<WorkerResponse>;

    /// Stop the worker immediately. No messages are delivered afterwards.
    fn terminate(&mut self);
}

/// Handle to a running encode-worker thread.
pub struct EncodeWorker {
    requests: Option<mpsc::Sender<WorkerRequest>>,
    responses: mpsc::UnboundedReceiver<WorkerResponse>,
    abort: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    sent: usize,
    terminated: bool,
}

impl EncodeWorker {
    /// Start a worker thread that builds its encoder with `factory` once
    /// `CONFIG` arrives.
    pub fn spawn(factory: Arc<dyn EncoderFactory>, capacity: usize) -> SceneCastResult<Self> {
        let (request_tx, request_rx) = mpsc::channel(capacity.max(1));
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let abort = Arc::new(AtomicBool::new(false));

        let thread_abort = Arc::clone(&abort);
        let handle = std::thread::Builder::new()
            .name("encode-worker".to_string())
            .spawn(move || {
                WorkerState::new(factory, response_tx, thread_abort).run(request_rx);
            })?;

        tracing::debug!(capacity, "Encode worker started");
        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            abort,
            handle: Some(handle),
            sent: 0,
            terminated: false,
        })
    }

    /// Requests successfully handed to the worker.
    pub fn messages_sent(&self) -> usize {
        self.sent
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl WorkerLink for EncodeWorker {
    async fn send(&mut self, request: WorkerRequest) -> SceneCastResult<()> {
        let Some(tx) = self.requests.as_ref().filter(|_| !self.terminated) else {
            return Err(SceneCastError::protocol(format!(
                "{} sent to a terminated worker",
                request.kind()
            )));
        };
        let kind = request.kind();
        tx.send(request)
            .await
            .map_err(|_| SceneCastError::protocol(format!("worker exited before {kind}")))?;
        self.sent += 1;
        Ok(())
    }

    async fn recv(&mut self) -> Option<WorkerResponse> {
        if self.terminated {
            return None;
        }
        self.responses.recv().await
    }

    fn try_recv(&mut self) -> Option<WorkerResponse> {
        if self.terminated {
            return None;
        }
        self.responses.try_recv().ok()
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.abort.store(true, Ordering::SeqCst);
        self.requests = None;
        self.responses.close();
        // The thread exits at its next message boundary; nothing waits on it.
        self.handle.take();
        tracing::debug!(sent = self.sent, "Encode worker terminated");
    }
}

impl Drop for EncodeWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Everything the worker thread owns.
struct WorkerState {
    factory: Arc<dyn EncoderFactory>,
    responses: mpsc::UnboundedSender<WorkerResponse>,
    abort: Arc<AtomicBool>,
    session: Option<Session>,
    frames_received: usize,
}

struct Session {
    encoder: Box<dyn VideoEncoder>,
    muxer: MatroskaMuxer,
}

enum Step {
    Continue,
    Done,
}

impl WorkerState {
    fn new(
        factory: Arc<dyn EncoderFactory>,
        responses: mpsc::UnboundedSender<WorkerResponse>,
        abort: Arc<AtomicBool>,
    ) -> Self {
        Self {
            factory,
            responses,
            abort,
            session: None,
            frames_received: 0,
        }
    }

    fn run(mut self, mut requests: mpsc::Receiver<WorkerRequest>) {
        while let Some(request) = requests.blocking_recv() {
            if self.aborted() {
                break;
            }
            let kind = request.kind();
            match self.handle(request) {
                Ok(Step::Continue) => {}
                Ok(Step::Done) => break,
                Err(err) => {
                    tracing::debug!(message = kind, error = %err, "Encode worker failed");
                    self.reply(WorkerResponse::error(FailureClass::of(&err), err.to_string()));
                    break;
                }
            }
        }
        tracing::debug!(frames = self.frames_received, "Encode worker exiting");
    }

    fn aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    fn reply(&self, response: WorkerResponse) {
        if self.aborted() {
            return;
        }
        // A closed channel means the exporter is gone.
        let _ = self.responses.send(response);
    }

    fn handle(&mut self, request: WorkerRequest) -> SceneCastResult<Step> {
        match request {
            WorkerRequest::Config {
                width,
                height,
                fps,
                bitrate,
                protocol_version,
            } => {
                if self.session.is_some() {
                    return Err(SceneCastError::protocol("duplicate CONFIG"));
                }
                if protocol_version > PROTOCOL_VERSION {
                    return Err(SceneCastError::protocol(format!(
                        "protocol version {protocol_version} is newer than {PROTOCOL_VERSION}"
                    )));
                }
                let config = EncoderConfig {
                    width,
                    height,
                    fps,
                    bitrate_bps: bitrate,
                };
                config.validate()?;
                let encoder = self.factory.create(&config)?;
                let muxer = MatroskaMuxer::new(encoder.codec_id(), width, height, fps);
                tracing::debug!(
                    width,
                    height,
                    fps,
                    bitrate,
                    codec = encoder.codec_id(),
                    "Encoder configured"
                );
                self.session = Some(Session { encoder, muxer });
                self.reply(WorkerResponse::Ready);
                Ok(Step::Continue)
            }
            WorkerRequest::EncodeFrame {
                frame,
                timestamp_us,
                is_key_frame,
                duration_us,
            } => {
                let Some(session) = self.session.as_mut() else {
                    return Err(SceneCastError::protocol("ENCODE_FRAME before CONFIG"));
                };
                self.frames_received += 1;
                session
                    .encoder
                    .encode(frame, timestamp_us, is_key_frame, duration_us)?;
                self.report_progress();
                let chunks = self.session_mut()?.encoder.take_chunks();
                self.mux(chunks)?;
                Ok(Step::Continue)
            }
            WorkerRequest::Finalize => {
                let session = self.session_mut()?;
                let remaining = session.encoder.flush()?;
                self.mux(remaining)?;

                let session = self.session_mut()?;
                session.muxer.finalize()?;
                let buffer = session
                    .muxer
                    .take_buffer()
                    .ok_or_else(|| SceneCastError::muxer_finalize("muxer produced no buffer"))?;
                if buffer.is_empty() {
                    return Err(SceneCastError::muxer_finalize("muxer produced an empty buffer"));
                }
                tracing::debug!(
                    bytes = buffer.len(),
                    frames = self.frames_received,
                    "Encode worker finalized"
                );
                self.reply(WorkerResponse::Complete { buffer });
                Ok(Step::Done)
            }
        }
    }

    fn session_mut(&mut self) -> SceneCastResult<&mut Session> {
        self.session
            .as_mut()
            .ok_or_else(|| SceneCastError::protocol("worker is not configured"))
    }

    fn mux(&mut self, chunks: Vec<EncodedChunk>) -> SceneCastResult<()> {
        for chunk in chunks {
            self.session_mut()?.muxer.add_chunk(&chunk)?;
            self.report_progress();
        }
        Ok(())
    }

    fn report_progress(&self) {
        let queue_depth = self
            .session
            .as_ref()
            .map(|s| s.encoder.queue_size())
            .unwrap_or(0);
        self.reply(WorkerResponse::Progress {
            queue_depth,
            frames_received: self.frames_received,
        });
    }
}
