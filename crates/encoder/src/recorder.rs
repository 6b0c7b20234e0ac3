//! Streaming recorders for realtime export.
//!
//! A recorder receives frames as they are painted and produces a finished
//! video file when stopped. Unlike the offline worker there is no
//! backpressure: frames that cannot be taken are dropped and counted.

use std::io::{BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use scenecast_common::{SceneCastError, SceneCastResult};
use scenecast_render_engine::Frame;

use crate::codec::{EncodedChunk, EncoderConfig, MjpegEncoder, VideoEncoder};
use crate::muxer::MatroskaMuxer;

/// Stream parameters fixed at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_bps: u32,
    pub jpeg_quality: u8,
}

/// Runtime statistics from a recorder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderStats {
    /// Frames accepted into the stream.
    pub frames_captured: u64,

    /// Frames refused (late timestamp, wrong size, recorder busy).
    pub frames_dropped: u64,

    /// Bytes of raw frame data handed to the encoder.
    pub bytes_written: u64,
}

impl RecorderStats {
    /// Drop rate as a percentage.
    pub fn drop_rate(&self) -> f64 {
        let total = self.frames_captured + self.frames_dropped;
        if total == 0 {
            return 0.0;
        }
        self.frames_dropped as f64 / total as f64 * 100.0
    }
}

/// A realtime video recorder.
pub trait StreamRecorder: Send {
    fn name(&self) -> &str;

    /// MIME type of the bytes returned by `stop`.
    fn mime_type(&self) -> &'static str;

    /// Whether the recorder can run on this machine.
    fn is_available(&self) -> bool;

    fn start(&mut self, config: &StreamConfig) -> SceneCastResult<()>;

    /// Offer one frame captured `timestamp_ms` after the stream started.
    fn push_frame(&mut self, frame: &Frame, timestamp_ms: u64) -> SceneCastResult<()>;

    /// Finish the stream and return the encoded file.
    fn stop(&mut self) -> SceneCastResult<Vec<u8>>;

    /// Tear the stream down without producing output.
    fn abort(&mut self);

    fn is_running(&self) -> bool;

    fn stats(&self) -> RecorderStats;
}

/// Pick the best recorder available: ffmpeg VP9/WebM when `ffmpeg` is on
/// `PATH`, the in-process MJPEG/Matroska recorder otherwise.
pub fn default_recorder() -> Box<dyn StreamRecorder> {
    let ffmpeg = FfmpegStreamRecorder::new();
    if ffmpeg.is_available() {
        tracing::info!(recorder = ffmpeg.name(), "Using ffmpeg stream recorder");
        Box::new(ffmpeg)
    } else {
        tracing::info!("ffmpeg not found, using in-process Matroska recorder");
        Box::new(MatroskaStreamRecorder::new())
    }
}

/// Check whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

struct FfmpegProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout_task: JoinHandle<std::io::Result<Vec<u8>>>,
    stderr_task: JoinHandle<String>,
}

/// Pipes raw RGBA frames into an `ffmpeg` child that writes VP9 WebM to
/// its stdout.
pub struct FfmpegStreamRecorder {
    binary: String,
    config: Option<StreamConfig>,
    process: Option<FfmpegProcess>,
    stats: RecorderStats,
}

impl FfmpegStreamRecorder {
    pub fn new() -> Self {
        Self::with_binary("ffmpeg")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            config: None,
            process: None,
            stats: RecorderStats::default(),
        }
    }

    /// Arguments for a raw RGBA stdin to WebM stdout transcode.
    pub fn ffmpeg_args(config: &StreamConfig) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgba".to_string(),
            "-s".to_string(),
            format!("{}x{}", config.width, config.height),
            "-r".to_string(),
            config.fps.to_string(),
            "-i".to_string(),
            "-".to_string(),
            "-c:v".to_string(),
            "libvpx-vp9".to_string(),
            "-b:v".to_string(),
            config.bitrate_bps.to_string(),
            "-deadline".to_string(),
            "realtime".to_string(),
            "-cpu-used".to_string(),
            "8".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-f".to_string(),
            "webm".to_string(),
            "-".to_string(),
        ]
    }
}

impl Default for FfmpegStreamRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamRecorder for FfmpegStreamRecorder {
    fn name(&self) -> &str {
        "ffmpeg-vp9"
    }

    fn mime_type(&self) -> &'static str {
        "video/webm"
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn start(&mut self, config: &StreamConfig) -> SceneCastResult<()> {
        if self.process.is_some() {
            return Err(SceneCastError::encoder("recorder already started"));
        }
        let args = Self::ffmpeg_args(config);
        tracing::debug!(args = ?args, "Starting ffmpeg recorder");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SceneCastError::encoder(format!("Failed to start ffmpeg: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SceneCastError::encoder("Failed to capture ffmpeg stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SceneCastError::encoder("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SceneCastError::encoder("Failed to capture ffmpeg stderr"))?;

        let stdout_task = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
            let mut reader = BufReader::new(stdout);
            let mut output = Vec::new();
            reader.read_to_end(&mut output)?;
            Ok(output)
        });
        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        tracing::info!(
            pid = child.id(),
            width = config.width,
            height = config.height,
            fps = config.fps,
            "ffmpeg recorder started"
        );
        self.config = Some(*config);
        self.stats = RecorderStats::default();
        self.process = Some(FfmpegProcess {
            child,
            stdin: Some(stdin),
            stdout_task,
            stderr_task,
        });
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame, _timestamp_ms: u64) -> SceneCastResult<()> {
        let (Some(config), Some(process)) = (self.config, self.process.as_mut()) else {
            return Err(SceneCastError::encoder("recorder is not running"));
        };
        if frame.width != config.width || frame.height != config.height {
            self.stats.frames_dropped += 1;
            return Ok(());
        }
        let Some(stdin) = process.stdin.as_mut() else {
            return Err(SceneCastError::encoder("ffmpeg stdin already closed"));
        };
        stdin
            .write_all(&frame.data)
            .map_err(|e| SceneCastError::encoder(format!("Failed writing to ffmpeg: {e}")))?;
        self.stats.frames_captured += 1;
        self.stats.bytes_written += frame.data.len() as u64;
        Ok(())
    }

    fn stop(&mut self) -> SceneCastResult<Vec<u8>> {
        let Some(mut process) = self.process.take() else {
            return Err(SceneCastError::encoder("recorder is not running"));
        };
        // Closing stdin is ffmpeg's end-of-stream.
        drop(process.stdin.take());

        let status = process
            .child
            .wait()
            .map_err(|e| SceneCastError::encoder(format!("Failed to wait on ffmpeg: {e}")))?;
        let output = process
            .stdout_task
            .join()
            .map_err(|_| SceneCastError::encoder("failed to join ffmpeg stdout reader"))?
            .map_err(|e| SceneCastError::encoder(format!("Failed reading ffmpeg output: {e}")))?;
        let stderr_output = process
            .stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(SceneCastError::encoder(format!(
                "ffmpeg recorder failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }
        tracing::info!(
            bytes = output.len(),
            frames = self.stats.frames_captured,
            dropped = self.stats.frames_dropped,
            "ffmpeg recorder stopped"
        );
        Ok(output)
    }

    fn abort(&mut self) {
        if let Some(mut process) = self.process.take() {
            drop(process.stdin.take());
            if let Err(err) = process.child.kill() {
                tracing::debug!(error = %err, "ffmpeg already exited");
            }
            let _ = process.child.wait();
        }
    }

    fn is_running(&self) -> bool {
        self.process.is_some()
    }

    fn stats(&self) -> RecorderStats {
        self.stats.clone()
    }
}

impl Drop for FfmpegStreamRecorder {
    fn drop(&mut self) {
        self.abort();
    }
}

/// In-process recorder: MJPEG frames into a Matroska container, stamped
/// with their capture time.
pub struct MatroskaStreamRecorder {
    session: Option<(MjpegEncoder, MatroskaMuxer)>,
    last_timestamp_ms: Option<u64>,
    stats: RecorderStats,
}

impl MatroskaStreamRecorder {
    pub fn new() -> Self {
        Self {
            session: None,
            last_timestamp_ms: None,
            stats: RecorderStats::default(),
        }
    }

    fn mux(muxer: &mut MatroskaMuxer, chunks: Vec<EncodedChunk>) -> SceneCastResult<()> {
        for chunk in &chunks {
            muxer.add_chunk(chunk)?;
        }
        Ok(())
    }
}

impl Default for MatroskaStreamRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamRecorder for MatroskaStreamRecorder {
    fn name(&self) -> &str {
        "matroska-mjpeg"
    }

    fn mime_type(&self) -> &'static str {
        "video/x-matroska"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self, config: &StreamConfig) -> SceneCastResult<()> {
        if self.session.is_some() {
            return Err(SceneCastError::encoder("recorder already started"));
        }
        let encoder_config = EncoderConfig {
            width: config.width,
            height: config.height,
            fps: config.fps,
            bitrate_bps: config.bitrate_bps,
        };
        let encoder = MjpegEncoder::new(encoder_config, config.jpeg_quality)?;
        let muxer = MatroskaMuxer::new(encoder.codec_id(), config.width, config.height, config.fps);
        self.session = Some((encoder, muxer));
        self.last_timestamp_ms = None;
        self.stats = RecorderStats::default();
        tracing::debug!(
            width = config.width,
            height = config.height,
            "Matroska recorder started"
        );
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame, timestamp_ms: u64) -> SceneCastResult<()> {
        let Some((encoder, muxer)) = self.session.as_mut() else {
            return Err(SceneCastError::encoder("recorder is not running"));
        };
        // Two paints inside the same millisecond collapse to the first.
        if self.last_timestamp_ms.is_some_and(|last| timestamp_ms <= last) {
            self.stats.frames_dropped += 1;
            return Ok(());
        }
        if let Err(err) = encoder.encode(frame.clone(), timestamp_ms as i64 * 1000, true, None) {
            tracing::debug!(error = %err, "Dropping frame the encoder refused");
            self.stats.frames_dropped += 1;
            return Ok(());
        }
        let chunks = encoder.take_chunks();
        Self::mux(muxer, chunks)?;
        self.last_timestamp_ms = Some(timestamp_ms);
        self.stats.frames_captured += 1;
        self.stats.bytes_written += frame.data.len() as u64;
        Ok(())
    }

    fn stop(&mut self) -> SceneCastResult<Vec<u8>> {
        let Some((mut encoder, mut muxer)) = self.session.take() else {
            return Err(SceneCastError::encoder("recorder is not running"));
        };
        let remaining = encoder.flush()?;
        Self::mux(&mut muxer, remaining)?;
        if muxer.block_count() == 0 {
            // No frames means no video, not a header-only file.
            return Ok(Vec::new());
        }
        muxer.finalize()?;
        muxer
            .take_buffer()
            .ok_or_else(|| SceneCastError::muxer_finalize("muxer produced no buffer"))
    }

    fn abort(&mut self) {
        self.session = None;
    }

    fn is_running(&self) -> bool {
        self.session.is_some()
    }

    fn stats(&self) -> RecorderStats {
        self.stats.clone()
    }
}
