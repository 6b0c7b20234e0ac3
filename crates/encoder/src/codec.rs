//! Video encoders.

use std::collections::VecDeque;
use std::io::Cursor;

use scenecast_common::{SceneCastError, SceneCastResult};
use scenecast_render_engine::Frame;

/// Encoder setup, fixed for the life of one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_bps: u32,
}

impl EncoderConfig {
    /// Reject configurations no encoder can honor.
    pub fn validate(&self) -> SceneCastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneCastError::encoder(format!(
                "invalid encoder size {}x{}",
                self.width, self.height
            )));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(SceneCastError::encoder(format!(
                "encoder size must be even, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(SceneCastError::encoder("fps must be positive"));
        }
        Ok(())
    }
}

/// One encoded access unit, timestamped in microseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    pub data: Vec<u8>,
    pub timestamp_us: i64,
    pub duration_us: Option<i64>,
    pub is_key: bool,
}

/// A frame-in, chunks-out video encoder.
///
/// `encode` may buffer internally; finished chunks are collected with
/// `take_chunks`. `flush` forces every submitted frame out.
pub trait VideoEncoder: Send {
    /// Matroska codec id of the produced bitstream.
    fn codec_id(&self) -> &'static str;

    fn encode(
        &mut self,
        frame: Frame,
        timestamp_us: i64,
        key_frame: bool,
        duration_us: Option<i64>,
    ) -> SceneCastResult<()>;

    /// Chunks finished since the last call.
    fn take_chunks(&mut self) -> Vec<EncodedChunk>;

    /// Frames accepted but not yet emitted as chunks.
    fn queue_size(&self) -> usize;

    /// Encode everything still pending and return it.
    fn flush(&mut self) -> SceneCastResult<Vec<EncodedChunk>>;
}

/// Builds encoders inside the worker once `CONFIG` arrives.
pub trait EncoderFactory: Send + Sync {
    fn create(&self, config: &EncoderConfig) -> SceneCastResult<Box<dyn VideoEncoder>>;
}

impl<F> EncoderFactory for F
where
    F: Fn(&EncoderConfig) -> SceneCastResult<Box<dyn VideoEncoder>> + Send + Sync,
{
    fn create(&self, config: &EncoderConfig) -> SceneCastResult<Box<dyn VideoEncoder>> {
        self(config)
    }
}

/// Lowest JPEG quality rate control will step down to.
pub const MIN_JPEG_QUALITY: u8 = 10;

/// Quality change per rate-control step.
const QUALITY_STEP: u8 = 10;

/// Motion-JPEG: every frame is an independent JPEG, so every chunk is a
/// keyframe.
///
/// Rate control keeps each frame within `bitrate_bps / fps / 8` bytes by
/// re-encoding at lower quality, never going above the configured quality
/// or below [`MIN_JPEG_QUALITY`]. A zero bitrate disables it.
#[derive(Debug)]
pub struct MjpegEncoder {
    config: EncoderConfig,
    max_quality: u8,
    quality: u8,
    ready: VecDeque<EncodedChunk>,
}

impl MjpegEncoder {
    pub fn new(config: EncoderConfig, quality: u8) -> SceneCastResult<Self> {
        config.validate()?;
        let quality = quality.clamp(1, 100);
        Ok(Self {
            config,
            max_quality: quality,
            quality,
            ready: VecDeque::new(),
        })
    }

    /// Byte budget of one frame, if rate control is on.
    pub fn frame_budget(&self) -> Option<usize> {
        if self.config.bitrate_bps == 0 {
            return None;
        }
        Some((self.config.bitrate_bps as u64 / self.config.fps as u64 / 8).max(1) as usize)
    }

    /// Quality the next frame starts at.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    fn encode_jpeg(rgb: &[u8], width: u32, height: u32, quality: u8) -> SceneCastResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        encoder
            .encode(rgb, width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| SceneCastError::encoder(format!("JPEG encoding failed: {e}")))?;
        Ok(buffer.into_inner())
    }

    /// Encode one frame within the byte budget, adapting `quality` for the
    /// frames that follow.
    fn encode_within_budget(&mut self, frame: &Frame) -> SceneCastResult<Vec<u8>> {
        let rgb = frame.to_rgb();
        let mut data = Self::encode_jpeg(&rgb, frame.width, frame.height, self.quality)?;
        let Some(budget) = self.frame_budget() else {
            return Ok(data);
        };

        while data.len() > budget && self.quality > MIN_JPEG_QUALITY {
            self.quality = self.quality.saturating_sub(QUALITY_STEP).max(MIN_JPEG_QUALITY);
            data = Self::encode_jpeg(&rgb, frame.width, frame.height, self.quality)?;
        }
        if data.len() > budget {
            tracing::trace!(
                size = data.len(),
                budget,
                "Frame exceeds budget at minimum quality"
            );
        } else if data.len() < budget / 2 && self.quality < self.max_quality {
            // Plenty of headroom: try one step higher next time.
            self.quality = (self.quality + QUALITY_STEP).min(self.max_quality);
        }
        Ok(data)
    }
}

impl VideoEncoder for MjpegEncoder {
    fn codec_id(&self) -> &'static str {
        "V_MJPEG"
    }

    fn encode(
        &mut self,
        frame: Frame,
        timestamp_us: i64,
        _key_frame: bool,
        duration_us: Option<i64>,
    ) -> SceneCastResult<()> {
        if frame.width != self.config.width || frame.height != self.config.height {
            return Err(SceneCastError::encoder(format!(
                "frame {}x{} does not match configured {}x{}",
                frame.width, frame.height, self.config.width, self.config.height
            )));
        }
        let data = self.encode_within_budget(&frame)?;
        self.ready.push_back(EncodedChunk {
            data,
            timestamp_us,
            duration_us,
            is_key: true,
        });
        Ok(())
    }

    fn take_chunks(&mut self) -> Vec<EncodedChunk> {
        self.ready.drain(..).collect()
    }

    fn queue_size(&self) -> usize {
        self.ready.len()
    }

    fn flush(&mut self) -> SceneCastResult<Vec<EncodedChunk>> {
        Ok(self.take_chunks())
    }
}

/// Factory for [`MjpegEncoder`] with `quality` as the ceiling.
#[derive(Debug, Clone, Copy)]
pub struct MjpegEncoderFactory {
    pub quality: u8,
}

impl Default for MjpegEncoderFactory {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

impl EncoderFactory for MjpegEncoderFactory {
    fn create(&self, config: &EncoderConfig) -> SceneCastResult<Box<dyn VideoEncoder>> {
        Ok(Box::new(MjpegEncoder::new(*config, self.quality)?))
    }
}
