//! In-memory Matroska muxer.
//!
//! The whole container is assembled in memory and emitted once at
//! `finalize`, so every element carries an exact size and no seeking back
//! into the output is needed. Timestamps are milliseconds
//! (`TimestampScale` = 1,000,000 ns).
//!
//! Layout:
//!
//! ```text
//! EBML header
//! Segment
//!   ├── Info (TimestampScale, MuxingApp, WritingApp, Duration)
//!   ├── Tracks
//!   │     └── TrackEntry (1, video, CodecID, DefaultDuration, Video{w, h})
//!   └── Cluster*
//!         ├── Timestamp (absolute ms)
//!         └── SimpleBlock* (track 1, i16 relative ms, flags)
//! ```

use scenecast_common::{frame_duration_us, us_to_ms, SceneCastError, SceneCastResult};

use crate::codec::EncodedChunk;

mod ids {
    pub const EBML: u32 = 0x1A45_DFA3;
    pub const EBML_VERSION: u32 = 0x4286;
    pub const EBML_READ_VERSION: u32 = 0x42F7;
    pub const EBML_MAX_ID_LENGTH: u32 = 0x42F2;
    pub const EBML_MAX_SIZE_LENGTH: u32 = 0x42F3;
    pub const DOC_TYPE: u32 = 0x4282;
    pub const DOC_TYPE_VERSION: u32 = 0x4287;
    pub const DOC_TYPE_READ_VERSION: u32 = 0x4285;

    pub const SEGMENT: u32 = 0x1853_8067;
    pub const INFO: u32 = 0x1549_A966;
    pub const TIMESTAMP_SCALE: u32 = 0x2A_D7B1;
    pub const MUXING_APP: u32 = 0x4D80;
    pub const WRITING_APP: u32 = 0x5741;
    pub const DURATION: u32 = 0x4489;

    pub const TRACKS: u32 = 0x1654_AE6B;
    pub const TRACK_ENTRY: u32 = 0xAE;
    pub const TRACK_NUMBER: u32 = 0xD7;
    pub const TRACK_UID: u32 = 0x73C5;
    pub const TRACK_TYPE: u32 = 0x83;
    pub const CODEC_ID: u32 = 0x86;
    pub const DEFAULT_DURATION: u32 = 0x23_E383;
    pub const FLAG_LACING: u32 = 0x9C;
    pub const VIDEO: u32 = 0xE0;
    pub const PIXEL_WIDTH: u32 = 0xB0;
    pub const PIXEL_HEIGHT: u32 = 0xBA;

    pub const CLUSTER: u32 = 0x1F43_B675;
    pub const TIMESTAMP: u32 = 0xE7;
    pub const SIMPLE_BLOCK: u32 = 0xA3;
}

const TIMESTAMP_SCALE_NS: u64 = 1_000_000;
const TRACK_NUMBER: u64 = 1;
const TRACK_TYPE_VIDEO: u64 = 1;
const KEYFRAME_FLAG: u8 = 0x80;
/// Keyframes open a new cluster once the current one spans this long.
const CLUSTER_TARGET_MS: u64 = 1_000;
const APP_NAME: &str = concat!("scenecast ", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
struct Cluster {
    timestamp_ms: u64,
    body: Vec<u8>,
}

/// Collects encoded chunks and writes a single-track Matroska file.
#[derive(Debug)]
pub struct MatroskaMuxer {
    codec_id: String,
    width: u32,
    height: u32,
    fps: u32,
    clusters: Vec<Cluster>,
    last_timestamp_ms: Option<u64>,
    end_ms: u64,
    blocks: usize,
    output: Option<Vec<u8>>,
}

impl MatroskaMuxer {
    pub fn new(codec_id: impl Into<String>, width: u32, height: u32, fps: u32) -> Self {
        Self {
            codec_id: codec_id.into(),
            width,
            height,
            fps: fps.max(1),
            clusters: Vec::new(),
            last_timestamp_ms: None,
            end_ms: 0,
            blocks: 0,
            output: None,
        }
    }

    /// Blocks written so far.
    pub fn block_count(&self) -> usize {
        self.blocks
    }

    pub fn is_finalized(&self) -> bool {
        self.output.is_some()
    }

    /// Append one chunk. Container timestamps must strictly increase.
    pub fn add_chunk(&mut self, chunk: &EncodedChunk) -> SceneCastResult<()> {
        if self.output.is_some() {
            return Err(SceneCastError::muxer_finalize(
                "chunk added after finalize",
            ));
        }
        let timestamp_ms = us_to_ms(chunk.timestamp_us);
        if let Some(last) = self.last_timestamp_ms {
            if timestamp_ms <= last {
                return Err(SceneCastError::muxer_finalize(format!(
                    "timestamp {timestamp_ms} ms does not follow {last} ms"
                )));
            }
        }

        let start_new = match self.clusters.last() {
            None => true,
            Some(cluster) => {
                let relative = timestamp_ms - cluster.timestamp_ms;
                relative > i16::MAX as u64 || (chunk.is_key && relative >= CLUSTER_TARGET_MS)
            }
        };
        if start_new {
            let mut body = Vec::new();
            uint_element(&mut body, ids::TIMESTAMP, timestamp_ms);
            self.clusters.push(Cluster { timestamp_ms, body });
        }
        let Some(cluster) = self.clusters.last_mut() else {
            return Err(SceneCastError::muxer_finalize("no open cluster"));
        };

        let relative = (timestamp_ms - cluster.timestamp_ms) as i16;
        let mut block = Vec::with_capacity(chunk.data.len() + 4);
        write_size(&mut block, TRACK_NUMBER);
        block.extend_from_slice(&relative.to_be_bytes());
        block.push(if chunk.is_key { KEYFRAME_FLAG } else { 0 });
        block.extend_from_slice(&chunk.data);
        element(&mut cluster.body, ids::SIMPLE_BLOCK, &block);

        let duration_us = chunk
            .duration_us
            .unwrap_or(frame_duration_us(self.fps) as i64);
        self.end_ms = timestamp_ms + us_to_ms(duration_us);
        self.last_timestamp_ms = Some(timestamp_ms);
        self.blocks += 1;
        Ok(())
    }

    /// Write the container. Later calls fail.
    pub fn finalize(&mut self) -> SceneCastResult<()> {
        if self.output.is_some() {
            return Err(SceneCastError::muxer_finalize("muxer already finalized"));
        }

        let mut segment = Vec::new();

        let mut info = Vec::new();
        uint_element(&mut info, ids::TIMESTAMP_SCALE, TIMESTAMP_SCALE_NS);
        string_element(&mut info, ids::MUXING_APP, APP_NAME);
        string_element(&mut info, ids::WRITING_APP, APP_NAME);
        float_element(&mut info, ids::DURATION, self.end_ms as f64);
        element(&mut segment, ids::INFO, &info);

        let mut video = Vec::new();
        uint_element(&mut video, ids::PIXEL_WIDTH, self.width as u64);
        uint_element(&mut video, ids::PIXEL_HEIGHT, self.height as u64);

        let mut entry = Vec::new();
        uint_element(&mut entry, ids::TRACK_NUMBER, TRACK_NUMBER);
        uint_element(&mut entry, ids::TRACK_UID, TRACK_NUMBER);
        uint_element(&mut entry, ids::TRACK_TYPE, TRACK_TYPE_VIDEO);
        string_element(&mut entry, ids::CODEC_ID, &self.codec_id);
        uint_element(
            &mut entry,
            ids::DEFAULT_DURATION,
            frame_duration_us(self.fps) * 1000,
        );
        uint_element(&mut entry, ids::FLAG_LACING, 0);
        element(&mut entry, ids::VIDEO, &video);

        let mut tracks = Vec::new();
        element(&mut tracks, ids::TRACK_ENTRY, &entry);
        element(&mut segment, ids::TRACKS, &tracks);

        for cluster in self.clusters.drain(..) {
            element(&mut segment, ids::CLUSTER, &cluster.body);
        }

        let mut out = ebml_header();
        element(&mut out, ids::SEGMENT, &segment);
        tracing::debug!(
            bytes = out.len(),
            blocks = self.blocks,
            duration_ms = self.end_ms,
            "Matroska container finalized"
        );
        self.output = Some(out);
        Ok(())
    }

    /// The finished container, or `None` before `finalize`.
    pub fn buffer(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    pub fn take_buffer(&mut self) -> Option<Vec<u8>> {
        self.output.take()
    }
}

fn ebml_header() -> Vec<u8> {
    let mut header = Vec::new();
    uint_element(&mut header, ids::EBML_VERSION, 1);
    uint_element(&mut header, ids::EBML_READ_VERSION, 1);
    uint_element(&mut header, ids::EBML_MAX_ID_LENGTH, 4);
    uint_element(&mut header, ids::EBML_MAX_SIZE_LENGTH, 8);
    string_element(&mut header, ids::DOC_TYPE, "matroska");
    uint_element(&mut header, ids::DOC_TYPE_VERSION, 4);
    uint_element(&mut header, ids::DOC_TYPE_READ_VERSION, 2);

    let mut out = Vec::new();
    element(&mut out, ids::EBML, &header);
    out
}

fn write_id(out: &mut Vec<u8>, id: u32) {
    let bytes = id.to_be_bytes();
    let skip = (id.leading_zeros() / 8).min(3) as usize;
    out.extend_from_slice(&bytes[skip..]);
}

/// EBML variable-length size, shortest form.
fn write_size(out: &mut Vec<u8>, size: u64) {
    let width = (1..=8u32)
        .find(|w| size < (1u64 << (7 * w)) - 1)
        .unwrap_or(8);
    let marked = size | (1u64 << (7 * width));
    let bytes = marked.to_be_bytes();
    out.extend_from_slice(&bytes[8 - width as usize..]);
}

fn element(out: &mut Vec<u8>, id: u32, body: &[u8]) {
    write_id(out, id);
    write_size(out, body.len() as u64);
    out.extend_from_slice(body);
}

fn uint_element(out: &mut Vec<u8>, id: u32, value: u64) {
    let bytes = value.to_be_bytes();
    let skip = ((value.leading_zeros() / 8) as usize).min(7);
    element(out, id, &bytes[skip..]);
}

fn float_element(out: &mut Vec<u8>, id: u32, value: f64) {
    element(out, id, &value.to_be_bytes());
}

fn string_element(out: &mut Vec<u8>, id: u32, value: &str) {
    element(out, id, value.as_bytes());
}

/// One `SimpleBlock` as read back from a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub timestamp_ms: u64,
    pub keyframe: bool,
    pub size: usize,
}

/// What [`inspect`] found in a container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerSummary {
    pub doc_type: String,
    pub codec_id: String,
    pub width: u32,
    pub height: u32,
    pub duration_ms: f64,
    pub blocks: Vec<BlockInfo>,
}

impl ContainerSummary {
    /// True when block timestamps strictly increase.
    pub fn is_monotonic(&self) -> bool {
        self.blocks
            .windows(2)
            .all(|pair| pair[0].timestamp_ms < pair[1].timestamp_ms)
    }
}

/// Walk a Matroska buffer written by [`MatroskaMuxer`] and summarize it.
pub fn inspect(buf: &[u8]) -> SceneCastResult<ContainerSummary> {
    let mut summary = ContainerSummary::default();
    let mut reader = Reader {
        buf,
        cluster_ms: 0,
    };
    let (id, _, _) = reader.header_at(0)?;
    if id != ids::EBML {
        return Err(malformed("missing EBML header"));
    }
    reader.walk(0, buf.len(), &mut summary)?;
    if summary.doc_type != "matroska" {
        return Err(malformed(format!("unexpected doc type {:?}", summary.doc_type)));
    }
    Ok(summary)
}

fn malformed(msg: impl std::fmt::Display) -> SceneCastError {
    SceneCastError::muxer_finalize(format!("malformed container: {msg}"))
}

struct Reader<'a> {
    buf: &'a [u8],
    cluster_ms: u64,
}

impl Reader<'_> {
    /// Element id, body size, and header length at `pos`.
    fn header_at(&self, pos: usize) -> SceneCastResult<(u32, usize, usize)> {
        let first = *self.buf.get(pos).ok_or_else(|| malformed("truncated id"))?;
        let id_len = first.leading_zeros() as usize + 1;
        if id_len > 4 {
            return Err(malformed("invalid id"));
        }
        let id_bytes = self
            .buf
            .get(pos..pos + id_len)
            .ok_or_else(|| malformed("truncated id"))?;
        let id = id_bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);

        let (size, size_len) = self.vint_at(pos + id_len)?;
        Ok((id, size as usize, id_len + size_len))
    }

    fn vint_at(&self, pos: usize) -> SceneCastResult<(u64, usize)> {
        let first = *self.buf.get(pos).ok_or_else(|| malformed("truncated size"))?;
        let len = first.leading_zeros() as usize + 1;
        if len > 8 {
            return Err(malformed("invalid size"));
        }
        let bytes = self
            .buf
            .get(pos..pos + len)
            .ok_or_else(|| malformed("truncated size"))?;
        let mut value = (first as u64) & (0xFF >> len);
        for b in &bytes[1..] {
            value = (value << 8) | *b as u64;
        }
        Ok((value, len))
    }

    fn walk(
        &mut self,
        start: usize,
        end: usize,
        summary: &mut ContainerSummary,
    ) -> SceneCastResult<()> {
        let mut pos = start;
        while pos < end {
            let (id, size, header_len) = self.header_at(pos)?;
            let body_start = pos + header_len;
            let body_end = body_start + size;
            if body_end > end {
                return Err(malformed(format!("element {id:#x} overruns its parent")));
            }
            let buf = self.buf;
            let body = &buf[body_start..body_end];

            match id {
                ids::EBML
                | ids::SEGMENT
                | ids::INFO
                | ids::TRACKS
                | ids::TRACK_ENTRY
                | ids::VIDEO => self.walk(body_start, body_end, summary)?,
                ids::CLUSTER => {
                    self.cluster_ms = 0;
                    self.walk(body_start, body_end, summary)?;
                }
                ids::DOC_TYPE => summary.doc_type = String::from_utf8_lossy(body).into_owned(),
                ids::CODEC_ID => summary.codec_id = String::from_utf8_lossy(body).into_owned(),
                ids::PIXEL_WIDTH => summary.width = read_uint(body) as u32,
                ids::PIXEL_HEIGHT => summary.height = read_uint(body) as u32,
                ids::DURATION => summary.duration_ms = read_float(body),
                ids::TIMESTAMP => self.cluster_ms = read_uint(body),
                ids::SIMPLE_BLOCK => {
                    let (_, track_len) = self.vint_at(body_start)?;
                    let rest = body
                        .get(track_len..)
                        .filter(|rest| rest.len() >= 3)
                        .ok_or_else(|| malformed("truncated block"))?;
                    let relative = i16::from_be_bytes([rest[0], rest[1]]);
                    summary.blocks.push(BlockInfo {
                        timestamp_ms: (self.cluster_ms as i64 + relative as i64).max(0) as u64,
                        keyframe: rest[2] & KEYFRAME_FLAG != 0,
                        size: rest.len() - 3,
                    });
                }
                _ => {}
            }
            pos = body_end;
        }
        Ok(())
    }
}

fn read_uint(body: &[u8]) -> u64 {
    body.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

fn read_float(body: &[u8]) -> f64 {
    match body.len() {
        4 => f32::from_be_bytes([body[0], body[1], body[2], body[3]]) as f64,
        8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(body);
            f64::from_be_bytes(bytes)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(timestamp_us: i64, is_key: bool) -> EncodedChunk {
        EncodedChunk {
            data: vec![0xAB; 16],
            timestamp_us,
            duration_us: None,
            is_key,
        }
    }

    #[test]
    fn test_size_encoding_is_shortest_form() {
        let mut out = Vec::new();
        write_size(&mut out, 1);
        assert_eq!(out, vec![0x81]);

        out.clear();
        write_size(&mut out, 127);
        assert_eq!(out, vec![0x40, 0x7F]);

        out.clear();
        write_id(&mut out, ids::SEGMENT);
        assert_eq!(out, vec![0x18, 0x53, 0x80, 0x67]);
    }

    #[test]
    fn test_buffer_absent_until_finalize() {
        let mut muxer = MatroskaMuxer::new("V_MJPEG", 64, 48, 30);
        muxer.add_chunk(&chunk(0, true)).unwrap();
        assert!(muxer.buffer().is_none());
        muxer.finalize().unwrap();
        let buf = muxer.buffer().unwrap();
        assert_eq!(&buf[..4], &[0x1A, 0x45, 0xDF, 0xA3]);
        assert!(muxer.finalize().is_err());
    }

    #[test]
    fn test_inspect_reads_back_what_was_written() {
        let mut muxer = MatroskaMuxer::new("V_MJPEG", 64, 48, 30);
        for i in 0..10u64 {
            let ts = scenecast_common::frame_timestamp_us(i, 30) as i64;
            muxer.add_chunk(&chunk(ts, i % 3 == 0)).unwrap();
        }
        muxer.finalize().unwrap();
        let summary = inspect(&muxer.take_buffer().unwrap()).unwrap();

        assert_eq!(summary.doc_type, "matroska");
        assert_eq!(summary.codec_id, "V_MJPEG");
        assert_eq!((summary.width, summary.height), (64, 48));
        assert_eq!(summary.blocks.len(), 10);
        assert!(summary.is_monotonic());
        assert_eq!(summary.blocks[1].timestamp_ms, 33);
        assert_eq!(summary.blocks[2].timestamp_ms, 67);
        assert!(summary.blocks[3].keyframe);
        assert!(!summary.blocks[4].keyframe);
        assert_eq!(summary.blocks[0].size, 16);
        assert!((summary.duration_ms - 333.0).abs() < 1.0);
    }

    #[test]
    fn test_rejects_non_increasing_timestamps() {
        let mut muxer = MatroskaMuxer::new("V_MJPEG", 2, 2, 30);
        muxer.add_chunk(&chunk(10_000, true)).unwrap();
        // 10.4 ms rounds to the same container millisecond.
        let err = muxer.add_chunk(&chunk(10_400, true)).unwrap_err();
        assert!(err.is_encoder_class());
        assert_eq!(muxer.block_count(), 1);
    }

    #[test]
    fn test_long_gaps_open_new_clusters() {
        let mut muxer = MatroskaMuxer::new("V_MJPEG", 2, 2, 1);
        muxer.add_chunk(&chunk(0, false)).unwrap();
        muxer.add_chunk(&chunk(40_000_000, false)).unwrap();
        muxer.finalize().unwrap();
        let summary = inspect(muxer.buffer().unwrap()).unwrap();
        assert_eq!(
            summary
                .blocks
                .iter()
                .map(|b| b.timestamp_ms)
                .collect::<Vec<_>>(),
            vec![0, 40_000]
        );
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        assert!(inspect(&[]).is_err());
        assert!(inspect(b"RIFF....WEBP").is_err());
    }
}
