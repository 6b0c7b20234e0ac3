//! SceneCast Encoder
//!
//! Everything that turns frames into a video file:
//!
//! - [`protocol`]: the closed message set spoken with the encoding worker
//! - [`codec`]: the [`VideoEncoder`] trait and the MJPEG encoder
//! - [`muxer`]: an in-memory Matroska writer and reader
//! - [`worker`]: the isolated encode-worker thread
//! - [`recorder`]: streaming recorders used by realtime export

pub mod codec;
pub mod muxer;
pub mod protocol;
pub mod recorder;
pub mod worker;

pub use codec::*;
pub use muxer::{inspect, BlockInfo, ContainerSummary, MatroskaMuxer};
pub use protocol::*;
pub use recorder::*;
pub use worker::*;
