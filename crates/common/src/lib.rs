//! SceneCast Common Utilities
//!
//! Shared infrastructure for all SceneCast crates:
//! - Error types and result aliases
//! - Clock and timestamp-domain conversions
//! - Cooperative cancellation
//! - Tracing/logging initialization
//! - Configuration loading

pub mod cancel;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use cancel::*;
pub use clock::*;
pub use config::*;
pub use error::*;
