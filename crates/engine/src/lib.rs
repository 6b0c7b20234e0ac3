//! SceneCast Engine
//!
//! Owns a scene and its canvas surface and provides:
//!
//! - a playback clock (`play`, `pause`, `seek`, per-frame `tick`)
//! - pointer and touch interaction (select, drag)
//! - proportional resize
//! - observer subscriptions for UI code
//! - offline and realtime video export
//!
//! # Export Architecture
//!
//! ```text
//! Offline:   seek(i/fps) ──► snapshot ──► ENCODE_FRAME ──► encode worker ──► .mkv
//!                 ▲                                             │
//!                 └──────────── PROGRESS (backpressure) ◄───────┘
//!
//! Realtime:  play() ──► tick ──► render ──► capture ──► stream recorder ──► .webm/.mkv
//! ```

pub mod engine;
pub mod events;
pub mod export;

pub use engine::*;
pub use events::*;
pub use export::*;
