//! SceneCast Render Engine
//!
//! Software rasterization of scenes into a canvas surface, and the frame
//! snapshots the export pipelines feed to encoders.
//!
//! # Pipeline Architecture
//!
//! ```text
//! Scene ──► background fill
//!              │
//!              ├── objects back to front (animation at time t)
//!              │
//!              ├── editor overlays (selection, guides; never exported)
//!              ▼
//!          Surface ──► snapshot(w, h) ──► Frame (straight RGBA)
//! ```

pub mod draw;
pub mod frame;
pub mod glyphs;
pub mod overlay;
pub mod paint;
pub mod surface;

pub use draw::{measure, render_scene, DrawContext, Drawable};
pub use frame::*;
pub use glyphs::*;
pub use overlay::*;
pub use surface::*;
