//! SceneCast Scene Model
//!
//! Defines the data contracts the engine operates on:
//! - **Objects:** drawable, animatable, hit-testable entities with a kind payload
//! - **Animation:** entrance animations as pure functions of scene time
//! - **Scene:** z-ordered objects plus canvas settings
//! - **Documents:** versioned JSON persistence of a scene
//!
//! Coordinates are canvas pixels with the origin at the top-left corner.

pub mod animation;
pub mod document;
pub mod geometry;
pub mod kinds;
pub mod object;
pub mod scene;
pub mod update;

pub use animation::*;
pub use document::*;
pub use geometry::*;
pub use kinds::*;
pub use object::*;
pub use scene::*;
pub use update::*;
