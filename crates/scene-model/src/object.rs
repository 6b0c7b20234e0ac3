//! Scene objects: shared geometry, flags and animation plus a kind payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::animation::Animation;
use crate::geometry::Bounds;
use crate::kinds::ObjectKind;

/// Pixels a cloned object is shifted right and down from its source.
pub const CLONE_OFFSET_PX: f64 = 20.0;

/// Opaque object identifier, unique within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(uuid::Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A drawable, animatable, hit-testable entity on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,

    /// User-facing display name. Not unique.
    pub name: String,

    /// Top-left corner in canvas pixels.
    pub x: f64,
    pub y: f64,

    /// Box size in canvas pixels. Measured at draw time for content-sized kinds.
    pub width: f64,
    pub height: f64,

    /// Rotation in degrees about the box center. Ignored by hit-testing.
    #[serde(default)]
    pub rotation: f64,

    /// Opacity in `[0, 1]`.
    pub opacity: f64,

    pub visible: bool,

    /// Locked objects draw normally but cannot be picked or dragged.
    #[serde(default)]
    pub locked: bool,

    #[serde(default)]
    pub animation: Animation,

    #[serde(flatten)]
    kind: ObjectKind,

    /// Width/height no longer reflect content until the next draw.
    #[serde(skip)]
    size_stale: bool,
}

/// Axis-aligned containment against the current bounding box.
pub trait Hittable {
    fn is_hit(&self, x: f64, y: f64) -> bool;
}

/// Deep copy under a fresh identity.
pub trait Cloneable {
    fn clone_object(&self) -> Self;
}

impl SceneObject {
    /// New object at the origin with the kind's default size.
    pub fn new(kind: ObjectKind) -> Self {
        let (width, height) = kind.default_size();
        let size_stale = kind.is_content_sized();
        Self {
            id: ObjectId::new(),
            name: kind.label().to_string(),
            x: 0.0,
            y: 0.0,
            width,
            height,
            rotation: 0.0,
            opacity: 1.0,
            visible: true,
            locked: false,
            animation: Animation::default(),
            kind,
            size_stale,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = animation;
        self
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// Mutable access to the kind payload. Content-sized objects become stale.
    pub fn kind_mut(&mut self) -> &mut ObjectKind {
        self.mark_content_changed();
        &mut self.kind
    }

    /// Replace the payload wholesale.
    pub fn set_kind(&mut self, kind: ObjectKind) {
        self.kind = kind;
        self.mark_content_changed();
    }

    pub fn mark_content_changed(&mut self) {
        if self.kind.is_content_sized() {
            self.size_stale = true;
        }
    }

    /// True when width/height must not be trusted until the next draw.
    pub fn is_size_stale(&self) -> bool {
        self.size_stale
    }

    /// Record the size measured by the last draw.
    pub fn set_measured_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.size_stale = false;
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    /// Scale for a canvas resize: position per axis, size uniformly by `s`.
    pub fn rescale(&mut self, scale_x: f64, scale_y: f64, s: f64) {
        self.x *= scale_x;
        self.y *= scale_y;
        self.width *= s;
        self.height *= s;
        self.kind.scale_sizes(s);
    }
}

impl Hittable for SceneObject {
    fn is_hit(&self, x: f64, y: f64) -> bool {
        self.bounds().contains(x, y)
    }
}

impl Cloneable for SceneObject {
    fn clone_object(&self) -> Self {
        let mut copy = self.clone();
        copy.id = ObjectId::new();
        copy.x += CLONE_OFFSET_PX;
        copy.y += CLONE_OFFSET_PX;
        copy
    }
}
