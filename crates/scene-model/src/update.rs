//! Typed field updates applied to scene objects.
//!
//! UI code never pokes fields by name. Each editable field has a variant
//! here, and applying one keeps object invariants intact (opacity stays in
//! range, content edits mark measured sizes stale).

use serde::{Deserialize, Serialize};

use scenecast_common::{SceneCastError, SceneCastResult};

use crate::animation::Animation;
use crate::geometry::Rgba;
use crate::kinds::ObjectKind;
use crate::object::SceneObject;

/// A single field mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum ObjectUpdate {
    Position { x: f64, y: f64 },
    Size { width: f64, height: f64 },
    Rotation { degrees: f64 },
    Opacity { value: f64 },
    Visible { value: bool },
    Locked { value: bool },
    Name { value: String },
    Animation { value: Animation },
    Text { value: String },
    FontSize { value: f64 },
    Color { value: Rgba },
    Kind { value: ObjectKind },
}

impl ObjectUpdate {
    /// Apply to `object`. Fails when the field does not exist on its kind.
    pub fn apply(self, object: &mut SceneObject) -> SceneCastResult<()> {
        match self {
            ObjectUpdate::Position { x, y } => {
                object.x = x;
                object.y = y;
            }
            ObjectUpdate::Size { width, height } => {
                if width < 0.0 || height < 0.0 {
                    return Err(SceneCastError::scene(format!(
                        "negative size {width}x{height}"
                    )));
                }
                if object.kind().is_content_sized() {
                    return Err(SceneCastError::scene(format!(
                        "{} size is measured from its content",
                        object.kind().label()
                    )));
                }
                object.width = width;
                object.height = height;
            }
            ObjectUpdate::Rotation { degrees } => object.rotation = degrees,
            ObjectUpdate::Opacity { value } => object.opacity = value.clamp(0.0, 1.0),
            ObjectUpdate::Visible { value } => object.visible = value,
            ObjectUpdate::Locked { value } => object.locked = value,
            ObjectUpdate::Name { value } => object.name = value,
            ObjectUpdate::Animation { value } => object.animation = value,
            ObjectUpdate::Text { value } => {
                let label = object.kind().label();
                let slot = object
                    .kind_mut()
                    .text_mut()
                    .ok_or_else(|| SceneCastError::scene(format!("{label} has no text")))?;
                *slot = value;
            }
            ObjectUpdate::FontSize { value } => {
                if value <= 0.0 {
                    return Err(SceneCastError::scene(format!(
                        "font size must be positive, got {value}"
                    )));
                }
                let label = object.kind().label();
                let slot = object
                    .kind_mut()
                    .font_size_mut()
                    .ok_or_else(|| SceneCastError::scene(format!("{label} has no font size")))?;
                *slot = value;
            }
            ObjectUpdate::Color { value } => {
                let label = object.kind().label();
                let slot = object
                    .kind_mut()
                    .color_mut()
                    .ok_or_else(|| SceneCastError::scene(format!("{label} has no color")))?;
                *slot = value;
            }
            ObjectUpdate::Kind { value } => object.set_kind(value),
        }
        Ok(())
    }
}
