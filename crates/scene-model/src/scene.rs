//! The scene: z-ordered objects plus canvas-level settings.

use serde::{Deserialize, Serialize};

use scenecast_common::{SceneCastError, SceneCastResult};

use crate::geometry::Rgba;
use crate::object::{Cloneable, Hittable, ObjectId, SceneObject};

/// Advisory layout guides. Never part of exported frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideOverlay {
    #[default]
    None,
    /// Rule-of-thirds grid.
    Thirds,
    /// Center cross.
    Center,
    /// Title-safe margin (90% box).
    Safe,
}

/// Objects in back-to-front order plus canvas settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    objects: Vec<SceneObject>,

    /// Canvas width in pixels. Mirrors the owning surface.
    pub width: u32,
    pub height: u32,

    pub background: Rgba,

    #[serde(default)]
    pub guides: GuideOverlay,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            objects: Vec::new(),
            width,
            height,
            background: Rgba::rgb(17, 24, 39),
            guides: GuideOverlay::None,
        }
    }

    /// Add an object on top. Ids must be unique within the scene.
    pub fn add(&mut self, object: SceneObject) -> SceneCastResult<ObjectId> {
        let id = object.id;
        if self.index_of(id).is_some() {
            return Err(SceneCastError::scene(format!("duplicate object id {id}")));
        }
        self.objects.push(object);
        Ok(id)
    }

    /// Remove and return an object.
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let idx = self.index_of(id)?;
        Some(self.objects.remove(idx))
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Objects back to front.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|o| o.id).collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    /// Swap with the next object toward the front. No-op at the top.
    pub fn move_up(&mut self, id: ObjectId) -> bool {
        match self.index_of(id) {
            Some(idx) if idx + 1 < self.objects.len() => {
                self.objects.swap(idx, idx + 1);
                true
            }
            _ => false,
        }
    }

    /// Swap with the next object toward the back. No-op at the bottom.
    pub fn move_down(&mut self, id: ObjectId) -> bool {
        match self.index_of(id) {
            Some(idx) if idx > 0 => {
                self.objects.swap(idx, idx - 1);
                true
            }
            _ => false,
        }
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let obj = self.objects.remove(idx);
        self.objects.push(obj);
        true
    }

    pub fn send_to_back(&mut self, id: ObjectId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let obj = self.objects.remove(idx);
        self.objects.insert(0, obj);
        true
    }

    /// Clone an object and insert the copy directly above it.
    pub fn duplicate(&mut self, id: ObjectId) -> SceneCastResult<ObjectId> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| SceneCastError::scene(format!("unknown object id {id}")))?;
        let copy = self.objects[idx].clone_object();
        let new_id = copy.id;
        self.objects.insert(idx + 1, copy);
        Ok(new_id)
    }

    /// Topmost visible, unlocked object under the point.
    pub fn topmost_at(&self, x: f64, y: f64) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .filter(|o| o.visible && !o.locked)
            .find(|o| o.is_hit(x, y))
            .map(|o| o.id)
    }

    /// A scene with no area has never been sized.
    pub fn has_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}
