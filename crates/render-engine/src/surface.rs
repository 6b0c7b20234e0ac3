//! The canvas surface: a premultiplied RGBA pixel buffer.

use tiny_skia::{Color, Pixmap};

use scenecast_common::{SceneCastError, SceneCastResult};
use scenecast_scene_model::Rgba;

use crate::frame::{unpremultiply_rgba_in_place, Frame};

/// Pixel surface the scene renders into.
#[derive(Debug, Clone)]
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    /// Allocate a surface. Zero-sized surfaces cannot be acquired.
    pub fn new(width: u32, height: u32) -> SceneCastResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            SceneCastError::configuration(format!(
                "cannot allocate a {width}x{height} drawing surface"
            ))
        })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Reallocate at a new size. Contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) -> SceneCastResult<()> {
        if width == self.width() && height == self.height() {
            return Ok(());
        }
        *self = Self::new(width, height)?;
        Ok(())
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixmap
            .fill(Color::from_rgba8(color.r, color.g, color.b, color.a));
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Copy the top-left `width x height` region into an owned frame.
    pub fn snapshot(&self, width: u32, height: u32) -> SceneCastResult<Frame> {
        if width > self.width() || height > self.height() {
            return Err(SceneCastError::render(format!(
                "snapshot {width}x{height} exceeds surface {}x{}",
                self.width(),
                self.height()
            )));
        }

        let src = self.pixmap.data();
        let src_stride = self.width() as usize * 4;
        let row_len = width as usize * 4;
        let mut data = Vec::with_capacity(row_len * height as usize);
        for row in 0..height as usize {
            let start = row * src_stride;
            data.extend_from_slice(&src[start..start + row_len]);
        }
        unpremultiply_rgba_in_place(&mut data);
        Frame::new(width, height, data)
    }

    /// Snapshot of the whole surface.
    pub fn snapshot_full(&self) -> SceneCastResult<Frame> {
        self.snapshot(self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_surface_is_configuration_error() {
        let err = Surface::new(0, 10).unwrap_err();
        assert!(matches!(err, SceneCastError::Configuration { .. }));
    }

    #[test]
    fn test_snapshot_crops_rows() {
        let mut surface = Surface::new(5, 3).unwrap();
        surface.clear(Rgba::rgb(10, 20, 30));
        let frame = surface.snapshot(4, 2).unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.data.len(), 4 * 2 * 4);
        assert_eq!(frame.pixel(3, 1), Some([10, 20, 30, 255]));
        assert!(surface.snapshot(6, 2).is_err());
    }

    #[test]
    fn test_resize_reallocates() {
        let mut surface = Surface::new(4, 4).unwrap();
        surface.resize(8, 2).unwrap();
        assert_eq!((surface.width(), surface.height()), (8, 2));
        assert!(surface.resize(0, 2).is_err());
    }
}
