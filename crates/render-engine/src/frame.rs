//! Owned frame snapshots handed to encoders and recorders.

use std::path::Path;

use serde::{Deserialize, Serialize};

use scenecast_common::{SceneCastError, SceneCastResult};

/// An immutable straight-alpha RGBA image, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap pixel data. `data` must hold exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> SceneCastResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(SceneCastError::render(format!(
                "frame {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Uniform color frame.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Pixel at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Drop alpha, for encoders that take packed RGB.
    pub fn to_rgb(&self) -> Vec<u8> {
        self.data
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> SceneCastResult<()> {
        let path = path.as_ref();
        let img = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| SceneCastError::render("frame buffer does not match dimensions"))?;
        img.save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| SceneCastError::render(format!("writing {}: {e}", path.display())))
    }
}

/// Round dimensions down to even numbers, as video encoders require.
pub fn even_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width - width % 2, height - height % 2)
}

/// Convert premultiplied RGBA to straight alpha.
pub fn unpremultiply_rgba_in_place(bytes: &mut [u8]) {
    for pixel in bytes.chunks_exact_mut(4) {
        let alpha = pixel[3];
        if alpha == 0 {
            pixel[0] = 0;
            pixel[1] = 0;
            pixel[2] = 0;
            continue;
        }
        if alpha == 255 {
            continue;
        }

        let alpha_u16 = alpha as u16;
        pixel[0] = ((pixel[0] as u16 * 255 + (alpha_u16 / 2)) / alpha_u16).min(255) as u8;
        pixel[1] = ((pixel[1] as u16 * 255 + (alpha_u16 / 2)) / alpha_u16).min(255) as u8;
        pixel[2] = ((pixel[2] as u16 * 255 + (alpha_u16 / 2)) / alpha_u16).min(255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_dimensions() {
        assert_eq!(even_dimensions(1920, 1080), (1920, 1080));
        assert_eq!(even_dimensions(1281, 721), (1280, 720));
        assert_eq!(even_dimensions(1, 1), (0, 0));
    }

    #[test]
    fn test_frame_size_checked() {
        assert!(Frame::new(2, 2, vec![0; 16]).is_ok());
        assert!(Frame::new(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn test_unpremultiply() {
        let mut px = [64, 32, 0, 128, 10, 10, 10, 0];
        unpremultiply_rgba_in_place(&mut px);
        assert_eq!(&px[..4], &[128, 64, 0, 128]);
        assert_eq!(&px[4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_solid_and_rgb() {
        let frame = Frame::solid(2, 1, [1, 2, 3, 255]);
        assert_eq!(frame.pixel(1, 0), Some([1, 2, 3, 255]));
        assert_eq!(frame.pixel(2, 0), None);
        assert_eq!(frame.to_rgb(), vec![1, 2, 3, 1, 2, 3]);
    }
}
