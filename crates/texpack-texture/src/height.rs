//! Height field shared by the normal and occlusion generators.

use crate::buffer::{Gray16Buffer, GrayscaleBuffer, ImageBuffer};
use crate::error::TextureError;

/// Normalized heights for one material, built once and only read afterwards.
///
/// Animated or tiled materials stack `frames` equally tall frames
/// vertically; generators treat each frame as its own image.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    pub plane: GrayscaleBuffer,
    /// Target size over the original height source size.
    pub scale: f64,
    pub frames: u32,
}

impl HeightField {
    pub fn new(plane: GrayscaleBuffer, scale: f64, frames: u32) -> Result<Self, TextureError> {
        if plane.width == 0 || plane.height == 0 {
            return Err(TextureError::InvalidParameter(
                "height field must not be empty".to_string(),
            ));
        }
        if frames == 0 || plane.height % frames != 0 {
            return Err(TextureError::InvalidParameter(format!(
                "height {} does not split into {} frames",
                plane.height, frames
            )));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(TextureError::InvalidParameter(format!(
                "height scale must be positive, got {}",
                scale
            )));
        }
        Ok(Self {
            plane,
            scale,
            frames,
        })
    }

    /// Heights from the red slot of an 8-bit image.
    pub fn from_image(image: &ImageBuffer, scale: f64, frames: u32) -> Result<Self, TextureError> {
        Self::new(image.channel_plane(0), scale, frames)
    }

    pub fn from_gray16(buffer: &Gray16Buffer, scale: f64, frames: u32) -> Result<Self, TextureError> {
        Self::new(GrayscaleBuffer::from_gray16(buffer), scale, frames)
    }

    pub fn width(&self) -> u32 {
        self.plane.width
    }

    pub fn height(&self) -> u32 {
        self.plane.height
    }

    pub fn frame_height(&self) -> u32 {
        self.plane.height / self.frames
    }

    /// First row of `frame`.
    pub fn frame_offset(&self, frame: u32) -> u32 {
        frame * self.frame_height()
    }

    pub fn frame_plane(&self, frame: u32) -> GrayscaleBuffer {
        self.plane
            .crop_rows(self.frame_offset(frame), self.frame_height())
    }

    /// 16-bit export.
    pub fn to_gray16(&self) -> Gray16Buffer {
        self.plane.to_gray16()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelFormat;

    #[test]
    fn frames_split_the_plane() {
        let mut plane = GrayscaleBuffer::new(2, 4, 0.0);
        plane.set(0, 2, 1.0);
        let field = HeightField::new(plane, 1.0, 2).unwrap();
        assert_eq!(field.frame_height(), 2);
        assert_eq!(field.frame_offset(1), 2);
        let second = field.frame_plane(1);
        assert_eq!(second.height, 2);
        assert_eq!(second.get(0, 0), 1.0);
    }

    #[test]
    fn rejects_uneven_frames() {
        let plane = GrayscaleBuffer::new(2, 3, 0.0);
        assert!(HeightField::new(plane.clone(), 1.0, 2).is_err());
        assert!(HeightField::new(plane, 0.0, 1).is_err());
    }

    #[test]
    fn builds_from_red_slot() {
        let image = ImageBuffer::from_raw(1, 1, PixelFormat::Rgb8, vec![255, 0, 0]).unwrap();
        let field = HeightField::from_image(&image, 1.0, 1).unwrap();
        assert_eq!(field.plane.get(0, 0), 1.0);
        assert_eq!(field.to_gray16().data, vec![65535]);
    }
}
