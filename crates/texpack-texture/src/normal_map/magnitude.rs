//! Normal vector magnitude.

use glam::DVec3;

use crate::buffer::{ImageBuffer, PixelFormat};
use crate::mapping::MappingSide;

/// Length of a standard-encoded RGB normal (bytes biased into 0..255).
pub fn pixel_magnitude(rgba: [u8; 4]) -> f64 {
    let decode = |b: u8| f64::from(b) / 255.0 * 2.0 - 1.0;
    DVec3::new(decode(rgba[0]), decode(rgba[1]), decode(rgba[2])).length()
}

/// Per-pixel lengths of a normal image, written through `side` into a
/// single-channel image.
pub fn extract_magnitude(image: &ImageBuffer, side: &MappingSide) -> ImageBuffer {
    let mut out = ImageBuffer::new(image.width, image.height, PixelFormat::Gray8);
    for y in 0..image.height {
        for x in 0..image.width {
            let m = pixel_magnitude(image.pixel(x, y));
            out.set_pixel(x, y, [side.encode(m), 0, 0, 0]);
        }
    }
    out
}

/// Renormalize `normal` and scale it to `magnitude`.
pub fn apply_magnitude(normal: DVec3, magnitude: f64) -> DVec3 {
    normal.normalize_or_zero() * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_normal_has_unit_length() {
        let m = pixel_magnitude([128, 128, 255, 255]);
        assert!((m - 1.0).abs() < 0.01);
    }

    #[test]
    fn short_vectors_report_their_length() {
        // z = 0.5, x = y = 0
        let m = pixel_magnitude([128, 128, 191, 255]);
        assert!((m - 0.5).abs() < 0.01, "got {}", m);

        let image = ImageBuffer::from_raw(1, 1, PixelFormat::Rgb8, vec![128, 128, 191]).unwrap();
        let out = extract_magnitude(&image, &MappingSide::default());
        assert!((i32::from(out.data[0]) - 128).abs() <= 1);
    }

    #[test]
    fn apply_rescales_direction() {
        let v = apply_magnitude(DVec3::new(0.0, 3.0, 4.0), 0.5);
        assert!((v.length() - 0.5).abs() < 1e-12);
        assert!((v.y - 0.3).abs() < 1e-12);
        assert_eq!(apply_magnitude(DVec3::ZERO, 0.5), DVec3::ZERO);
    }
}
