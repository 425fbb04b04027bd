//! Height differentiation with weighted Sobel kernels.

use glam::DVec3;
use rayon::prelude::*;
use texpack_spec::NormalMethod;

use super::NormalField;
use crate::buffer::GrayscaleBuffer;
use crate::cancel::CancellationToken;
use crate::error::TextureError;
use texpack_spec::options::SUPPORTED_KERNEL_SIZES;

/// Square differentiation kernel of size 3, 5 or 9.
///
/// Each offset `(dx, dy)` is weighted by `max(|dx|, |dy|) / (dx² + dy²)`.
/// Gradients are the raw weighted column (row) sums, so larger kernels
/// report steeper slopes for the same ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SobelKernel {
    size: u32,
}

impl SobelKernel {
    pub fn new(size: u32) -> Result<Self, TextureError> {
        if !SUPPORTED_KERNEL_SIZES.contains(&size) {
            return Err(TextureError::InvalidParameter(format!(
                "kernel size must be one of {:?}, got {}",
                SUPPORTED_KERNEL_SIZES, size
            )));
        }
        Ok(Self { size })
    }

    /// Weight of one offset; zero at the center.
    pub fn weight(dx: i32, dy: i32) -> f64 {
        let d2 = dx * dx + dy * dy;
        if d2 == 0 {
            return 0.0;
        }
        f64::from(dx.abs().max(dy.abs())) / f64::from(d2)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn radius(&self) -> i32 {
        (self.size / 2) as i32
    }

    /// `(left - right, top - bottom)` weighted sums around `(x, y)`.
    ///
    /// Mirrored offsets are differenced pairwise so a level neighborhood
    /// yields exactly zero.
    pub fn gradient(
        &self,
        height: &GrayscaleBuffer,
        x: u32,
        y: u32,
        method: NormalMethod,
        wrap_x: bool,
        wrap_y: bool,
    ) -> (f64, f64) {
        let r = self.radius();
        let center = height.get(x, y);
        let at = |dx: i32, dy: i32| {
            let s = height.sample(x as i32 + dx, y as i32 + dy, wrap_x, wrap_y);
            match method {
                NormalMethod::SobelHigh => s.max(center),
                NormalMethod::SobelLow => s.min(center),
                NormalMethod::Sobel | NormalMethod::Variance => s,
            }
        };
        let mut gx = 0.0;
        let mut gy = 0.0;
        for dy in -r..=r {
            for dx in -r..=r {
                let w = Self::weight(dx, dy);
                if w == 0.0 {
                    continue;
                }
                if dx < 0 {
                    gx += w * (at(dx, dy) - at(-dx, dy));
                }
                if dy < 0 {
                    gy += w * (at(dx, dy) - at(dx, -dy));
                }
            }
        }
        (gx, gy)
    }
}

/// Unit normals for every pixel of `height`.
pub fn differentiate(
    height: &GrayscaleBuffer,
    kernel: &SobelKernel,
    method: NormalMethod,
    strength: f64,
    wrap_x: bool,
    wrap_y: bool,
    cancel: &CancellationToken,
) -> Result<NormalField, TextureError> {
    let mut field = NormalField::flat(height.width, height.height);
    let z = 1.0 / strength;
    let width = height.width as usize;
    field
        .data
        .par_chunks_mut(width)
        .enumerate()
        .try_for_each(|(y, row)| {
            cancel.check()?;
            for (x, n) in row.iter_mut().enumerate() {
                let (gx, gy) = kernel.gradient(height, x as u32, y as u32, method, wrap_x, wrap_y);
                *n = DVec3::new(gx, gy, z).normalize();
            }
            Ok::<(), TextureError>(())
        })?;
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: u32, height: u32, slope: f64) -> GrayscaleBuffer {
        let mut plane = GrayscaleBuffer::new(width, height, 0.0);
        for y in 0..height {
            for x in 0..width {
                plane.set(x, y, x as f64 * slope);
            }
        }
        plane
    }

    #[test]
    fn rejects_unsupported_sizes() {
        for size in [0, 1, 2, 4, 7, 11] {
            assert!(SobelKernel::new(size).is_err(), "size {}", size);
        }
    }

    #[test]
    fn weights_follow_the_chebyshev_rule() {
        assert_eq!(SobelKernel::weight(0, 0), 0.0);
        assert_eq!(SobelKernel::weight(1, 0), 1.0);
        assert_eq!(SobelKernel::weight(1, 1), 0.5);
        assert_eq!(SobelKernel::weight(2, 1), 0.4);
        assert_eq!(SobelKernel::weight(-2, 0), 0.5);
    }

    #[test]
    fn ramp_gradient_is_the_raw_weighted_sum() {
        let plane = ramp(32, 32, 0.1);
        for (size, expected) in [(3, -0.4), (5, -1.28), (9, -4.42)] {
            let kernel = SobelKernel::new(size).unwrap();
            let (gx, gy) = kernel.gradient(&plane, 16, 16, NormalMethod::Sobel, false, false);
            assert!((gx - expected).abs() < 1e-9, "size {} gx {}", size, gx);
            assert!(gy.abs() < 1e-9, "size {} gy {}", size, gy);
        }
    }

    #[test]
    fn normal_uses_inverse_strength_as_z() {
        let plane = ramp(8, 8, 0.1);
        let kernel = SobelKernel::new(3).unwrap();
        let field = differentiate(
            &plane,
            &kernel,
            NormalMethod::Sobel,
            2.0,
            false,
            false,
            &CancellationToken::new(),
        )
        .unwrap();
        let expected = DVec3::new(-0.4, 0.0, 0.5).normalize();
        assert!((field.get(4, 4) - expected).length() < 1e-9);
    }

    #[test]
    fn high_and_low_variants_clip_neighbors() {
        // Single raised pixel: the center is the maximum.
        let mut plane = GrayscaleBuffer::new(5, 5, 0.0);
        plane.set(2, 2, 1.0);
        let kernel = SobelKernel::new(3).unwrap();
        let (gx, gy) = kernel.gradient(&plane, 2, 2, NormalMethod::SobelHigh, false, false);
        assert_eq!((gx, gy), (0.0, 0.0));

        // Left neighbor raised: low variant ignores it from a lower center.
        let mut plane = GrayscaleBuffer::new(5, 5, 0.0);
        plane.set(1, 2, 1.0);
        let (gx, _) = kernel.gradient(&plane, 2, 2, NormalMethod::SobelLow, false, false);
        assert_eq!(gx, 0.0);
        let (gx, _) = kernel.gradient(&plane, 2, 2, NormalMethod::Sobel, false, false);
        assert!(gx > 0.0);
    }

    #[test]
    fn normals_lean_away_from_higher_ground() {
        let plane = ramp(8, 8, 0.1);
        let kernel = SobelKernel::new(3).unwrap();
        let field = differentiate(
            &plane,
            &kernel,
            NormalMethod::Sobel,
            1.0,
            false,
            false,
            &CancellationToken::new(),
        )
        .unwrap();
        let n = field.get(4, 4);
        assert!(n.x < 0.0);
        assert!(n.y.abs() < 1e-9);
        assert!((n.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cancelled_differentiation_stops() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let kernel = SobelKernel::new(3).unwrap();
        let result = differentiate(
            &ramp(4, 4, 0.1),
            &kernel,
            NormalMethod::Sobel,
            1.0,
            false,
            false,
            &cancel,
        );
        assert!(matches!(result, Err(TextureError::Cancelled)));
    }
}
