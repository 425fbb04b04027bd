//! Low-frequency pass and variance blending.

use glam::DVec3;
use rayon::prelude::*;

use super::NormalField;
use crate::buffer::GrayscaleBuffer;
use crate::cancel::CancellationToken;
use crate::error::TextureError;

/// Box-filtered reduction by `factor`; partial edge blocks average what they cover.
pub fn downsample_box(plane: &GrayscaleBuffer, factor: u32) -> GrayscaleBuffer {
    let factor = factor.max(1);
    let width = plane.width.div_ceil(factor);
    let height = plane.height.div_ceil(factor);
    let mut out = GrayscaleBuffer::new(width, height, 0.0);
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;
            let mut count = 0u32;
            for sy in y * factor..((y + 1) * factor).min(plane.height) {
                for sx in x * factor..((x + 1) * factor).min(plane.width) {
                    sum += plane.get(sx, sy);
                    count += 1;
                }
            }
            out.set(x, y, sum / f64::from(count.max(1)));
        }
    }
    out
}

/// Separable Gaussian blur; edges wrap or clamp per axis.
pub fn gaussian_blur(plane: &GrayscaleBuffer, sigma: f64, wrap_x: bool, wrap_y: bool) -> GrayscaleBuffer {
    if sigma <= 0.0 {
        return plane.clone();
    }
    let width = plane.width;
    let height = plane.height;

    // 3 sigma on each side
    let kernel_size = ((sigma * 3.0).ceil() as usize * 2 + 1).max(3);
    let half_kernel = (kernel_size / 2) as i32;

    let mut kernel = vec![0.0; kernel_size];
    let mut sum = 0.0;
    for (i, kernel_value) in kernel.iter_mut().enumerate() {
        let x = i as f64 - f64::from(half_kernel);
        let value = (-x * x / (2.0 * sigma * sigma)).exp();
        *kernel_value = value;
        sum += value;
    }
    for value in &mut kernel {
        *value /= sum;
    }

    let mut temp = GrayscaleBuffer::new(width, height, 0.0);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (i, kernel_value) in kernel.iter().enumerate() {
                let offset = i as i32 - half_kernel;
                acc += plane.sample(x as i32 + offset, y as i32, wrap_x, wrap_y) * kernel_value;
            }
            temp.set(x, y, acc);
        }
    }

    let mut out = GrayscaleBuffer::new(width, height, 0.0);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (i, kernel_value) in kernel.iter().enumerate() {
                let offset = i as i32 - half_kernel;
                acc += temp.sample(x as i32, y as i32 + offset, wrap_x, wrap_y) * kernel_value;
            }
            out.set(x, y, acc);
        }
    }
    out
}

/// Bilinear resize to `width` x `height`, aligned on pixel centers.
pub fn upsample_bilinear(
    plane: &GrayscaleBuffer,
    width: u32,
    height: u32,
    wrap_x: bool,
    wrap_y: bool,
) -> GrayscaleBuffer {
    let sx = f64::from(plane.width) / f64::from(width);
    let sy = f64::from(plane.height) / f64::from(height);
    let mut out = GrayscaleBuffer::new(width, height, 0.0);
    for y in 0..height {
        for x in 0..width {
            let fx = (f64::from(x) + 0.5) * sx;
            let fy = (f64::from(y) + 0.5) * sy;
            out.set(x, y, plane.sample_bilinear(fx, fy, wrap_x, wrap_y));
        }
    }
    out
}

/// Smoothed copy of `plane` at full resolution.
pub fn low_frequency_height(
    plane: &GrayscaleBuffer,
    downsample: u32,
    blur_sigma: f64,
    wrap_x: bool,
    wrap_y: bool,
) -> GrayscaleBuffer {
    let small = downsample_box(plane, downsample);
    let blurred = gaussian_blur(&small, blur_sigma, wrap_x, wrap_y);
    upsample_bilinear(&blurred, plane.width, plane.height, wrap_x, wrap_y)
}

/// How much detail to keep where the two heights differ by `difference`.
pub fn variance_weight(difference: f64, variance_strength: f64) -> f64 {
    let d = difference.abs().min(1.0);
    ((1.0 - (1.0 - d).sqrt()) * variance_strength).clamp(0.0, 1.0)
}

/// Tilt angles about the Y and X axes.
pub fn to_euler(n: DVec3) -> (f64, f64) {
    (n.x.atan2(n.z), n.y.atan2(n.z))
}

pub fn from_euler(ax: f64, ay: f64) -> DVec3 {
    let v = DVec3::new(ax.sin() * ay.cos(), ay.sin() * ax.cos(), ax.cos() * ay.cos());
    let n = v.normalize_or_zero();
    if n == DVec3::ZERO {
        DVec3::Z
    } else {
        n
    }
}

/// Interpolate from `low` toward `high` per pixel, by local variance.
pub fn blend_frequencies(
    high: &NormalField,
    low: &NormalField,
    high_height: &GrayscaleBuffer,
    low_height: &GrayscaleBuffer,
    variance_strength: f64,
    cancel: &CancellationToken,
) -> Result<NormalField, TextureError> {
    let limit = std::f64::consts::FRAC_PI_2;
    let mut out = NormalField::flat(high.width, high.height);
    let width = high.width as usize;
    out.data
        .par_chunks_mut(width)
        .enumerate()
        .try_for_each(|(y, row)| {
            cancel.check()?;
            let y = y as u32;
            for (x, n) in row.iter_mut().enumerate() {
                let x = x as u32;
                let t = variance_weight(
                    high_height.get(x, y) - low_height.get(x, y),
                    variance_strength,
                );
                let (hx, hy) = to_euler(high.get(x, y));
                let (lx, ly) = to_euler(low.get(x, y));
                let ax = (lx + (hx - lx) * t).clamp(-limit, limit);
                let ay = (ly + (hy - ly) * t).clamp(-limit, limit);
                *n = from_euler(ax, ay);
            }
            Ok::<(), TextureError>(())
        })?;
    Ok(out)
}
