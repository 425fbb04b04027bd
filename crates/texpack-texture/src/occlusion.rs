//! Ambient occlusion by ray marching a height field.
//!
//! From every pixel a hemisphere of rays is marched over the surface. A ray
//! that dips under the height field counts as a hit, weighted by how early
//! it happened. The result is `1 - hits / (rays + 1)`, so an unoccluded
//! pixel reads 1.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec3;
use rayon::prelude::*;
use texpack_spec::OcclusionBuildOptions;

use crate::buffer::{GrayscaleBuffer, ImageBuffer};
use crate::cancel::CancellationToken;
use crate::error::TextureError;
use crate::height::HeightField;

/// Precomputed ray directions for a quality setting.
#[derive(Debug, Clone, PartialEq)]
pub struct RaySet {
    pub horizontal: u32,
    pub vertical: u32,
    pub directions: Vec<DVec3>,
}

impl RaySet {
    /// Evenly spread azimuths times evenly spread elevations above the
    /// surface. Quality 0 gives 4 x 1 rays, quality 1 gives 360 x 89.
    pub fn new(quality: f64) -> Self {
        let q = quality.clamp(0.0, 1.0);
        let horizontal = (4.0 + q * 356.0).round() as u32;
        let vertical = (1.0 + q * 88.0).round() as u32;
        let mut directions = Vec::with_capacity((horizontal * vertical) as usize);
        for hi in 0..horizontal {
            let azimuth = -PI + 2.0 * PI * f64::from(hi) / f64::from(horizontal);
            for vi in 0..vertical {
                let elevation = FRAC_PI_2 * (f64::from(vi) + 0.5) / f64::from(vertical);
                directions.push(DVec3::new(
                    elevation.cos() * azimuth.cos(),
                    elevation.cos() * azimuth.sin(),
                    elevation.sin(),
                ));
            }
        }
        Self {
            horizontal,
            vertical,
            directions,
        }
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }
}

struct Marcher<'a> {
    plane: &'a GrayscaleBuffer,
    options: &'a OcclusionBuildOptions,
    step: f64,
    ceiling: f64,
}

impl Marcher<'_> {
    fn surface(&self, h: f64) -> f64 {
        (h + self.options.z_bias) * self.options.z_scale
    }

    fn surface_at(&self, p: DVec3) -> f64 {
        let h = self.plane.sample_bilinear(p.x, p.y, self.options.wrap_x, self.options.wrap_y);
        self.surface(h)
    }

    /// Weighted hit for one ray, 0 when it escapes.
    fn march(&self, origin: DVec3, direction: DVec3, cancel: &CancellationToken) -> Result<f64, TextureError> {
        let steps = self.options.step_count;
        for k in 1..=steps {
            cancel.check()?;
            let p = origin + direction * (self.step * f64::from(k));
            if p.z > self.ceiling {
                break;
            }
            // Off-field positions read the clamped edge on non-tiling axes.
            if p.z < self.surface_at(p) {
                let t = f64::from(k) / f64::from(steps);
                return Ok(1.0 - t.powf(self.options.hit_power));
            }
        }
        Ok(0.0)
    }
}

/// Occlusion of a single frame, 1 meaning unoccluded.
pub fn occlusion_for_plane(
    plane: &GrayscaleBuffer,
    scale: f64,
    options: &OcclusionBuildOptions,
    rays: &RaySet,
    cancel: &CancellationToken,
) -> Result<GrayscaleBuffer, TextureError> {
    let marcher = Marcher {
        plane,
        options,
        step: options.step_distance * scale,
        ceiling: options.z_scale * (1.0 + options.z_bias),
    };
    let mut out = GrayscaleBuffer::new(plane.width, plane.height, 1.0);
    let denominator = rays.len() as f64 + 1.0;
    out.data
        .par_chunks_mut(plane.width as usize)
        .enumerate()
        .try_for_each(|(y, row)| {
            for (x, value) in row.iter_mut().enumerate() {
                let base = DVec3::new(x as f64 + 0.5, y as f64 + 0.5, 0.0);
                let origin = DVec3::new(base.x, base.y, marcher.surface_at(base));
                let mut hits = 0.0;
                for &direction in &rays.directions {
                    cancel.check()?;
                    hits += marcher.march(origin, direction, cancel)?;
                }
                *value = (1.0 - hits / denominator).clamp(0.0, 1.0);
            }
            Ok::<(), TextureError>(())
        })?;
    Ok(out)
}

/// Occlusion for every frame of `height`, as a single-channel image.
pub fn generate_occlusion(
    height: &HeightField,
    options: &OcclusionBuildOptions,
    cancel: &CancellationToken,
) -> Result<ImageBuffer, TextureError> {
    options
        .validate()
        .map_err(|e| TextureError::InvalidParameter(e.message))?;
    let rays = RaySet::new(options.quality);
    tracing::debug!(
        rays = rays.len(),
        frames = height.frames,
        "marching occlusion rays"
    );

    let mut plane = GrayscaleBuffer::new(height.width(), height.height(), 1.0);
    let frame_len = (height.width() * height.frame_height()) as usize;
    for frame in 0..height.frames {
        cancel.check()?;
        let result =
            occlusion_for_plane(&height.frame_plane(frame), height.scale, options, &rays, cancel)?;
        let start = frame as usize * frame_len;
        plane.data[start..start + frame_len].copy_from_slice(&result.data);
    }
    Ok(plane.to_gray8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn low_quality() -> OcclusionBuildOptions {
        OcclusionBuildOptions::default().with_quality(0.0)
    }

    #[test]
    fn ray_counts_follow_quality() {
        let low = RaySet::new(0.0);
        assert_eq!((low.horizontal, low.vertical, low.len()), (4, 1, 4));
        let high = RaySet::new(1.0);
        assert_eq!((high.horizontal, high.vertical), (360, 89));
        for d in &high.directions {
            assert!(d.z > 0.0);
            assert!((d.length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn flat_field_is_unoccluded() {
        let height = HeightField::new(GrayscaleBuffer::new(4, 4, 0.5), 1.0, 1).unwrap();
        for quality in [0.0, 0.05, 0.5, 1.0] {
            for steps in [1, 4, 16] {
                for (wrap_x, wrap_y) in [(false, false), (true, true)] {
                    let options = OcclusionBuildOptions::default()
                        .with_quality(quality)
                        .with_step_count(steps)
                        .with_wrap(wrap_x, wrap_y);
                    let image = generate_occlusion(&height, &options, &CancellationToken::new()).unwrap();
                    assert!(
                        image.data.iter().all(|&b| b == 255),
                        "quality {} steps {} wrap {:?}: {:?}",
                        quality,
                        steps,
                        (wrap_x, wrap_y),
                        image.data
                    );
                }
            }
        }
    }

    #[test]
    fn rays_leaving_the_field_see_the_clamped_edge() {
        // A raised first column next to a floor. The leftward ray from
        // column 1 steps straight past the edge.
        let mut plane = GrayscaleBuffer::new(8, 8, 0.0);
        for y in 0..8 {
            plane.set(0, y, 1.0);
        }
        let height = HeightField::new(plane, 1.0, 1).unwrap();
        let mut options = low_quality();
        options.step_distance = 3.0;
        let image = generate_occlusion(&height, &options, &CancellationToken::new()).unwrap();
        let beside_wall = image.get(1, 4, 0);
        assert!(beside_wall < 255, "{}", beside_wall);
        // 1 - (1 - (1/16)^1.5) / 5
        assert!((i32::from(beside_wall) - 205).abs() <= 1, "{}", beside_wall);
    }

    #[test]
    fn a_pit_is_darker_than_the_plain() {
        let mut plane = GrayscaleBuffer::new(16, 16, 1.0);
        for y in 6..10 {
            for x in 6..10 {
                plane.set(x, y, 0.0);
            }
        }
        let height = HeightField::new(plane, 1.0, 1).unwrap();
        let options = OcclusionBuildOptions::default().with_quality(0.05);
        let image = generate_occlusion(&height, &options, &CancellationToken::new()).unwrap();
        let pit = image.get(7, 7, 0);
        let plain = image.get(1, 1, 0);
        assert!(pit < plain, "pit {} plain {}", pit, plain);
        assert_eq!(plain, 255);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let height = HeightField::new(GrayscaleBuffer::new(2, 2, 0.0), 1.0, 1).unwrap();
        let options = OcclusionBuildOptions::default().with_quality(1.5);
        assert!(matches!(
            generate_occlusion(&height, &options, &CancellationToken::new()),
            Err(TextureError::InvalidParameter(_))
        ));
        let options = OcclusionBuildOptions::default().with_step_count(0);
        assert!(generate_occlusion(&height, &options, &CancellationToken::new()).is_err());
    }

    #[test]
    fn cancellation_stops_marching() {
        let height = HeightField::new(GrayscaleBuffer::new(4, 4, 0.0), 1.0, 1).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            generate_occlusion(&height, &low_quality(), &cancel),
            Err(TextureError::Cancelled)
        ));
    }
}
