//! Edge curvature and per-row jitter.

use glam::{DQuat, DVec3};
use rayon::prelude::*;
use texpack_spec::{EdgeCurves, NormalBuildOptions, Region};

use super::NormalField;
use crate::cancel::CancellationToken;
use crate::error::TextureError;
use crate::rng::DeterministicRng;

/// Linear falloff from 1 at the edge to 0 at `radius`.
pub fn edge_fade(distance: f64, radius: f64) -> f64 {
    if radius <= 0.0 || distance >= radius {
        0.0
    } else {
        1.0 - distance / radius
    }
}

/// Curvature at `(u, v)` in 0..1 coordinates of the frame or region.
///
/// Positive angles tilt normals outward, away from the frame center.
pub fn edge_rotation(u: f64, v: f64, curves: &EdgeCurves) -> DQuat {
    let left = edge_fade(u, curves.left.radius);
    let right = edge_fade(1.0 - u, curves.right.radius);
    let top = edge_fade(v, curves.top.radius);
    let bottom = edge_fade(1.0 - v, curves.bottom.radius);

    let ry = curves.right.angle * right - curves.left.angle * left;
    let rx = curves.top.angle * top - curves.bottom.angle * bottom;
    DQuat::from_rotation_y(ry.to_radians()) * DQuat::from_rotation_x(rx.to_radians())
}

/// Random tilts for one row, in degrees.
pub fn row_jitter(seed: u32, row: u32, strength: f64) -> (f64, f64) {
    if strength <= 0.0 {
        return (0.0, 0.0);
    }
    let mut rng = DeterministicRng::for_row(seed, row);
    let x = rng.gen_signed_f64() * strength;
    let y = rng.gen_signed_f64() * strength;
    (x, y)
}

fn region_at(regions: &[Region], u: f64, v: f64) -> Option<(f64, f64)> {
    regions
        .iter()
        .find(|r| u >= r.x && u < r.x + r.width && v >= r.y && v < r.y + r.height)
        .map(|r| ((u - r.x) / r.width, (v - r.y) / r.height))
}

/// Whether [`rotate_field`] would change anything.
pub fn has_rotation(options: &NormalBuildOptions) -> bool {
    options.curves.is_active() || options.noise_strength > 0.0
}

/// Apply curvature and jitter in place. `row_offset` is the first row of this
/// frame in the whole image so every frame draws different jitter.
pub fn rotate_field(
    field: &mut NormalField,
    options: &NormalBuildOptions,
    row_offset: u32,
    cancel: &CancellationToken,
) -> Result<(), TextureError> {
    let full = [Region::full()];
    let regions: &[Region] = if options.regions.is_empty() {
        &full
    } else {
        &options.regions
    };
    let width = field.width;
    let height = field.height;
    let curves_active = options.curves.is_active();

    field
        .data
        .par_chunks_mut(width as usize)
        .enumerate()
        .try_for_each(|(y, row)| {
            cancel.check()?;
            let y = y as u32;
            let (jx, jy) = row_jitter(options.seed, row_offset + y, options.noise_strength);
            let jitter =
                DQuat::from_rotation_x(jx.to_radians()) * DQuat::from_rotation_y(jy.to_radians());
            let v = (f64::from(y) + 0.5) / f64::from(height);
            for (x, n) in row.iter_mut().enumerate() {
                let u = (x as f64 + 0.5) / f64::from(width);
                let curve = if curves_active {
                    region_at(regions, u, v)
                        .map(|(lu, lv)| edge_rotation(lu, lv, &options.curves))
                        .unwrap_or(DQuat::IDENTITY)
                } else {
                    DQuat::IDENTITY
                };
                let rotated: DVec3 = (jitter * curve) * *n;
                *n = rotated.normalize_or_zero();
            }
            Ok::<(), TextureError>(())
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use texpack_spec::EdgeCurve;

    fn curved(regions: Vec<Region>) -> NormalBuildOptions {
        NormalBuildOptions::default()
            .with_curves(EdgeCurves::uniform(EdgeCurve::new(30.0, 0.25)))
            .with_regions(regions)
    }

    #[test]
    fn fade_is_linear_inside_the_radius() {
        assert_eq!(edge_fade(0.0, 0.25), 1.0);
        assert_eq!(edge_fade(0.125, 0.25), 0.5);
        assert_eq!(edge_fade(0.25, 0.25), 0.0);
        assert_eq!(edge_fade(0.0, 0.0), 0.0);
    }

    #[test]
    fn edges_tilt_outward() {
        let mut field = NormalField::flat(16, 16);
        rotate_field(&mut field, &curved(vec![]), 0, &CancellationToken::new()).unwrap();
        assert!(field.get(0, 8).x < 0.0);
        assert!(field.get(15, 8).x > 0.0);
        assert!(field.get(8, 0).y < 0.0);
        assert!(field.get(8, 15).y > 0.0);
        let center = field.get(8, 8);
        assert!((center - DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn curvature_stays_inside_regions() {
        let mut field = NormalField::flat(16, 16);
        let options = curved(vec![Region::new(0.0, 0.0, 0.5, 1.0)]);
        rotate_field(&mut field, &options, 0, &CancellationToken::new()).unwrap();
        // Right edge of the frame is outside the region.
        assert!((field.get(15, 8) - DVec3::Z).length() < 1e-12);
        // Right edge of the region curves.
        assert!(field.get(7, 8).x > 0.0);
    }

    #[test]
    fn jitter_is_deterministic_per_row() {
        assert_eq!(row_jitter(7, 3, 5.0), row_jitter(7, 3, 5.0));
        assert_ne!(row_jitter(7, 3, 5.0), row_jitter(7, 4, 5.0));
        assert_eq!(row_jitter(7, 3, 0.0), (0.0, 0.0));
        let (x, y) = row_jitter(1, 0, 5.0);
        assert!(x.abs() <= 5.0 && y.abs() <= 5.0);
    }

    #[test]
    fn noise_tilts_every_row() {
        let options = NormalBuildOptions::default().with_noise(10.0, 42);
        assert!(has_rotation(&options));
        let mut a = NormalField::flat(4, 4);
        let mut b = NormalField::flat(4, 4);
        rotate_field(&mut a, &options, 0, &CancellationToken::new()).unwrap();
        rotate_field(&mut b, &options, 0, &CancellationToken::new()).unwrap();
        assert_eq!(a, b);
        assert!((a.get(0, 0) - DVec3::Z).length() > 0.0);
        // One rotation per row.
        assert_eq!(a.get(0, 1), a.get(3, 1));
    }
}
