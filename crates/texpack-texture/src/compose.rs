//! Image composition.
//!
//! Executes a [`CompositionPlan`]: start from the per-slot defaults, write
//! constants, overlay every source pass row by row, then run the normal Z
//! reconstruction and magnitude post-passes and narrow to the plan's format.
//!
//! The destination is a work buffer of five bytes per pixel (RGBA plus the
//! magnitude plane). Rows are independent, so each pass runs row-parallel;
//! passes themselves run one after the other.

use std::collections::HashMap;

use glam::DVec3;
use rayon::prelude::*;
use texpack_spec::{ColorChannel, TextureTag};

use crate::buffer::ImageBuffer;
use crate::cancel::CancellationToken;
use crate::error::TextureError;
use crate::normal_map::magnitude::{apply_magnitude, pixel_magnitude};
use crate::resolve::{CompositionPlan, MagnitudeApplication, NormalZReconstruction, PlannedWrite};

const WORK_CHANNELS: usize = 5;

/// Source images by tag, all at the build's target size.
pub type SourceImages = HashMap<TextureTag, ImageBuffer>;

/// Byte a write reads from an RGBA source pixel.
fn read_source(rgba: [u8; 4], color: ColorChannel) -> u8 {
    match color {
        ColorChannel::Magnitude => (pixel_magnitude(rgba).clamp(0.0, 1.0) * 255.0).round() as u8,
        other => other.index().map_or(0, |i| rgba[i]),
    }
}

/// Overlay one source byte onto a work pixel.
///
/// Out-of-range source bytes leave the pixel alone. A value that had to be
/// clamped does not overwrite a slot that already holds a non-zero byte.
fn overlay(pixel: &mut [u8], write: &PlannedWrite, byte: u8) {
    let Some(value) = write.mapping.unmap(byte) else {
        return;
    };
    let value = write.derivation.apply_value(value);
    let remapped = write.mapping.remap(write.mapping.adjust(value));
    if pixel[write.target] != 0 && !remapped.in_range {
        return;
    }
    pixel[write.target] = write.derivation.apply_byte(remapped.value);
}

fn reconstruct_z(pixel: &mut [u8], r: &NormalZReconstruction) {
    let x = r.x.side.decode(pixel[r.x.slot]);
    let y = r.y.side.decode(pixel[r.y.slot]);
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();
    pixel[r.z.slot] = r.z.side.encode(z);
}

fn scale_by_magnitude(pixel: &mut [u8], m: &MagnitudeApplication) {
    let normal = DVec3::new(
        m.x.side.decode(pixel[m.x.slot]),
        m.y.side.decode(pixel[m.y.slot]),
        m.z.side.decode(pixel[m.z.slot]),
    );
    let magnitude = m.magnitude.decode(pixel[crate::resolve::MAGNITUDE_SLOT]);
    let scaled = apply_magnitude(normal, magnitude);
    pixel[m.x.slot] = m.x.side.encode(scaled.x);
    pixel[m.y.slot] = m.y.side.encode(scaled.y);
    pixel[m.z.slot] = m.z.side.encode(scaled.z);
}

/// Run `f` on every work pixel, one rayon task per row.
fn for_each_pixel<F>(
    work: &mut [u8],
    width: usize,
    cancel: &CancellationToken,
    f: F,
) -> Result<(), TextureError>
where
    F: Fn(usize, usize, &mut [u8]) + Sync,
{
    work.par_chunks_mut(width * WORK_CHANNELS)
        .enumerate()
        .try_for_each(|(y, row)| {
            cancel.check()?;
            for (x, pixel) in row.chunks_mut(WORK_CHANNELS).enumerate() {
                f(x, y, pixel);
            }
            Ok(())
        })
}

/// Compose one output texture.
pub fn compose(
    plan: &CompositionPlan,
    sources: &SourceImages,
    width: u32,
    height: u32,
    cancel: &CancellationToken,
) -> Result<ImageBuffer, TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::InvalidParameter(format!(
            "cannot compose '{}' at {}x{}",
            plan.tag, width, height
        )));
    }
    let w = width as usize;
    let mut work = vec![0u8; w * height as usize * WORK_CHANNELS];

    for_each_pixel(&mut work, w, cancel, |_, _, pixel| {
        pixel.copy_from_slice(&plan.defaults);
        for &(slot, byte) in &plan.constants {
            pixel[slot] = byte;
        }
    })?;

    for pass in &plan.passes {
        let source = sources
            .get(&pass.tag)
            .ok_or_else(|| TextureError::MissingSource(pass.tag.to_string()))?;
        if source.width != width || source.height != height {
            return Err(TextureError::InvalidParameter(format!(
                "source '{}' is {}x{}, expected {}x{}",
                pass.tag, source.width, source.height, width, height
            )));
        }
        tracing::trace!(source = %pass.tag, writes = pass.writes.len(), "overlay pass");

        for_each_pixel(&mut work, w, cancel, |x, y, pixel| {
            let rgba = source.pixel(x as u32, y as u32);
            for write in &pass.writes {
                overlay(pixel, write, read_source(rgba, write.source_color));
            }
        })?;
    }

    if let Some(reconstruction) = &plan.reconstruct_z {
        for_each_pixel(&mut work, w, cancel, |_, _, pixel| {
            reconstruct_z(pixel, reconstruction)
        })?;
    }

    if let Some(magnitude) = &plan.magnitude {
        for_each_pixel(&mut work, w, cancel, |_, _, pixel| {
            scale_by_magnitude(pixel, magnitude)
        })?;
    }

    let channels = plan.format.channels();
    let data: Vec<u8> = work
        .chunks(WORK_CHANNELS)
        .flat_map(|pixel| pixel[..channels].iter().copied())
        .collect();

    Ok(ImageBuffer {
        width,
        height,
        format: plan.format,
        data,
    })
}
