//! Normal map generation from a height field.
//!
//! Each frame runs through the same stages: differentiate, optionally blend
//! with a low-frequency copy, optionally rotate, then encode. Frames are
//! independent, so kernels never read across a frame boundary.

use glam::DVec3;
use texpack_spec::{NormalBuildOptions, NormalEncoding, NormalMethod};

use crate::buffer::{GrayscaleBuffer, ImageBuffer, PixelFormat};
use crate::cancel::CancellationToken;
use crate::error::TextureError;
use crate::height::HeightField;

pub mod encoding;
pub mod frequency;
pub mod kernel;
pub mod magnitude;
pub mod rotation;


use encoding::{encode_normal, pack};
use kernel::{differentiate, SobelKernel};

/// Pipeline stage, logged as each one finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalStage {
    Differentiated,
    FrequencyBlended,
    Rotated,
    Encoded,
}

/// One unit normal per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalField {
    pub width: u32,
    pub height: u32,
    pub data: Vec<DVec3>,
}

impl NormalField {
    /// Every normal pointing straight out.
    pub fn flat(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![DVec3::Z; (width * height) as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> DVec3 {
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, n: DVec3) {
        self.data[(y * self.width + x) as usize] = n;
    }

    /// Encode into rows `row_offset..` of an RGB image.
    pub fn write_into(
        &self,
        image: &mut ImageBuffer,
        row_offset: u32,
        encoding: NormalEncoding,
    ) -> Result<(), TextureError> {
        for y in 0..self.height {
            for x in 0..self.width {
                let [r, g, b] = pack(encode_normal(self.get(x, y), encoding)?);
                image.set_pixel(x, row_offset + y, [r, g, b, 255]);
            }
        }
        Ok(())
    }
}

fn check_options(options: &NormalBuildOptions) -> Result<(), TextureError> {
    if !options.encoding.is_supported() {
        return Err(TextureError::UnsupportedEncoding(format!(
            "{:?} normal encoding",
            options.encoding
        )));
    }
    options
        .validate()
        .map_err(|e| TextureError::InvalidParameter(e.message))
}

/// Normals for one frame, before encoding.
pub fn build_frame_normals(
    plane: &GrayscaleBuffer,
    kernel: &SobelKernel,
    options: &NormalBuildOptions,
    row_offset: u32,
    cancel: &CancellationToken,
) -> Result<NormalField, TextureError> {
    let mut field = differentiate(
        plane,
        kernel,
        options.method,
        options.strength,
        options.wrap_x,
        options.wrap_y,
        cancel,
    )?;
    tracing::debug!(stage = ?NormalStage::Differentiated, row_offset, "normal stage");

    if options.method == NormalMethod::Variance {
        let low_height = frequency::low_frequency_height(
            plane,
            options.low_frequency_downsample,
            options.blur_sigma,
            options.wrap_x,
            options.wrap_y,
        );
        let low = differentiate(
            &low_height,
            kernel,
            NormalMethod::Sobel,
            options.strength,
            options.wrap_x,
            options.wrap_y,
            cancel,
        )?;
        field = frequency::blend_frequencies(
            &field,
            &low,
            plane,
            &low_height,
            options.variance_strength,
            cancel,
        )?;
        tracing::debug!(stage = ?NormalStage::FrequencyBlended, row_offset, "normal stage");
    }

    if rotation::has_rotation(options) {
        rotation::rotate_field(&mut field, options, row_offset, cancel)?;
        tracing::debug!(stage = ?NormalStage::Rotated, row_offset, "normal stage");
    }

    Ok(field)
}

/// Unit normals covering every frame of `height`, stacked like the frames.
///
/// Options are validated before any pixel is produced; an octahedron
/// encoding fails with [`TextureError::UnsupportedEncoding`].
pub fn generate_normal_field(
    height: &HeightField,
    options: &NormalBuildOptions,
    cancel: &CancellationToken,
) -> Result<NormalField, TextureError> {
    check_options(options)?;
    let kernel = SobelKernel::new(options.kernel_size)?;
    let mut data = Vec::with_capacity((height.width() * height.height()) as usize);

    for frame in 0..height.frames {
        cancel.check()?;
        let offset = height.frame_offset(frame);
        let field = build_frame_normals(&height.frame_plane(frame), &kernel, options, offset, cancel)?;
        data.extend(field.data);
    }

    Ok(NormalField {
        width: height.width(),
        height: height.height(),
        data,
    })
}

/// Pack a field into an RGB image with `encoding`.
pub fn encode_normal_field(
    field: &NormalField,
    encoding: NormalEncoding,
) -> Result<ImageBuffer, TextureError> {
    let mut image = ImageBuffer::new(field.width, field.height, PixelFormat::Rgb8);
    field.write_into(&mut image, 0, encoding)?;
    tracing::debug!(stage = ?NormalStage::Encoded, ?encoding, "normal stage");
    Ok(image)
}

/// Generate an RGB normal map covering every frame of `height`.
pub fn generate_normal_map(
    height: &HeightField,
    options: &NormalBuildOptions,
    cancel: &CancellationToken,
) -> Result<ImageBuffer, TextureError> {
    let field = generate_normal_field(height, options, cancel)?;
    encode_normal_field(&field, options.encoding)
}
