//! Resampling kernels, looked up by name.
//!
//! Resizing goes through `image::imageops`. Kernels `image` has no filter
//! for resolve to `None`; hosts that carry them plug in their own
//! [`SamplerRegistry`].

use image::imageops::{self, FilterType};
use image::{Luma, Pixel, Rgb, Rgba};
use texpack_spec::SamplerKind;

use crate::buffer::{ImageBuffer, PixelFormat};
use crate::error::TextureError;

/// Resize an 8-bit image, keeping its pixel format.
pub trait Resampler: Send + Sync {
    fn resample(&self, image: &ImageBuffer, width: u32, height: u32) -> Result<ImageBuffer, TextureError>;
}

/// Named kernel lookup.
pub trait SamplerRegistry: Send + Sync {
    /// `None` when this registry does not provide `kind`.
    fn resolve_sampler(&self, kind: SamplerKind) -> Option<&dyn Resampler>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Filter(FilterType),
    /// Block average on reduction.
    Thumbnail,
}

fn resize_as<P>(image: &ImageBuffer, width: u32, height: u32, method: Method) -> Result<ImageBuffer, TextureError>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let view = image::ImageBuffer::<P, &[u8]>::from_raw(image.width, image.height, &image.data)
        .ok_or_else(|| {
            TextureError::InvalidParameter(format!(
                "{}x{} {:?} buffer holds {} bytes",
                image.width,
                image.height,
                image.format,
                image.data.len()
            ))
        })?;
    let resized = match method {
        Method::Filter(filter) => imageops::resize(&view, width, height, filter),
        Method::Thumbnail => imageops::thumbnail(&view, width, height),
    };
    Ok(ImageBuffer {
        width,
        height,
        format: image.format,
        data: resized.into_raw(),
    })
}

fn resize(image: &ImageBuffer, width: u32, height: u32, method: Method) -> Result<ImageBuffer, TextureError> {
    match image.format {
        PixelFormat::Gray8 => resize_as::<Luma<u8>>(image, width, height, method),
        PixelFormat::Rgb8 => resize_as::<Rgb<u8>>(image, width, height, method),
        PixelFormat::Rgba8 => resize_as::<Rgba<u8>>(image, width, height, method),
    }
}

/// One `image` resampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSampler {
    filter: FilterType,
}

impl FilterSampler {
    pub const fn new(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Triangle filter; the fallback for kernels no registry provides.
    pub const fn bilinear() -> Self {
        Self::new(FilterType::Triangle)
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }
}

impl Resampler for FilterSampler {
    fn resample(&self, image: &ImageBuffer, width: u32, height: u32) -> Result<ImageBuffer, TextureError> {
        resize(image, width, height, Method::Filter(self.filter))
    }
}

/// Area average on reduction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxSampler;

impl Resampler for BoxSampler {
    fn resample(&self, image: &ImageBuffer, width: u32, height: u32) -> Result<ImageBuffer, TextureError> {
        resize(image, width, height, Method::Thumbnail)
    }
}

/// Every kernel `image` has a filter for.
///
/// Bicubic shares the Catmull-Rom cubic and spline maps to the Gaussian.
/// Hermite, Welch and Lanczos 2/5/8 resolve to `None`.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinSamplers {
    nearest: FilterSampler,
    boxed: BoxSampler,
    bilinear: FilterSampler,
    catmull_rom: FilterSampler,
    gaussian: FilterSampler,
    lanczos3: FilterSampler,
}

impl BuiltinSamplers {
    pub fn new() -> Self {
        Self {
            nearest: FilterSampler::new(FilterType::Nearest),
            boxed: BoxSampler,
            bilinear: FilterSampler::bilinear(),
            catmull_rom: FilterSampler::new(FilterType::CatmullRom),
            gaussian: FilterSampler::new(FilterType::Gaussian),
            lanczos3: FilterSampler::new(FilterType::Lanczos3),
        }
    }
}

impl Default for BuiltinSamplers {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerRegistry for BuiltinSamplers {
    fn resolve_sampler(&self, kind: SamplerKind) -> Option<&dyn Resampler> {
        match kind {
            SamplerKind::Nearest => Some(&self.nearest),
            SamplerKind::Box => Some(&self.boxed),
            SamplerKind::Bilinear => Some(&self.bilinear),
            SamplerKind::Bicubic | SamplerKind::CatmullRom => Some(&self.catmull_rom),
            SamplerKind::Spline => Some(&self.gaussian),
            SamplerKind::Lanczos3 => Some(&self.lanczos3),
            SamplerKind::Hermite
            | SamplerKind::Welch
            | SamplerKind::Lanczos2
            | SamplerKind::Lanczos5
            | SamplerKind::Lanczos8 => None,
        }
    }
}
