//! Deterministic PNG reader and writer.
//!
//! Uses fixed compression settings so the same buffer always encodes to
//! byte-identical output.

use std::io::{Read, Write};
use std::path::Path;

use png::{BitDepth, ColorType, Compression, Decoder, Encoder, FilterType, Transformations};
use thiserror::Error;

use crate::buffer::{Gray16Buffer, ImageBuffer, PixelFormat};

/// Errors from PNG operations.
#[derive(Debug, Error)]
pub enum PngError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding error: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("PNG decoding error: {0}")]
    Decoding(#[from] png::DecodingError),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Unsupported PNG layout: {0}")]
    UnsupportedFormat(String),
}

/// PNG export configuration for deterministic output.
#[derive(Debug, Clone)]
pub struct PngConfig {
    pub compression: Compression,
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            filter: FilterType::NoFilter,
        }
    }
}

impl PngConfig {
    /// Smaller files, slower.
    pub fn best_compression() -> Self {
        Self {
            compression: Compression::Best,
            filter: FilterType::Paeth,
        }
    }

    /// Faster, larger files.
    pub fn fast() -> Self {
        Self {
            compression: Compression::Fast,
            filter: FilterType::NoFilter,
        }
    }
}

fn color_type(format: PixelFormat) -> ColorType {
    match format {
        PixelFormat::Gray8 => ColorType::Grayscale,
        PixelFormat::Rgb8 => ColorType::Rgb,
        PixelFormat::Rgba8 => ColorType::Rgba,
    }
}

fn check_dimensions(width: u32, height: u32, got: usize, per_pixel: usize) -> Result<(), PngError> {
    let expected = width as usize * height as usize * per_pixel;
    if width == 0 || height == 0 || got != expected {
        return Err(PngError::InvalidDimensions(format!(
            "expected {} bytes for {}x{}, got {}",
            expected, width, height, got
        )));
    }
    Ok(())
}

/// Write an 8-bit image to any writer.
pub fn write_image_to_writer<W: Write>(
    image: &ImageBuffer,
    writer: W,
    config: &PngConfig,
) -> Result<(), PngError> {
    check_dimensions(image.width, image.height, image.data.len(), image.format.channels())?;
    let mut encoder = Encoder::new(writer, image.width, image.height);
    encoder.set_color(color_type(image.format));
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&image.data)?;
    Ok(())
}

/// Write an 8-bit image to a PNG file.
pub fn write_image(image: &ImageBuffer, path: &Path, config: &PngConfig) -> Result<(), PngError> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    write_image_to_writer(image, writer, config)
}

/// Write to a `Vec<u8>` and return the hash.
pub fn write_image_to_vec_with_hash(
    image: &ImageBuffer,
    config: &PngConfig,
) -> Result<(Vec<u8>, String), PngError> {
    let mut data = Vec::new();
    write_image_to_writer(image, &mut data, config)?;
    let hash = hash_png(&data);
    Ok((data, hash))
}

/// Write a 16-bit grayscale buffer to any writer.
pub fn write_gray16_to_writer<W: Write>(
    buffer: &Gray16Buffer,
    writer: W,
    config: &PngConfig,
) -> Result<(), PngError> {
    check_dimensions(buffer.width, buffer.height, buffer.data.len(), 1)?;
    let mut encoder = Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(ColorType::Grayscale);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&buffer.to_be_bytes())?;
    Ok(())
}

/// Write a 16-bit buffer to a `Vec<u8>` and return the hash.
pub fn write_gray16_to_vec_with_hash(
    buffer: &Gray16Buffer,
    config: &PngConfig,
) -> Result<(Vec<u8>, String), PngError> {
    let mut data = Vec::new();
    write_gray16_to_writer(buffer, &mut data, config)?;
    let hash = hash_png(&data);
    Ok((data, hash))
}

/// Compute the BLAKE3 hash of PNG data.
pub fn hash_png(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Decode any PNG into an 8-bit image.
///
/// Palette and low bit depth images are expanded, 16-bit samples are
/// truncated to 8 bits and gray with alpha becomes RGBA.
pub fn read_image<R: Read>(reader: R) -> Result<ImageBuffer, PngError> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());

    let (format, data) = match info.color_type {
        ColorType::Grayscale => (PixelFormat::Gray8, buf),
        ColorType::Rgb => (PixelFormat::Rgb8, buf),
        ColorType::Rgba => (PixelFormat::Rgba8, buf),
        ColorType::GrayscaleAlpha => {
            let data = buf
                .chunks_exact(2)
                .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
                .collect();
            (PixelFormat::Rgba8, data)
        }
        other => {
            return Err(PngError::UnsupportedFormat(format!("{:?}", other)));
        }
    };
    ImageBuffer::from_raw(info.width, info.height, format, data).ok_or_else(|| {
        PngError::InvalidDimensions(format!("{}x{} {:?}", info.width, info.height, format))
    })
}

/// Decode PNG bytes held in memory.
pub fn decode_png(data: &[u8]) -> Result<ImageBuffer, PngError> {
    read_image(data)
}
