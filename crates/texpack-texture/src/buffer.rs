//! Image buffers.
//!
//! A closed set of concrete layouts: 8-bit images with one, three or four
//! channels, a 16-bit single-channel plane for height export, and an `f64`
//! working plane used by the generators.

use texpack_spec::ColorChannel;

/// Layout of an 8-bit [`ImageBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    /// Smallest layout holding every mapped slot: alpha forces RGBA, anything
    /// beyond red forces RGB, red alone (or nothing) stays single-channel.
    pub fn for_channels(slots: &[ColorChannel]) -> PixelFormat {
        if slots.contains(&ColorChannel::Alpha) {
            PixelFormat::Rgba8
        } else if slots
            .iter()
            .any(|s| matches!(s, ColorChannel::Green | ColorChannel::Blue))
        {
            PixelFormat::Rgb8
        } else {
            PixelFormat::Gray8
        }
    }
}

/// An 8-bit image, row-major, interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl ImageBuffer {
    /// Create an image with every byte zero.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0; width as usize * height as usize * format.channels()],
        }
    }

    /// Create an image with every pixel set to `rgba` (truncated to the layout).
    pub fn filled(width: u32, height: u32, format: PixelFormat, rgba: [u8; 4]) -> Self {
        let pixel = &rgba[..format.channels()];
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * format.channels())
            .collect();
        Self {
            width,
            height,
            format,
            data,
        }
    }

    /// Wrap raw bytes; `None` when the length does not match the layout.
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * format.channels() {
            return None;
        }
        Some(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Bytes in one row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.channels()
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.format.channels()
    }

    /// The pixel expanded to RGBA: gray replicates into R, G and B, missing
    /// alpha reads as opaque.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        match self.format {
            PixelFormat::Gray8 => {
                let g = self.data[i];
                [g, g, g, 255]
            }
            PixelFormat::Rgb8 => [self.data[i], self.data[i + 1], self.data[i + 2], 255],
            PixelFormat::Rgba8 => [
                self.data[i],
                self.data[i + 1],
                self.data[i + 2],
                self.data[i + 3],
            ],
        }
    }

    /// Store an RGBA pixel, dropping whatever the layout cannot hold.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        let n = self.format.channels();
        self.data[i..i + n].copy_from_slice(&rgba[..n]);
    }

    /// Byte in one RGBA slot (`index()` of a [`ColorChannel`]).
    #[inline]
    pub fn get(&self, x: u32, y: u32, slot: usize) -> u8 {
        self.pixel(x, y)[slot]
    }

    /// Wrapped access.
    #[inline]
    pub fn get_wrapped(&self, x: i32, y: i32, slot: usize) -> u8 {
        let wx = x.rem_euclid(self.width as i32) as u32;
        let wy = y.rem_euclid(self.height as i32) as u32;
        self.get(wx, wy, slot)
    }

    /// Clamped access.
    #[inline]
    pub fn get_clamped(&self, x: i32, y: i32, slot: usize) -> u8 {
        let cx = x.clamp(0, self.width as i32 - 1) as u32;
        let cy = y.clamp(0, self.height as i32 - 1) as u32;
        self.get(cx, cy, slot)
    }

    /// Clamped access to a whole pixel.
    #[inline]
    pub fn clamped_pixel(&self, x: i32, y: i32) -> [u8; 4] {
        let cx = x.clamp(0, self.width as i32 - 1) as u32;
        let cy = y.clamp(0, self.height as i32 - 1) as u32;
        self.pixel(cx, cy)
    }

    /// Convert to another layout. Narrowing to gray keeps red.
    pub fn to_format(&self, format: PixelFormat) -> ImageBuffer {
        if format == self.format {
            return self.clone();
        }
        let mut out = ImageBuffer::new(self.width, self.height, format);
        for y in 0..self.height {
            for x in 0..self.width {
                out.set_pixel(x, y, self.pixel(x, y));
            }
        }
        out
    }

    /// One slot as a normalized `f64` plane.
    pub fn channel_plane(&self, slot: usize) -> GrayscaleBuffer {
        let mut plane = GrayscaleBuffer::new(self.width, self.height, 0.0);
        for y in 0..self.height {
            for x in 0..self.width {
                plane.set(x, y, f64::from(self.get(x, y, slot)) / 255.0);
            }
        }
        plane
    }

    /// Rows `start..start + rows` as a new image.
    pub fn crop_rows(&self, start: u32, rows: u32) -> ImageBuffer {
        let stride = self.stride();
        let from = start as usize * stride;
        let to = from + rows as usize * stride;
        ImageBuffer {
            width: self.width,
            height: rows,
            format: self.format,
            data: self.data[from..to].to_vec(),
        }
    }
}

/// 16-bit single-channel plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gray16Buffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u16>,
}

impl Gray16Buffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u16 {
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: u16) {
        self.data[(y * self.width + x) as usize] = value;
    }

    /// Narrow to 8 bits with rounding.
    pub fn to_gray8(&self) -> ImageBuffer {
        let data = self
            .data
            .iter()
            .map(|&v| (f64::from(v) / 257.0).round() as u8)
            .collect();
        ImageBuffer {
            width: self.width,
            height: self.height,
            format: PixelFormat::Gray8,
            data,
        }
    }

    /// Big-endian bytes, the order PNG expects for 16-bit samples.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|v| v.to_be_bytes()).collect()
    }
}

/// Grayscale working plane (single channel, nominally 0..1).
#[derive(Debug, Clone, PartialEq)]
pub struct GrayscaleBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data (single channel, row-major).
    pub data: Vec<f64>,
}

impl GrayscaleBuffer {
    /// Create a new grayscale buffer filled with a value.
    pub fn new(width: u32, height: u32, fill: f64) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width as usize * height as usize],
        }
    }

    /// Get a pixel at the given coordinates.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.data[(y * self.width + x) as usize]
    }

    /// Set a pixel at the given coordinates.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f64) {
        self.data[(y * self.width + x) as usize] = value;
    }

    /// Read with per-axis wrap (tiling) or clamp (edge extend).
    #[inline]
    pub fn sample(&self, x: i32, y: i32, wrap_x: bool, wrap_y: bool) -> f64 {
        let sx = if wrap_x {
            x.rem_euclid(self.width as i32)
        } else {
            x.clamp(0, self.width as i32 - 1)
        };
        let sy = if wrap_y {
            y.rem_euclid(self.height as i32)
        } else {
            y.clamp(0, self.height as i32 - 1)
        };
        self.get(sx as u32, sy as u32)
    }

    /// Bilinear read at continuous pixel coordinates (pixel centers at `i + 0.5`).
    pub fn sample_bilinear(&self, fx: f64, fy: f64, wrap_x: bool, wrap_y: bool) -> f64 {
        let x = fx - 0.5;
        let y = fy - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = x - x0;
        let ty = y - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);

        let a = self.sample(x0, y0, wrap_x, wrap_y);
        let b = self.sample(x0 + 1, y0, wrap_x, wrap_y);
        let c = self.sample(x0, y0 + 1, wrap_x, wrap_y);
        let d = self.sample(x0 + 1, y0 + 1, wrap_x, wrap_y);

        let top = a + (b - a) * tx;
        let bottom = c + (d - c) * tx;
        top + (bottom - top) * ty
    }

    /// Rows `start..start + rows` as a new plane.
    pub fn crop_rows(&self, start: u32, rows: u32) -> GrayscaleBuffer {
        let w = self.width as usize;
        let from = start as usize * w;
        GrayscaleBuffer {
            width: self.width,
            height: rows,
            data: self.data[from..from + rows as usize * w].to_vec(),
        }
    }

    /// Convert to 8-bit bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }

    /// Convert to a single-channel 8-bit image.
    pub fn to_gray8(&self) -> ImageBuffer {
        ImageBuffer {
            width: self.width,
            height: self.height,
            format: PixelFormat::Gray8,
            data: self.to_bytes(),
        }
    }

    /// Convert to 16 bits.
    pub fn to_gray16(&self) -> Gray16Buffer {
        Gray16Buffer {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .map(|&v| (v.clamp(0.0, 1.0) * 65535.0).round() as u16)
                .collect(),
        }
    }

    pub fn from_gray16(buffer: &Gray16Buffer) -> Self {
        Self {
            width: buffer.width,
            height: buffer.height,
            data: buffer.data.iter().map(|&v| f64::from(v) / 65535.0).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn format_follows_mapped_slots() {
        use ColorChannel::*;
        assert_eq!(PixelFormat::for_channels(&[Red]), PixelFormat::Gray8);
        assert_eq!(PixelFormat::for_channels(&[]), PixelFormat::Gray8);
        assert_eq!(PixelFormat::for_channels(&[Red, Blue]), PixelFormat::Rgb8);
        assert_eq!(PixelFormat::for_channels(&[Red, Alpha]), PixelFormat::Rgba8);
    }

    #[test]
    fn gray_pixels_expand_to_rgba() {
        let mut img = ImageBuffer::new(2, 1, PixelFormat::Gray8);
        img.set_pixel(1, 0, [40, 50, 60, 70]);
        assert_eq!(img.pixel(1, 0), [40, 40, 40, 255]);
        assert_eq!(img.get(0, 0, 3), 255);
    }

    #[test]
    fn wrapped_and_clamped_access() {
        let mut img = ImageBuffer::new(2, 2, PixelFormat::Rgb8);
        img.set_pixel(0, 0, [1, 0, 0, 0]);
        img.set_pixel(1, 1, [9, 0, 0, 0]);

        assert_eq!(img.get_wrapped(-1, -1, 0), 9);
        assert_eq!(img.get_wrapped(2, 2, 0), 1);
        assert_eq!(img.get_clamped(-5, -5, 0), 1);
        assert_eq!(img.get_clamped(5, 5, 0), 9);
    }

    #[test]
    fn format_conversion_keeps_red_when_narrowing() {
        let img = ImageBuffer::filled(1, 1, PixelFormat::Rgba8, [10, 20, 30, 40]);
        assert_eq!(img.to_format(PixelFormat::Gray8).data, vec![10]);
        assert_eq!(img.to_format(PixelFormat::Rgb8).data, vec![10, 20, 30]);
        let widened = img.to_format(PixelFormat::Gray8).to_format(PixelFormat::Rgba8);
        assert_eq!(widened.data, vec![10, 10, 10, 255]);
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(ImageBuffer::from_raw(2, 2, PixelFormat::Rgb8, vec![0; 12]).is_some());
        assert!(ImageBuffer::from_raw(2, 2, PixelFormat::Rgb8, vec![0; 11]).is_none());
    }

    #[test]
    fn sixteen_bit_round_trip() {
        let mut plane = GrayscaleBuffer::new(3, 1, 0.0);
        plane.set(1, 0, 0.5);
        plane.set(2, 0, 1.0);
        let g16 = plane.to_gray16();
        assert_eq!(g16.data, vec![0, 32768, 65535]);
        assert_eq!(g16.to_gray8().data, vec![0, 128, 255]);
        let back = GrayscaleBuffer::from_gray16(&g16);
        assert!((back.get(1, 0) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn sampling_wraps_or_clamps_per_axis() {
        let mut plane = GrayscaleBuffer::new(2, 2, 0.0);
        plane.set(1, 0, 1.0);
        assert!(approx_eq(plane.sample(-1, 0, true, false), 1.0));
        assert!(approx_eq(plane.sample(-1, 0, false, false), 0.0));
        assert!(approx_eq(plane.sample(1, -1, false, true), 0.0));
        assert!(approx_eq(plane.sample(1, -1, false, false), 1.0));
    }

    #[test]
    fn bilinear_center_is_average() {
        // 0 1
        // 1 0
        let mut plane = GrayscaleBuffer::new(2, 2, 0.0);
        plane.set(1, 0, 1.0);
        plane.set(0, 1, 1.0);
        assert!(approx_eq(plane.sample_bilinear(1.0, 1.0, false, false), 0.5));
        assert!(approx_eq(plane.sample_bilinear(0.5, 0.5, false, false), 0.0));
    }
}
