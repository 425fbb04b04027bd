//! Pixel value mapping.
//!
//! Converts a stored byte of one channel encoding into the byte of another,
//! passing through value space:
//!
//! 1. **unmap**: undo the input cyclic shift, discard bytes outside the input
//!    pixel range, rescale to the value range, apply invert, undo power;
//! 2. **common stage**: `v' = (v + value_shift) * value_scale`;
//! 3. **remap**: apply power, apply invert, rescale to the output pixel
//!    range, round, clamp, apply the output cyclic shift.
//!
//! Power is applied to the value normalized over its range, so the
//! transform stays inside the declared bounds.

use texpack_spec::EncodingChannelSpec;

/// Rotate `byte` by `shift` within `[min, max]`. Bytes outside the range and
/// empty ranges are returned unchanged.
pub fn cycle_byte(byte: u8, min: u8, max: u8, shift: i32) -> u8 {
    if shift == 0 || min >= max || byte < min || byte > max {
        return byte;
    }
    let span = i32::from(max) - i32::from(min) + 1;
    let offset = (i32::from(byte) - i32::from(min) + shift).rem_euclid(span);
    (i32::from(min) + offset) as u8
}

/// One side (input or output) of a [`PixelMapping`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingSide {
    pub range_min: u8,
    pub range_max: u8,
    pub value_min: f64,
    pub value_max: f64,
    pub shift: i32,
    pub power: f64,
    pub invert: bool,
}

impl Default for MappingSide {
    fn default() -> Self {
        Self {
            range_min: 0,
            range_max: 255,
            value_min: 0.0,
            value_max: 1.0,
            shift: 0,
            power: 1.0,
            invert: false,
        }
    }
}

impl MappingSide {
    pub fn from_spec(spec: &EncodingChannelSpec) -> Self {
        Self {
            range_min: spec.range_min,
            range_max: spec.range_max,
            value_min: spec.min_value,
            value_max: spec.max_value,
            shift: spec.shift,
            power: spec.power,
            invert: spec.invert,
        }
    }

    fn pixel_span(&self) -> f64 {
        f64::from(self.range_max) - f64::from(self.range_min)
    }

    fn value_span(&self) -> f64 {
        self.value_max - self.value_min
    }

    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        byte >= self.range_min && byte <= self.range_max
    }

    /// Byte to value; `None` when the byte is outside the pixel range.
    pub fn unmap(&self, byte: u8) -> Option<f64> {
        let byte = cycle_byte(byte, self.range_min, self.range_max, -self.shift);
        if !self.contains(byte) {
            return None;
        }
        Some(self.decode_in_range(byte))
    }

    /// Byte to value, clamping out-of-range bytes onto the range instead of
    /// discarding them.
    pub fn decode(&self, byte: u8) -> f64 {
        let byte = cycle_byte(byte, self.range_min, self.range_max, -self.shift);
        self.decode_in_range(byte.clamp(self.range_min, self.range_max.max(self.range_min)))
    }

    fn decode_in_range(&self, byte: u8) -> f64 {
        let pixel_span = self.pixel_span();
        let mut t = if pixel_span > 0.0 {
            (f64::from(byte) - f64::from(self.range_min)) / pixel_span
        } else {
            0.0
        };
        if self.invert {
            t = 1.0 - t;
        }
        if self.power != 1.0 {
            t = t.max(0.0).powf(1.0 / self.power);
        }
        self.value_min + t * self.value_span()
    }

    /// Value to byte.
    pub fn remap(&self, value: f64) -> RemappedByte {
        let value_span = self.value_span();
        let mut t = if value_span != 0.0 {
            (value - self.value_min) / value_span
        } else {
            0.0
        };
        if self.power != 1.0 {
            t = t.max(0.0).powf(self.power);
        }
        if self.invert {
            t = 1.0 - t;
        }
        let raw = (f64::from(self.range_min) + t * self.pixel_span()).round();
        let in_range = raw >= f64::from(self.range_min) && raw <= f64::from(self.range_max);
        let clamped = raw.clamp(f64::from(self.range_min), f64::from(self.range_max)) as u8;
        RemappedByte {
            value: cycle_byte(clamped, self.range_min, self.range_max, self.shift),
            in_range,
        }
    }

    /// Value to byte, ignoring whether it had to be clamped.
    pub fn encode(&self, value: f64) -> u8 {
        self.remap(value).value
    }
}

/// Result of [`MappingSide::remap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemappedByte {
    /// Final byte, clamped and shifted.
    pub value: u8,
    /// False when the unclamped value fell outside the pixel range.
    pub in_range: bool,
}

/// Fully resolved numeric contract for one channel copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMapping {
    pub input: MappingSide,
    pub output: MappingSide,
    pub value_shift: f64,
    pub value_scale: f64,
}

impl Default for PixelMapping {
    fn default() -> Self {
        Self {
            input: MappingSide::default(),
            output: MappingSide::default(),
            value_shift: 0.0,
            value_scale: 1.0,
        }
    }
}

impl PixelMapping {
    /// Mapping from a source channel encoding to a destination one.
    pub fn between(input: &EncodingChannelSpec, output: &EncodingChannelSpec) -> Self {
        Self {
            input: MappingSide::from_spec(input),
            output: MappingSide::from_spec(output),
            value_shift: 0.0,
            value_scale: 1.0,
        }
    }

    pub fn with_adjustment(mut self, shift: f64, scale: f64) -> Self {
        self.value_shift = shift;
        self.value_scale = scale;
        self
    }

    #[inline]
    pub fn unmap(&self, byte: u8) -> Option<f64> {
        self.input.unmap(byte)
    }

    /// The common stage.
    #[inline]
    pub fn adjust(&self, value: f64) -> f64 {
        (value + self.value_shift) * self.value_scale
    }

    #[inline]
    pub fn remap(&self, value: f64) -> RemappedByte {
        self.output.remap(value)
    }

    /// Whole pipeline; `None` when the source byte is discarded.
    pub fn map(&self, byte: u8) -> Option<u8> {
        self.unmap(byte)
            .map(|v| self.remap(self.adjust(v)).value)
    }
}
