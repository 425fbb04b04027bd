//! Texture channel encodings.
//!
//! An encoding is an ordered list of [`EncodingChannelSpec`]s. The input
//! encoding says where each semantic channel can be read from; an output
//! encoding says which channels a produced texture must contain and how each
//! is laid out in pixel space.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelId, ColorChannel};

/// Well-known texture tags.
pub mod tags {
    pub const ALBEDO: &str = "albedo";
    pub const HEIGHT: &str = "height";
    pub const NORMAL: &str = "normal";
    pub const OCCLUSION: &str = "occlusion";
    pub const SPECULAR: &str = "specular";
    pub const SMOOTH: &str = "smooth";
    pub const ROUGH: &str = "rough";
    pub const METAL: &str = "metal";
    pub const EMISSIVE: &str = "emissive";
    pub const POROSITY: &str = "porosity";
    pub const SSS: &str = "sss";
}

/// Case-insensitive texture tag ("Albedo" and "albedo" are the same tag).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TextureTag(String);

impl TextureTag {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for TextureTag {
    fn from(value: String) -> Self {
        TextureTag::new(value)
    }
}

impl From<&str> for TextureTag {
    fn from(value: &str) -> Self {
        TextureTag::new(value)
    }
}

impl From<TextureTag> for String {
    fn from(value: TextureTag) -> Self {
        value.0
    }
}

impl fmt::Display for TextureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_max_value() -> f64 {
    1.0
}

fn default_range_max() -> u8 {
    255
}

fn default_power() -> f64 {
    1.0
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

/// One wanted or available channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncodingChannelSpec {
    /// Logical channel identity.
    pub id: ChannelId,
    /// Source or destination texture tag.
    #[serde(default)]
    pub texture: TextureTag,
    /// Pixel color slot the channel lives in.
    #[serde(default)]
    pub color: ColorChannel,
    /// Literal value (value space). When set on an output channel it wins
    /// over every texture-derived source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Value-space minimum.
    #[serde(default)]
    pub min_value: f64,
    /// Value-space maximum.
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    /// Pixel-space minimum byte.
    #[serde(default)]
    pub range_min: u8,
    /// Pixel-space maximum byte.
    #[serde(default = "default_range_max")]
    pub range_max: u8,
    /// Cyclic byte rotation within the pixel range.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub shift: i32,
    /// Gamma-like power applied in normalized value space.
    #[serde(default = "default_power")]
    pub power: f64,
    /// Whether the stored value is inverted within the value range.
    #[serde(default)]
    pub invert: bool,
    /// Resampling kernel used when this channel's texture must be resized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler: Option<String>,
}

impl EncodingChannelSpec {
    /// Creates a full-range channel spec stored in `color` of `texture`.
    pub fn new(id: ChannelId, texture: impl Into<TextureTag>, color: ColorChannel) -> Self {
        Self {
            id,
            texture: texture.into(),
            color,
            value: None,
            min_value: 0.0,
            max_value: 1.0,
            range_min: 0,
            range_max: 255,
            shift: 0,
            power: 1.0,
            invert: false,
            sampler: None,
        }
    }

    /// Creates an output channel that is always written with a literal value.
    pub fn literal(id: ChannelId, texture: impl Into<TextureTag>, color: ColorChannel, value: f64) -> Self {
        Self::new(id, texture, color).with_value(value)
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_value_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    pub fn with_pixel_range(mut self, min: u8, max: u8) -> Self {
        self.range_min = min;
        self.range_max = max;
        self
    }

    pub fn with_shift(mut self, shift: i32) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn with_sampler(mut self, sampler: impl Into<String>) -> Self {
        self.sampler = Some(sampler.into());
        self
    }

    /// True when the channel occupies a real or virtual pixel slot.
    pub fn has_color(&self) -> bool {
        self.color != ColorChannel::None
    }

    /// Width of the pixel range in bytes.
    pub fn pixel_span(&self) -> f64 {
        f64::from(self.range_max) - f64::from(self.range_min)
    }

    /// Width of the value range.
    pub fn value_span(&self) -> f64 {
        self.max_value - self.min_value
    }
}

/// Ordered list of channel specs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureEncoding {
    pub channels: Vec<EncodingChannelSpec>,
}

impl TextureEncoding {
    pub fn new(channels: Vec<EncodingChannelSpec>) -> Self {
        Self { channels }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EncodingChannelSpec> {
        self.channels.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// First channel spec with the given identity.
    pub fn find(&self, id: ChannelId) -> Option<&EncodingChannelSpec> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// First channel spec with the given identity that is actually stored
    /// somewhere (has a texture tag and a color slot).
    pub fn find_mapped(&self, id: ChannelId) -> Option<&EncodingChannelSpec> {
        self.channels
            .iter()
            .find(|c| c.id == id && c.has_color() && !c.texture.is_empty())
    }

    /// Whether any channel is stored in `tag`.
    pub fn uses_tag(&self, tag: &TextureTag) -> bool {
        self.channels.iter().any(|c| &c.texture == tag)
    }

    /// Distinct texture tags, in first-seen order.
    pub fn tags(&self) -> Vec<TextureTag> {
        let mut tags: Vec<TextureTag> = Vec::new();
        for channel in &self.channels {
            if !channel.texture.is_empty() && !tags.contains(&channel.texture) {
                tags.push(channel.texture.clone());
            }
        }
        tags
    }

    /// Returns a copy of this encoding with every channel stored in `from`
    /// moved to `to`.
    pub fn retagged(&self, from: &TextureTag, to: &TextureTag) -> TextureEncoding {
        let channels = self
            .channels
            .iter()
            .map(|c| {
                let mut c = c.clone();
                if &c.texture == from {
                    c.texture = to.clone();
                }
                c
            })
            .collect();
        TextureEncoding { channels }
    }
}

impl<'a> IntoIterator for &'a TextureEncoding {
    type Item = &'a EncodingChannelSpec;
    type IntoIter = std::slice::Iter<'a, EncodingChannelSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.channels.iter()
    }
}

impl FromIterator<EncodingChannelSpec> for TextureEncoding {
    fn from_iter<T: IntoIterator<Item = EncodingChannelSpec>>(iter: T) -> Self {
        TextureEncoding {
            channels: iter.into_iter().collect(),
        }
    }
}

/// Standard tangent-space normal layout: X in red, Y in green, Z in blue,
/// value range -1..1.
pub fn standard_normal_encoding(tag: impl Into<TextureTag>) -> TextureEncoding {
    let tag = tag.into();
    TextureEncoding::new(vec![
        EncodingChannelSpec::new(ChannelId::NormalX, tag.clone(), ColorChannel::Red)
            .with_value_range(-1.0, 1.0),
        EncodingChannelSpec::new(ChannelId::NormalY, tag.clone(), ColorChannel::Green)
            .with_value_range(-1.0, 1.0),
        EncodingChannelSpec::new(ChannelId::NormalZ, tag, ColorChannel::Blue)
            .with_value_range(-1.0, 1.0),
    ])
}
