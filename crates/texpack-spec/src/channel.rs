//! Channel identities.
//!
//! Configuration files name channels with free-form strings ("normal-z",
//! "Normal_Z", "NORMALZ"). They are parsed exactly once, here, into closed
//! enums; everything downstream dispatches on the enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logical channel identity: the semantic quantity a texture channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChannelId {
    AlbedoR,
    AlbedoG,
    AlbedoB,
    Opacity,
    Height,
    /// Inverse of height (`1 - height`).
    Depth,
    NormalX,
    NormalY,
    NormalZ,
    Occlusion,
    /// Inverse of occlusion (`1 - occlusion`).
    Cavity,
    Smooth,
    PerceptualSmooth,
    Rough,
    Metal,
    F0,
    Hcm,
    Porosity,
    Sss,
    PorositySss,
    Emissive,
    EmissiveClipped,
    EmissiveInverse,
    ColorR,
    ColorG,
    ColorB,
    Magnitude,
}

impl ChannelId {
    /// All channel identities, in declaration order.
    pub const ALL: [ChannelId; 27] = [
        ChannelId::AlbedoR,
        ChannelId::AlbedoG,
        ChannelId::AlbedoB,
        ChannelId::Opacity,
        ChannelId::Height,
        ChannelId::Depth,
        ChannelId::NormalX,
        ChannelId::NormalY,
        ChannelId::NormalZ,
        ChannelId::Occlusion,
        ChannelId::Cavity,
        ChannelId::Smooth,
        ChannelId::PerceptualSmooth,
        ChannelId::Rough,
        ChannelId::Metal,
        ChannelId::F0,
        ChannelId::Hcm,
        ChannelId::Porosity,
        ChannelId::Sss,
        ChannelId::PorositySss,
        ChannelId::Emissive,
        ChannelId::EmissiveClipped,
        ChannelId::EmissiveInverse,
        ChannelId::ColorR,
        ChannelId::ColorG,
        ChannelId::ColorB,
        ChannelId::Magnitude,
    ];

    /// Canonical configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            ChannelId::AlbedoR => "albedo-r",
            ChannelId::AlbedoG => "albedo-g",
            ChannelId::AlbedoB => "albedo-b",
            ChannelId::Opacity => "opacity",
            ChannelId::Height => "height",
            ChannelId::Depth => "depth",
            ChannelId::NormalX => "normal-x",
            ChannelId::NormalY => "normal-y",
            ChannelId::NormalZ => "normal-z",
            ChannelId::Occlusion => "occlusion",
            ChannelId::Cavity => "cavity",
            ChannelId::Smooth => "smooth",
            ChannelId::PerceptualSmooth => "perceptual-smooth",
            ChannelId::Rough => "rough",
            ChannelId::Metal => "metal",
            ChannelId::F0 => "f0",
            ChannelId::Hcm => "hcm",
            ChannelId::Porosity => "porosity",
            ChannelId::Sss => "sss",
            ChannelId::PorositySss => "porosity-sss",
            ChannelId::Emissive => "emissive",
            ChannelId::EmissiveClipped => "emissive-clipped",
            ChannelId::EmissiveInverse => "emissive-inverse",
            ChannelId::ColorR => "color-r",
            ChannelId::ColorG => "color-g",
            ChannelId::ColorB => "color-b",
            ChannelId::Magnitude => "magnitude",
        }
    }

    /// Byte an unresolved channel is left at.
    pub fn default_byte(&self) -> u8 {
        match self {
            ChannelId::Opacity => 255,
            _ => 0,
        }
    }

    /// True for the three normal vector components.
    pub fn is_normal(&self) -> bool {
        matches!(self, ChannelId::NormalX | ChannelId::NormalY | ChannelId::NormalZ)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a channel or color name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} name '{name}'")]
pub struct ParseChannelError {
    pub kind: &'static str,
    pub name: String,
}

/// Case-folds a name and drops separators so "Normal_Z", "normal-z" and
/// "NORMALZ" compare equal.
fn fold_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' ' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for ChannelId {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = fold_name(s);
        ChannelId::ALL
            .iter()
            .copied()
            .find(|id| fold_name(id.name()) == folded)
            .ok_or_else(|| ParseChannelError {
                kind: "channel",
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for ChannelId {
    type Error = ParseChannelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelId> for String {
    fn from(value: ChannelId) -> Self {
        value.name().to_string()
    }
}

/// Pixel color slot a channel is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
    Alpha,
    /// Length of the RGB vector (normal maps).
    Magnitude,
    #[default]
    None,
}

impl ColorChannel {
    /// Index into an RGBA pixel, or `None` for the virtual slots.
    pub fn index(&self) -> Option<usize> {
        match self {
            ColorChannel::Red => Some(0),
            ColorChannel::Green => Some(1),
            ColorChannel::Blue => Some(2),
            ColorChannel::Alpha => Some(3),
            ColorChannel::Magnitude | ColorChannel::None => None,
        }
    }

    /// Byte a freshly created pixel holds in this slot.
    pub fn default_byte(&self) -> u8 {
        match self {
            ColorChannel::Alpha => 255,
            _ => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorChannel::Red => "red",
            ColorChannel::Green => "green",
            ColorChannel::Blue => "blue",
            ColorChannel::Alpha => "alpha",
            ColorChannel::Magnitude => "magnitude",
            ColorChannel::None => "none",
        }
    }
}

impl fmt::Display for ColorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorChannel {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_name(s).as_str() {
            "r" | "red" => Ok(ColorChannel::Red),
            "g" | "green" => Ok(ColorChannel::Green),
            "b" | "blue" => Ok(ColorChannel::Blue),
            "a" | "alpha" => Ok(ColorChannel::Alpha),
            "m" | "magnitude" => Ok(ColorChannel::Magnitude),
            "" | "none" => Ok(ColorChannel::None),
            _ => Err(ParseChannelError {
                kind: "color",
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ColorChannel {
    type Error = ParseChannelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColorChannel> for String {
    fn from(value: ColorChannel) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_channel_names_case_insensitively() {
        assert_eq!("normal-z".parse::<ChannelId>().unwrap(), ChannelId::NormalZ);
        assert_eq!("Normal_Z".parse::<ChannelId>().unwrap(), ChannelId::NormalZ);
        assert_eq!("NORMALZ".parse::<ChannelId>().unwrap(), ChannelId::NormalZ);
        assert_eq!(
            "Porosity-SSS".parse::<ChannelId>().unwrap(),
            ChannelId::PorositySss
        );
        assert!("normal-w".parse::<ChannelId>().is_err());
    }

    #[test]
    fn every_channel_round_trips_through_its_name() {
        for id in ChannelId::ALL {
            assert_eq!(id.name().parse::<ChannelId>().unwrap(), id);
        }
    }

    #[test]
    fn parses_color_shorthand() {
        assert_eq!("R".parse::<ColorChannel>().unwrap(), ColorChannel::Red);
        assert_eq!("alpha".parse::<ColorChannel>().unwrap(), ColorChannel::Alpha);
        assert_eq!("".parse::<ColorChannel>().unwrap(), ColorChannel::None);
        assert!("cyan".parse::<ColorChannel>().is_err());
    }

    #[test]
    fn channel_serde_uses_canonical_names() {
        let json = serde_json::to_string(&ChannelId::EmissiveClipped).unwrap();
        assert_eq!(json, "\"emissive-clipped\"");
        let parsed: ChannelId = serde_json::from_str("\"Emissive_Clipped\"").unwrap();
        assert_eq!(parsed, ChannelId::EmissiveClipped);
    }

    #[test]
    fn alpha_defaults_to_opaque() {
        assert_eq!(ColorChannel::Alpha.default_byte(), 255);
        assert_eq!(ColorChannel::Red.default_byte(), 0);
        assert_eq!(ChannelId::Opacity.default_byte(), 255);
        assert_eq!(ChannelId::Smooth.default_byte(), 0);
    }
}
