//! Material configuration.
//!
//! A material is one set of source images plus the per-material knobs that
//! override the profile: constant channel values, derived-map generation
//! switches and option overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelId;
use crate::encoding::TextureEncoding;
use crate::error::SpecError;
use crate::options::{NormalBuildOptions, OcclusionBuildOptions};
use crate::profile::{read_json_file, Profile};

/// Value-space constants a material pins for whole channels.
///
/// A set scalar wins over any texture source for that channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialScalars {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub albedo: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occlusion: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smooth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rough: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f0: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub porosity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive: Option<f64>,
}

impl MaterialScalars {
    /// The pinned value for `channel`, if any.
    pub fn scalar_for(&self, channel: ChannelId) -> Option<f64> {
        match channel {
            ChannelId::AlbedoR => self.albedo.map(|c| c[0]),
            ChannelId::AlbedoG => self.albedo.map(|c| c[1]),
            ChannelId::AlbedoB => self.albedo.map(|c| c[2]),
            ChannelId::Opacity => self.opacity,
            ChannelId::Height => self.height,
            ChannelId::Occlusion => self.occlusion,
            ChannelId::Smooth => self.smooth,
            ChannelId::Rough => self.rough,
            ChannelId::Metal => self.metal,
            ChannelId::F0 => self.f0,
            ChannelId::Porosity => self.porosity,
            ChannelId::Sss => self.sss,
            ChannelId::Emissive => self.emissive,
            _ => None,
        }
    }

    /// Every pinned channel and its value, for validation.
    pub fn entries(&self) -> Vec<(ChannelId, f64)> {
        ChannelId::ALL
            .iter()
            .filter_map(|&id| self.scalar_for(id).map(|v| (id, v)))
            .collect()
    }
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f64 {
    1.0
}

/// Per-channel value-space tweak applied between decoding the source and
/// encoding the output: `v' = (v + shift) * scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelAdjustment {
    /// Output channel the adjustment applies to.
    pub id: ChannelId,
    #[serde(default)]
    pub shift: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl ChannelAdjustment {
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            shift: 0.0,
            scale: 1.0,
        }
    }

    pub fn with_shift(mut self, shift: f64) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

/// One material to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Material {
    /// Material name; also the folder its sources live in.
    pub name: String,
    /// Replaces the profile's input encoding for this material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<TextureEncoding>,
    #[serde(default)]
    pub scalars: MaterialScalars,
    /// Value shift/scale per output channel.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<ChannelAdjustment>,
    /// Texture tiles horizontally.
    #[serde(default)]
    pub wrap_x: bool,
    /// Texture tiles vertically.
    #[serde(default)]
    pub wrap_y: bool,
    /// Synthesize a normal map from height when no normal source exists.
    #[serde(default = "default_true")]
    pub generate_normal: bool,
    /// Synthesize occlusion from height when no occlusion source exists.
    #[serde(default)]
    pub generate_occlusion: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<NormalBuildOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occlusion: Option<OcclusionBuildOptions>,
    /// Frames stacked vertically in every source; inferred when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u32>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: None,
            scalars: MaterialScalars::default(),
            adjustments: Vec::new(),
            wrap_x: false,
            wrap_y: false,
            generate_normal: true,
            generate_occlusion: false,
            normal: None,
            occlusion: None,
            frame_count: None,
        }
    }

    /// Parses a material from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        read_json_file(path.as_ref())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_input(mut self, input: TextureEncoding) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_scalars(mut self, scalars: MaterialScalars) -> Self {
        self.scalars = scalars;
        self
    }

    pub fn with_adjustment(mut self, adjustment: ChannelAdjustment) -> Self {
        self.adjustments.push(adjustment);
        self
    }

    /// `(shift, scale)` for an output channel; the first matching
    /// adjustment wins, identity when none is declared.
    pub fn adjustment_for(&self, id: ChannelId) -> (f64, f64) {
        self.adjustments
            .iter()
            .find(|a| a.id == id)
            .map_or((0.0, 1.0), |a| (a.shift, a.scale))
    }

    pub fn with_wrap(mut self, wrap_x: bool, wrap_y: bool) -> Self {
        self.wrap_x = wrap_x;
        self.wrap_y = wrap_y;
        self
    }

    pub fn with_generated_normal(mut self, enabled: bool) -> Self {
        self.generate_normal = enabled;
        self
    }

    pub fn with_generated_occlusion(mut self, enabled: bool) -> Self {
        self.generate_occlusion = enabled;
        self
    }

    pub fn with_normal_options(mut self, options: NormalBuildOptions) -> Self {
        self.normal = Some(options);
        self
    }

    pub fn with_occlusion_options(mut self, options: OcclusionBuildOptions) -> Self {
        self.occlusion = Some(options);
        self
    }

    /// Input encoding in effect for this material.
    pub fn input_encoding<'a>(&'a self, profile: &'a Profile) -> &'a TextureEncoding {
        self.input.as_ref().unwrap_or(&profile.input)
    }

    /// Normal options in effect: the material's own, else the profile's,
    /// with the material's wrap flags applied.
    pub fn normal_options(&self, profile: &Profile) -> NormalBuildOptions {
        let mut options = self.normal.clone().unwrap_or_else(|| profile.normal.clone());
        options.wrap_x |= self.wrap_x;
        options.wrap_y |= self.wrap_y;
        options
    }

    /// Occlusion options in effect, resolved like [`Material::normal_options`].
    pub fn occlusion_options(&self, profile: &Profile) -> OcclusionBuildOptions {
        let mut options = self
            .occlusion
            .clone()
            .unwrap_or_else(|| profile.occlusion.clone());
        options.wrap_x |= self.wrap_x;
        options.wrap_y |= self.wrap_y;
        options
    }
}
