//! Profile configuration.
//!
//! A profile fixes the contract between authored sources and the produced
//! texture set: which channels are read from where (`input`) and which
//! channels each output texture must carry (`output`).

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::encoding::{TextureEncoding, TextureTag};
use crate::error::SpecError;
use crate::options::{NormalBuildOptions, OcclusionBuildOptions};

/// Read and parse a JSON configuration file.
pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, SpecError> {
    let text = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn default_sampler() -> String {
    "bilinear".to_string()
}

/// Output encoding grouped per texture tag.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTexture {
    pub tag: TextureTag,
    pub channels: TextureEncoding,
}

/// A named build profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub name: String,
    /// Where channels can be read from.
    #[serde(default)]
    pub input: TextureEncoding,
    /// What every produced texture must contain; channels are grouped by
    /// their `texture` tag.
    #[serde(default)]
    pub output: TextureEncoding,
    /// Edge length every output is resampled to; the largest source wins
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_size: Option<u32>,
    /// Default resampling kernel.
    #[serde(default = "default_sampler")]
    pub sampler: String,
    #[serde(default)]
    pub normal: NormalBuildOptions,
    #[serde(default)]
    pub occlusion: OcclusionBuildOptions,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: TextureEncoding::default(),
            output: TextureEncoding::default(),
            texture_size: None,
            sampler: default_sampler(),
            normal: NormalBuildOptions::default(),
            occlusion: OcclusionBuildOptions::default(),
        }
    }

    /// Parses a profile from JSON.
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
        self.input = input;
        self
    }

    pub fn with_output(mut self, output: TextureEncoding) -> Self {
        self.output = output;
        self
    }

    pub fn with_texture_size(mut self, size: u32) -> Self {
        self.texture_size = Some(size);
        self
    }

    pub fn with_sampler(mut self, sampler: impl Into<String>) -> Self {
        self.sampler = sampler.into();
        self
    }

    pub fn with_normal_options(mut self, options: NormalBuildOptions) -> Self {
        self.normal = options;
        self
    }

    pub fn with_occlusion_options(mut self, options: OcclusionBuildOptions) -> Self {
        self.occlusion = options;
        self
    }

    /// Output channels grouped by texture tag, tags in first-seen order.
    pub fn output_textures(&self) -> Vec<OutputTexture> {
        self.output
            .tags()
            .into_iter()
            .map(|tag| {
                let channels = self
                    .output
                    .iter()
                    .filter(|c| c.texture == tag)
                    .cloned()
                    .collect();
                OutputTexture { tag, channels }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelId, ColorChannel};
    use crate::encoding::EncodingChannelSpec;
    use pretty_assertions::assert_eq;

    #[test]
    fn output_textures_group_by_tag() {
        let profile = Profile::new("lab").with_output(TextureEncoding::new(vec![
            EncodingChannelSpec::new(ChannelId::NormalX, "normal", ColorChannel::Red),
            EncodingChannelSpec::new(ChannelId::Smooth, "specular", ColorChannel::Red),
            EncodingChannelSpec::new(ChannelId::NormalY, "Normal", ColorChannel::Green),
        ]));

        let outputs = profile.output_textures();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].tag, TextureTag::new("normal"));
        assert_eq!(outputs[0].channels.len(), 2);
        assert_eq!(outputs[1].tag, TextureTag::new("specular"));
    }

    #[test]
    fn profile_round_trips_json() {
        let json = r#"{
            "name": "lab",
            "input": [
                { "id": "height", "texture": "height", "color": "red" }
            ],
            "output": [
                { "id": "normal-x", "texture": "normal", "color": "red", "min_value": -1.0 },
                { "id": "height", "texture": "normal", "color": "alpha" }
            ],
            "texture_size": 128
        }"#;
        let profile = Profile::from_json(json).unwrap();
        assert_eq!(profile.sampler, "bilinear");
        assert_eq!(profile.texture_size, Some(128));
        assert_eq!(profile.output.channels[0].min_value, -1.0);

        let text = profile.to_json_pretty().unwrap();
        assert_eq!(Profile::from_json(&text).unwrap(), profile);
    }
}
