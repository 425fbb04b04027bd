//! Configuration validation.
//!
//! Validation collects every problem it finds instead of stopping at the
//! first, so a profile author sees the whole list at once.

pub mod common;

use std::collections::HashSet;

use crate::channel::ColorChannel;
use crate::encoding::TextureEncoding;
use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};
use crate::material::Material;
use crate::options::{NormalBuildOptions, OcclusionBuildOptions, SUPPORTED_KERNEL_SIZES};
use crate::profile::Profile;
use crate::sampler::SamplerKind;

use common::{validate_pixel_range, validate_texture_size, validate_value_range};

/// Validate the per-channel numeric contract of every spec in an encoding.
pub fn validate_encoding(encoding: &TextureEncoding, path: &str) -> ValidationResult {
    let mut result = ValidationResult::success();

    for (i, channel) in encoding.iter().enumerate() {
        let at = format!("{}[{}]", path, i);

        if let Err(e) = validate_pixel_range(channel.range_min, channel.range_max) {
            result.add_error(ValidationError::with_path(ErrorCode::InvalidPixelRange, e.message, &at));
        }
        if let Err(e) = validate_value_range(channel.min_value, channel.max_value) {
            result.add_error(ValidationError::with_path(ErrorCode::InvalidValueRange, e.message, &at));
        }
        if !channel.power.is_finite() || channel.power <= 0.0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidPower,
                format!("power must be finite and positive, got {}", channel.power),
                &at,
            ));
        }
        if let Some(value) = channel.value {
            if !value.is_finite() {
                result.add_error(ValidationError::with_path(
                    ErrorCode::InvalidLiteral,
                    format!("value must be finite, got {}", value),
                    &at,
                ));
            }
        }
        if let Some(sampler) = &channel.sampler {
            if sampler.parse::<SamplerKind>().is_err() {
                result.add_warning(ValidationWarning::with_path(
                    WarningCode::UnknownSampler,
                    format!("unknown sampler '{}'", sampler),
                    &at,
                ));
            }
        }
    }

    let magnitude_count = encoding
        .iter()
        .filter(|c| c.color == ColorChannel::Magnitude)
        .count();
    if magnitude_count > 1 {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::MultipleMagnitudeMappings,
            format!(
                "{} channels are mapped to the magnitude slot; only the first is used",
                magnitude_count
            ),
            path,
        ));
    }

    result
}

/// Validate normal build options, mapping failures to stable codes.
pub fn validate_normal_options(options: &NormalBuildOptions, path: &str) -> ValidationResult {
    let mut result = ValidationResult::success();
    if let Err(e) = options.validate() {
        let code = if !SUPPORTED_KERNEL_SIZES.contains(&options.kernel_size) {
            ErrorCode::InvalidKernelSize
        } else if !options.encoding.is_supported() {
            ErrorCode::UnsupportedNormalEncoding
        } else {
            ErrorCode::InvalidNormalOptions
        };
        result.add_error(ValidationError::with_path(code, e.message, path));
    }
    result
}

/// Validate occlusion build options.
pub fn validate_occlusion_options(options: &OcclusionBuildOptions, path: &str) -> ValidationResult {
    let mut result = ValidationResult::success();
    if let Err(e) = options.validate() {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidOcclusionOptions,
            e.message,
            path,
        ));
    }
    result
}

/// Validate a whole profile.
pub fn validate_profile(profile: &Profile) -> ValidationResult {
    let mut result = ValidationResult::success();

    result.merge(validate_encoding(&profile.input, "input"));
    result.merge(validate_encoding(&profile.output, "output"));

    if profile.output.is_empty() {
        result.add_error(ValidationError::new(
            ErrorCode::NoOutputs,
            "profile declares no output channels",
        ));
    }

    for (i, channel) in profile.output.iter().enumerate() {
        let at = format!("output[{}]", i);
        if channel.texture.is_empty() {
            result.add_error(ValidationError::with_path(
                ErrorCode::EmptyTag,
                format!("output channel '{}' has no texture tag", channel.id),
                &at,
            ));
        }
        if !channel.has_color() {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::UnmappedOutputChannel,
                format!("output channel '{}' has no color slot", channel.id),
                &at,
            ));
        }
    }

    for output in profile.output_textures() {
        let mut ids = HashSet::new();
        let mut slots = HashSet::new();
        for channel in output.channels.iter() {
            if !ids.insert(channel.id) {
                result.add_error(ValidationError::with_path(
                    ErrorCode::DuplicateOutputChannel,
                    format!("channel '{}' appears twice", channel.id),
                    format!("output[{}]", output.tag),
                ));
            }
            if channel.color.index().is_some() && !slots.insert(channel.color) {
                result.add_error(ValidationError::with_path(
                    ErrorCode::ColorSlotConflict,
                    format!(
                        "channel '{}' writes the {} slot, which is already taken",
                        channel.id, channel.color
                    ),
                    format!("output[{}]", output.tag),
                ));
            }
        }
        if !output.channels.iter().any(|c| c.has_color()) {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::EmptyOutputTexture,
                "output texture maps no channels",
                format!("output[{}]", output.tag),
            ));
        }
    }

    if let Some(size) = profile.texture_size {
        if let Err(e) = validate_texture_size(size, size) {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidTextureSize,
                e.message,
                "texture_size",
            ));
        }
    }

    if profile.sampler.parse::<SamplerKind>().is_err() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::UnknownSampler,
            format!("unknown sampler '{}'", profile.sampler),
            "sampler",
        ));
    }

    result.merge(validate_normal_options(&profile.normal, "normal"));
    result.merge(validate_occlusion_options(&profile.occlusion, "occlusion"));

    result
}

/// Validate a material's overrides.
pub fn validate_material(material: &Material) -> ValidationResult {
    let mut result = ValidationResult::success();

    if let Some(input) = &material.input {
        result.merge(validate_encoding(input, "input"));
    }
    for (id, value) in material.scalars.entries() {
        if !value.is_finite() {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidLiteral,
                format!("scalar must be finite, got {}", value),
                format!("scalars.{}", id),
            ));
        }
    }
    for (i, adjustment) in material.adjustments.iter().enumerate() {
        if !adjustment.shift.is_finite() || !adjustment.scale.is_finite() {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidLiteral,
                "adjustment shift and scale must be finite",
                format!("adjustments[{}]", i),
            ));
        }
    }
    if let Some(normal) = &material.normal {
        result.merge(validate_normal_options(normal, "normal"));
    }
    if let Some(occlusion) = &material.occlusion {
        result.merge(validate_occlusion_options(occlusion, "occlusion"));
    }
    if material.frame_count == Some(0) {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidTextureSize,
            "frame_count must be at least 1",
            "frame_count",
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelId;
    use crate::encoding::EncodingChannelSpec;
    use crate::options::NormalEncoding;

    fn lab_profile() -> Profile {
        Profile::new("lab")
            .with_input(TextureEncoding::new(vec![EncodingChannelSpec::new(
                ChannelId::Height,
                "height",
                ColorChannel::Red,
            )]))
            .with_output(TextureEncoding::new(vec![
                EncodingChannelSpec::new(ChannelId::NormalX, "normal", ColorChannel::Red)
                    .with_value_range(-1.0, 1.0),
                EncodingChannelSpec::new(ChannelId::Height, "normal", ColorChannel::Alpha),
            ]))
    }

    #[test]
    fn valid_profile_passes() {
        let result = validate_profile(&lab_profile());
        assert!(result.is_ok(), "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn empty_output_is_an_error() {
        let result = validate_profile(&Profile::new("empty"));
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::NoOutputs));
    }

    #[test]
    fn inverted_ranges_are_errors() {
        let mut profile = lab_profile();
        profile.output.channels[0] = profile.output.channels[0]
            .clone()
            .with_pixel_range(200, 10)
            .with_value_range(1.0, -1.0);
        let result = validate_profile(&profile);
        let codes: Vec<ErrorCode> = result.errors.iter().map(|e| e.code).collect();
        assert!(codes.contains(&ErrorCode::InvalidPixelRange));
        assert!(codes.contains(&ErrorCode::InvalidValueRange));
    }

    #[test]
    fn color_slot_conflicts_are_errors() {
        let mut profile = lab_profile();
        profile.output.channels.push(EncodingChannelSpec::new(
            ChannelId::NormalY,
            "normal",
            ColorChannel::Red,
        ));
        let result = validate_profile(&profile);
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::ColorSlotConflict));
    }

    #[test]
    fn multiple_magnitude_mappings_warn() {
        let encoding = TextureEncoding::new(vec![
            EncodingChannelSpec::new(ChannelId::Magnitude, "normal", ColorChannel::Magnitude),
            EncodingChannelSpec::new(ChannelId::Magnitude, "specular", ColorChannel::Magnitude),
        ]);
        let result = validate_encoding(&encoding, "input");
        assert!(result.is_ok());
        assert_eq!(result.warnings[0].code, WarningCode::MultipleMagnitudeMappings);
    }

    #[test]
    fn bad_kernel_and_encoding_get_their_own_codes() {
        let mut profile = lab_profile();
        profile.normal.kernel_size = 7;
        let result = validate_profile(&profile);
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::InvalidKernelSize));

        let mut profile = lab_profile();
        profile.normal.encoding = NormalEncoding::Octahedron;
        let result = validate_profile(&profile);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::UnsupportedNormalEncoding));
    }

    #[test]
    fn unknown_sampler_warns() {
        let profile = lab_profile().with_sampler("mitchell");
        let result = validate_profile(&profile);
        assert!(result.is_ok());
        assert!(result.warnings.iter().any(|w| w.code == WarningCode::UnknownSampler));
    }

    #[test]
    fn material_scalars_must_be_finite() {
        let mut material = Material::new("m");
        material.scalars.smooth = Some(f64::NAN);
        let result = validate_material(&material);
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::InvalidLiteral));
    }
}
