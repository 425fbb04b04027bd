//! Generation options for derived normal and occlusion maps.
//!
//! These are plain value objects. The texture backend validates them before
//! touching any buffer so a bad configuration never produces a partial map.

use serde::{Deserialize, Serialize};

use crate::validation::common::{
    validate_non_negative, validate_positive, validate_unit_interval, CommonValidationError,
};

/// Sobel kernel sizes the normal generator supports.
pub const SUPPORTED_KERNEL_SIZES: [u32; 3] = [3, 5, 9];

/// How height derivatives are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalMethod {
    /// Plain weighted Sobel differentiation.
    #[default]
    Sobel,
    /// Neighbors below the center are raised to it before weighting.
    SobelHigh,
    /// Neighbors above the center are lowered to it before weighting.
    SobelLow,
    /// Full-resolution and low-frequency normals blended by local variance.
    Variance,
}

/// How a unit normal is packed into stored components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalEncoding {
    /// XYZ biased into 0..1.
    #[default]
    Standard,
    /// XY stretched onto the unit square; Z reconstructed on decode.
    CompressedProject,
    /// Direction scaled by the normalized polar angle.
    CompressedAngle,
    /// Like `CompressedAngle` with an arctangent warp for perceptual uniformity.
    UniformAngle,
    /// Declared by some formats; not supported.
    Octahedron,
}

impl NormalEncoding {
    pub fn is_supported(&self) -> bool {
        !matches!(self, NormalEncoding::Octahedron)
    }
}

/// Curvature applied near one edge of a frame or region.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeCurve {
    /// Tilt at the very edge, in degrees.
    #[serde(default)]
    pub angle: f64,
    /// Influence distance as a fraction of the frame size (0..1).
    #[serde(default)]
    pub radius: f64,
}

impl EdgeCurve {
    pub fn new(angle: f64, radius: f64) -> Self {
        Self { angle, radius }
    }

    pub fn is_active(&self) -> bool {
        self.angle != 0.0 && self.radius > 0.0
    }
}

/// Per-edge curvature.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeCurves {
    #[serde(default)]
    pub top: EdgeCurve,
    #[serde(default)]
    pub bottom: EdgeCurve,
    #[serde(default)]
    pub left: EdgeCurve,
    #[serde(default)]
    pub right: EdgeCurve,
}

impl EdgeCurves {
    /// Same curve on all four edges.
    pub fn uniform(curve: EdgeCurve) -> Self {
        Self {
            top: curve,
            bottom: curve,
            left: curve,
            right: curve,
        }
    }

    pub fn is_active(&self) -> bool {
        self.top.is_active() || self.bottom.is_active() || self.left.is_active() || self.right.is_active()
    }

    fn all(&self) -> [(&'static str, &EdgeCurve); 4] {
        [
            ("top", &self.top),
            ("bottom", &self.bottom),
            ("left", &self.left),
            ("right", &self.right),
        ]
    }
}

/// Sub-rectangle of a frame, in fractions of the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The whole frame.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

fn default_kernel_size() -> u32 {
    3
}

fn default_strength() -> f64 {
    1.0
}

fn default_downsample() -> u32 {
    4
}

fn default_blur_sigma() -> f64 {
    1.0
}

/// Options for synthesizing a normal map from a height field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalBuildOptions {
    #[serde(default)]
    pub method: NormalMethod,
    /// Sobel kernel size: 3, 5 or 9.
    #[serde(default = "default_kernel_size")]
    pub kernel_size: u32,
    /// Larger values produce steeper normals.
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(default)]
    pub wrap_x: bool,
    #[serde(default)]
    pub wrap_y: bool,
    #[serde(default)]
    pub encoding: NormalEncoding,
    /// Downsample factor for the low-frequency pass (`Variance` only).
    #[serde(default = "default_downsample")]
    pub low_frequency_downsample: u32,
    /// Gaussian sigma for the low-frequency pass, in low-resolution pixels.
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f64,
    /// Scales how quickly local height variance favors high-frequency detail.
    #[serde(default = "default_strength")]
    pub variance_strength: f64,
    #[serde(default)]
    pub curves: EdgeCurves,
    /// Random tilt in degrees; 0 disables jitter.
    #[serde(default)]
    pub noise_strength: f64,
    #[serde(default)]
    pub seed: u32,
    /// When non-empty, curvature is applied only inside these regions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<Region>,
}

impl Default for NormalBuildOptions {
    fn default() -> Self {
        Self {
            method: NormalMethod::Sobel,
            kernel_size: default_kernel_size(),
            strength: default_strength(),
            wrap_x: false,
            wrap_y: false,
            encoding: NormalEncoding::Standard,
            low_frequency_downsample: default_downsample(),
            blur_sigma: default_blur_sigma(),
            variance_strength: default_strength(),
            curves: EdgeCurves::default(),
            noise_strength: 0.0,
            seed: 0,
            regions: Vec::new(),
        }
    }
}

impl NormalBuildOptions {
    pub fn with_method(mut self, method: NormalMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_kernel_size(mut self, kernel_size: u32) -> Self {
        self.kernel_size = kernel_size;
        self
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_wrap(mut self, wrap_x: bool, wrap_y: bool) -> Self {
        self.wrap_x = wrap_x;
        self.wrap_y = wrap_y;
        self
    }

    pub fn with_encoding(mut self, encoding: NormalEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_curves(mut self, curves: EdgeCurves) -> Self {
        self.curves = curves;
        self
    }

    pub fn with_noise(mut self, strength: f64, seed: u32) -> Self {
        self.noise_strength = strength;
        self.seed = seed;
        self
    }

    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }

    /// Checks every option; the first problem found is returned.
    pub fn validate(&self) -> Result<(), CommonValidationError> {
        if !SUPPORTED_KERNEL_SIZES.contains(&self.kernel_size) {
            return Err(CommonValidationError::new(format!(
                "kernel_size must be one of {:?}, got {}",
                SUPPORTED_KERNEL_SIZES, self.kernel_size
            )));
        }
        validate_positive("strength", self.strength)?;
        if !self.encoding.is_supported() {
            return Err(CommonValidationError::new(format!(
                "normal encoding {:?} is not supported",
                self.encoding
            )));
        }
        if self.low_frequency_downsample < 1 {
            return Err(CommonValidationError::new(
                "low_frequency_downsample must be at least 1",
            ));
        }
        validate_non_negative("blur_sigma", self.blur_sigma)?;
        validate_non_negative("variance_strength", self.variance_strength)?;
        validate_non_negative("noise_strength", self.noise_strength)?;
        for (edge, curve) in self.curves.all() {
            if !curve.angle.is_finite() || curve.angle.abs() > 90.0 {
                return Err(CommonValidationError::new(format!(
                    "curves.{}.angle must be within [-90, 90], got {}",
                    edge, curve.angle
                )));
            }
            validate_unit_interval(&format!("curves.{}.radius", edge), curve.radius)?;
        }
        for (i, region) in self.regions.iter().enumerate() {
            validate_unit_interval(&format!("regions[{}].x", i), region.x)?;
            validate_unit_interval(&format!("regions[{}].y", i), region.y)?;
            validate_positive(&format!("regions[{}].width", i), region.width)?;
            validate_positive(&format!("regions[{}].height", i), region.height)?;
        }
        Ok(())
    }
}

fn default_quality() -> f64 {
    0.1
}

fn default_step_count() -> u32 {
    16
}

fn default_step_distance() -> f64 {
    1.0
}

fn default_z_scale() -> f64 {
    8.0
}

fn default_hit_power() -> f64 {
    1.5
}

/// Options for synthesizing ambient occlusion from a height field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OcclusionBuildOptions {
    /// Ray density in [0, 1].
    #[serde(default = "default_quality")]
    pub quality: f64,
    /// Maximum march steps per ray.
    #[serde(default = "default_step_count")]
    pub step_count: u32,
    /// March step length in source pixels.
    #[serde(default = "default_step_distance")]
    pub step_distance: f64,
    /// Height of a full-white height sample, in pixels.
    #[serde(default = "default_z_scale")]
    pub z_scale: f64,
    /// Offset added to every height sample before scaling.
    #[serde(default)]
    pub z_bias: f64,
    /// Falloff of hit weight with distance.
    #[serde(default = "default_hit_power")]
    pub hit_power: f64,
    #[serde(default)]
    pub wrap_x: bool,
    #[serde(default)]
    pub wrap_y: bool,
}

impl Default for OcclusionBuildOptions {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            step_count: default_step_count(),
            step_distance: default_step_distance(),
            z_scale: default_z_scale(),
            z_bias: 0.0,
            hit_power: default_hit_power(),
            wrap_x: false,
            wrap_y: false,
        }
    }
}

impl OcclusionBuildOptions {
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_step_count(mut self, step_count: u32) -> Self {
        self.step_count = step_count;
        self
    }

    pub fn with_z_scale(mut self, z_scale: f64) -> Self {
        self.z_scale = z_scale;
        self
    }

    pub fn with_z_bias(mut self, z_bias: f64) -> Self {
        self.z_bias = z_bias;
        self
    }

    pub fn with_hit_power(mut self, hit_power: f64) -> Self {
        self.hit_power = hit_power;
        self
    }

    pub fn with_wrap(mut self, wrap_x: bool, wrap_y: bool) -> Self {
        self.wrap_x = wrap_x;
        self.wrap_y = wrap_y;
        self
    }

    /// Checks every option; the first problem found is returned.
    pub fn validate(&self) -> Result<(), CommonValidationError> {
        validate_unit_interval("quality", self.quality)?;
        if self.step_count < 1 {
            return Err(CommonValidationError::new("step_count must be at least 1"));
        }
        validate_positive("step_distance", self.step_distance)?;
        validate_positive("z_scale", self.z_scale)?;
        if !self.z_bias.is_finite() {
            return Err(CommonValidationError::new(format!(
                "z_bias must be finite, got {}",
                self.z_bias
            )));
        }
        validate_positive("hit_power", self.hit_power)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_normal_options_are_valid() {
        assert!(NormalBuildOptions::default().validate().is_ok());
    }

    #[test]
    fn kernel_size_must_be_supported() {
        for size in [3, 5, 9] {
            assert!(NormalBuildOptions::default().with_kernel_size(size).validate().is_ok());
        }
        for size in [0, 1, 4, 7, 11] {
            let err = NormalBuildOptions::default()
                .with_kernel_size(size)
                .validate()
                .unwrap_err();
            assert!(err.message.contains("kernel_size"), "{}", err);
        }
    }

    #[test]
    fn octahedron_encoding_is_rejected() {
        let err = NormalBuildOptions::default()
            .with_encoding(NormalEncoding::Octahedron)
            .validate()
            .unwrap_err();
        assert!(err.message.contains("Octahedron"));
    }

    #[test]
    fn curve_radius_must_be_fractional() {
        let options = NormalBuildOptions::default()
            .with_curves(EdgeCurves::uniform(EdgeCurve::new(20.0, 1.5)));
        assert!(options.validate().is_err());
    }

    #[test]
    fn occlusion_rejects_degenerate_configuration() {
        assert!(OcclusionBuildOptions::default().validate().is_ok());
        assert!(OcclusionBuildOptions::default().with_step_count(0).validate().is_err());
        assert!(OcclusionBuildOptions::default().with_z_scale(0.0).validate().is_err());
        assert!(OcclusionBuildOptions::default().with_z_scale(-2.0).validate().is_err());
        assert!(OcclusionBuildOptions::default().with_quality(1.5).validate().is_err());
        assert!(OcclusionBuildOptions::default().with_quality(-0.1).validate().is_err());
    }

    #[test]
    fn options_parse_with_defaults() {
        let options: NormalBuildOptions =
            serde_json::from_str(r#"{ "method": "sobel_high", "kernel_size": 5 }"#).unwrap();
        assert_eq!(options.method, NormalMethod::SobelHigh);
        assert_eq!(options.kernel_size, 5);
        assert_eq!(options.strength, 1.0);
        assert_eq!(options.low_frequency_downsample, 4);
    }
}
