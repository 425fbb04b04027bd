//! Validation helpers shared by the configuration types and the backend.

use std::fmt;

/// A failed check; callers attach the error code and path.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonValidationError {
    pub message: String,
}

impl CommonValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CommonValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CommonValidationError {}

fn require_finite(name: &str, value: f64) -> Result<(), CommonValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CommonValidationError::new(format!("{} must be finite, got {}", name, value)))
    }
}

/// Largest texture edge the pipeline will allocate buffers for.
pub const MAX_TEXTURE_DIMENSION: u32 = 8192;

/// Validate that a texture size is positive and bounded.
///
/// # Example
/// ```
/// use texpack_spec::validation::common::validate_texture_size;
///
/// assert!(validate_texture_size(512, 256).is_ok());
/// assert!(validate_texture_size(0, 16).is_err());
/// ```
pub fn validate_texture_size(width: u32, height: u32) -> Result<(), CommonValidationError> {
    if width == 0 || height == 0 {
        return Err(CommonValidationError::new(format!(
            "texture size must be at least 1x1, got [{}, {}]",
            width, height
        )));
    }
    if width > MAX_TEXTURE_DIMENSION || height > MAX_TEXTURE_DIMENSION {
        return Err(CommonValidationError::new(format!(
            "texture size is too large: max is {}x{}, got [{}, {}]",
            MAX_TEXTURE_DIMENSION, MAX_TEXTURE_DIMENSION, width, height
        )));
    }
    Ok(())
}

/// Validate that a value is in [0, 1].
///
/// # Example
/// ```
/// use texpack_spec::validation::common::validate_unit_interval;
///
/// assert!(validate_unit_interval("quality", 0.5).is_ok());
/// assert!(validate_unit_interval("quality", 1.5).is_err());
/// ```
pub fn validate_unit_interval(name: &str, value: f64) -> Result<(), CommonValidationError> {
    require_finite(name, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(CommonValidationError::new(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate that a value is finite and positive (> 0).
pub fn validate_positive(name: &str, value: f64) -> Result<(), CommonValidationError> {
    require_finite(name, value)?;
    if value <= 0.0 {
        return Err(CommonValidationError::new(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate that a value is finite and non-negative (>= 0).
pub fn validate_non_negative(name: &str, value: f64) -> Result<(), CommonValidationError> {
    require_finite(name, value)?;
    if value < 0.0 {
        return Err(CommonValidationError::new(format!(
            "{} must be non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate a byte range used as a channel's pixel space.
pub fn validate_pixel_range(min: u8, max: u8) -> Result<(), CommonValidationError> {
    if min > max {
        return Err(CommonValidationError::new(format!(
            "range_min must not exceed range_max, got [{}, {}]",
            min, max
        )));
    }
    Ok(())
}

/// Validate a channel's value-space bounds.
pub fn validate_value_range(min: f64, max: f64) -> Result<(), CommonValidationError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(CommonValidationError::new(format!(
            "value range must be finite, got [{}, {}]",
            min, max
        )));
    }
    if min >= max {
        return Err(CommonValidationError::new(format!(
            "min_value must be less than max_value, got [{}, {}]",
            min, max
        )));
    }
    Ok(())
}
