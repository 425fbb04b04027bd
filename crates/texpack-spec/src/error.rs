//! Error types for configuration validation and processing.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Error codes for configuration validation.
///
/// Codes are grouped in decades: E00x for encodings, E01x for generation
/// options, E02x for profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// E001: Pixel range min is greater than max
    InvalidPixelRange,
    /// E002: Value range is empty, inverted or not finite
    InvalidValueRange,
    /// E003: Power must be finite and positive
    InvalidPower,
    /// E004: A channel is declared twice in one output texture
    DuplicateOutputChannel,
    /// E005: Two output textures share a tag
    DuplicateOutputTag,
    /// E006: Two channels write the same color slot of one output texture
    ColorSlotConflict,
    /// E007: Literal value is not finite
    InvalidLiteral,
    /// E010: Sobel kernel size is not 3, 5 or 9
    InvalidKernelSize,
    /// E011: Normal build options are out of range
    InvalidNormalOptions,
    /// E012: Occlusion build options are out of range
    InvalidOcclusionOptions,
    /// E013: Normal encoding is declared but not supported
    UnsupportedNormalEncoding,
    /// E020: Profile declares no output textures
    NoOutputs,
    /// E021: Texture size is zero or too large
    InvalidTextureSize,
    /// E022: Empty texture tag
    EmptyTag,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        use ErrorCode::*;
        match self {
            InvalidPixelRange => "E001",
            InvalidValueRange => "E002",
            InvalidPower => "E003",
            DuplicateOutputChannel => "E004",
            DuplicateOutputTag => "E005",
            ColorSlotConflict => "E006",
            InvalidLiteral => "E007",
            InvalidKernelSize => "E010",
            InvalidNormalOptions => "E011",
            InvalidOcclusionOptions => "E012",
            UnsupportedNormalEncoding => "E013",
            NoOutputs => "E020",
            InvalidTextureSize => "E021",
            EmptyTag => "E022",
        }
    }
}

/// Warning codes for configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: More than one channel is mapped to the magnitude slot
    MultipleMagnitudeMappings,
    /// W002: Output texture maps no channels
    EmptyOutputTexture,
    /// W003: Sampler name is not recognized
    UnknownSampler,
    /// W004: Output channel has no color slot and will never be written
    UnmappedOutputChannel,
}

impl WarningCode {
    pub fn code(&self) -> &'static str {
        use WarningCode::*;
        match self {
            MultipleMagnitudeMappings => "W001",
            EmptyOutputTexture => "W002",
            UnknownSampler => "W003",
            UnmappedOutputChannel => "W004",
        }
    }
}

macro_rules! display_code {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    )*};
}

display_code!(ErrorCode, WarningCode);

/// One finding from validation, located by a JSON-style path such as
/// `output[2]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue<C> {
    pub code: C,
    pub message: String,
    pub path: Option<String>,
}

pub type ValidationError = ValidationIssue<ErrorCode>;
pub type ValidationWarning = ValidationIssue<WarningCode>;

impl<C> ValidationIssue<C> {
    pub fn new(code: C, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(code: C, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(code, message)
        }
    }
}

impl<C: fmt::Display> fmt::Display for ValidationIssue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        match &self.path {
            Some(path) => write!(f, " (at {})", path),
            None => Ok(()),
        }
    }
}

impl<C: fmt::Debug + fmt::Display> std::error::Error for ValidationIssue<C> {}

/// Errors from loading or checking configuration.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("{what} failed validation: {}", join_issues(.errors))]
    Invalid {
        what: String,
        errors: Vec<ValidationError>,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_issues(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything one validation pass found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// An empty result.
    pub fn success() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// No errors. Warnings do not count.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Keep the warnings when clean, otherwise fail with every error under
    /// the name `what`.
    pub fn into_checked(self, what: impl Into<String>) -> Result<Vec<ValidationWarning>, SpecError> {
        if self.is_ok() {
            Ok(self.warnings)
        } else {
            Err(SpecError::Invalid {
                what: what.into(),
                errors: self.errors,
            })
        }
    }
}

/// Stable code and category for errors raised by processing backends.
///
/// ```
/// use texpack_spec::BackendError;
///
/// fn report<E: BackendError>(err: &E) -> String {
///     format!("[{}/{}] {}", err.category(), err.code(), err.message())
/// }
/// ```
pub trait BackendError: std::error::Error {
    /// A code like `TEXTURE_003` that does not change between releases.
    fn code(&self) -> &'static str;

    fn message(&self) -> String {
        self.to_string()
    }

    fn category(&self) -> &'static str;
}

/// A backend error with its concrete type erased, for callers that handle
/// several backends uniformly.
#[derive(Debug, Error)]
#[error("[{code}] {message}")]
pub struct GenerationError {
    pub code: &'static str,
    pub message: String,
    pub category: &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl GenerationError {
    pub fn from_backend<E: BackendError + Send + Sync + 'static>(err: E) -> Self {
        Self {
            code: err.code(),
            message: err.message(),
            category: err.category(),
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn codes_render_as_strings() {
        assert_eq!(ErrorCode::InvalidPixelRange.to_string(), "E001");
        assert_eq!(ErrorCode::InvalidKernelSize.code(), "E010");
        assert_eq!(ErrorCode::UnsupportedNormalEncoding.code(), "E013");
        assert_eq!(ErrorCode::NoOutputs.code(), "E020");
        assert_eq!(WarningCode::UnknownSampler.to_string(), "W003");
    }

    #[test]
    fn issue_display_includes_path() {
        let err = ValidationError::new(ErrorCode::InvalidKernelSize, "kernel_size must be 3, 5 or 9");
        assert_eq!(err.to_string(), "E010: kernel_size must be 3, 5 or 9");

        let err = ValidationError::with_path(
            ErrorCode::InvalidPixelRange,
            "range_min > range_max",
            "output[2]",
        );
        assert_eq!(err.to_string(), "E001: range_min > range_max (at output[2])");
    }

    #[test]
    fn warnings_do_not_fail_a_result() {
        let mut result = ValidationResult::success();
        result.add_warning(ValidationWarning::new(WarningCode::UnknownSampler, "lanczos9"));
        assert!(result.is_ok());
        assert!(result.has_warning(WarningCode::UnknownSampler));

        let warnings = result.into_checked("profile").unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn merged_errors_fail_the_check() {
        let mut result = ValidationResult::success();
        let mut other = ValidationResult::success();
        other.add_error(ValidationError::new(ErrorCode::NoOutputs, "no outputs"));
        other.add_error(ValidationError::with_path(ErrorCode::EmptyTag, "empty tag", "input[0]"));
        result.merge(other);

        assert!(!result.is_ok());
        assert!(result.has_error(ErrorCode::EmptyTag));
        let err = result.into_checked("profile 'lab'").unwrap_err();
        assert_eq!(
            err.to_string(),
            "profile 'lab' failed validation: E020: no outputs; E022: empty tag (at input[0])"
        );
    }

    #[test]
    fn generation_error_keeps_code_and_source() {
        #[derive(Debug, Error)]
        #[error("bad kernel")]
        struct KernelError;

        impl BackendError for KernelError {
            fn code(&self) -> &'static str {
                "TEST_001"
            }
            fn category(&self) -> &'static str {
                "test"
            }
        }

        let err = GenerationError::from_backend(KernelError);
        assert_eq!(err.to_string(), "[TEST_001] bad kernel");
        assert_eq!(err.category, "test");
        assert!(std::error::Error::source(&err).is_some());
    }
}
