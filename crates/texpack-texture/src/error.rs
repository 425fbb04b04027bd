//! Texture backend errors.

use texpack_spec::BackendError;

use crate::png::PngError;

/// Errors from the texture pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("PNG error: {0}")]
    Png(#[from] PngError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported normal encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Missing source texture: {0}")]
    MissingSource(String),

    /// Raised inside hot loops when the build's cancellation token fires.
    /// The orchestrator turns it into `BuildOutcome::Cancelled`.
    #[error("Build cancelled")]
    Cancelled,
}

impl BackendError for TextureError {
    fn code(&self) -> &'static str {
        match self {
            TextureError::Png(_) => "TEXTURE_001",
            TextureError::Io(_) => "TEXTURE_002",
            TextureError::InvalidParameter(_) => "TEXTURE_003",
            TextureError::UnsupportedEncoding(_) => "TEXTURE_004",
            TextureError::MissingSource(_) => "TEXTURE_005",
            TextureError::Cancelled => "TEXTURE_006",
        }
    }

    fn category(&self) -> &'static str {
        match self {
            TextureError::Cancelled => "cancelled",
            _ => "texture",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texpack_spec::GenerationError;

    #[test]
    fn codes_are_stable() {
        assert_eq!(TextureError::InvalidParameter("x".into()).code(), "TEXTURE_003");
        assert_eq!(TextureError::Cancelled.code(), "TEXTURE_006");
        assert_eq!(TextureError::Cancelled.category(), "cancelled");
    }

    #[test]
    fn wraps_into_generation_error() {
        let err = GenerationError::from_backend(TextureError::UnsupportedEncoding(
            "octahedron".into(),
        ));
        assert_eq!(err.code, "TEXTURE_004");
        assert_eq!(err.to_string(), "[TEXTURE_004] Unsupported normal encoding: octahedron");
    }
}
