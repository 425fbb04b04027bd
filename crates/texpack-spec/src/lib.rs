//! texpack configuration model
//!
//! This crate provides the typed configuration consumed by the texpack
//! texture pipeline: channel identities, per-channel encodings, profiles,
//! materials and the option structs for derived normal and occlusion maps.
//! Everything here is plain data plus validation; no image code lives here.
//!
//! # Example
//!
//! ```
//! use texpack_spec::{ChannelId, ColorChannel, EncodingChannelSpec, Profile, TextureEncoding};
//! use texpack_spec::validation::validate_profile;
//!
//! let profile = Profile::new("lab")
//!     .with_input(TextureEncoding::new(vec![
//!         EncodingChannelSpec::new(ChannelId::Rough, "rough", ColorChannel::Red),
//!     ]))
//!     .with_output(TextureEncoding::new(vec![
//!         EncodingChannelSpec::new(ChannelId::Smooth, "specular", ColorChannel::Red),
//!     ]));
//!
//! assert!(validate_profile(&profile).is_ok());
//! ```

pub mod channel;
pub mod encoding;
pub mod error;
pub mod material;
pub mod options;
pub mod profile;
pub mod sampler;
pub mod validation;

// Re-export commonly used types at the crate root
pub use channel::{ChannelId, ColorChannel, ParseChannelError};
pub use encoding::{standard_normal_encoding, tags, EncodingChannelSpec, TextureEncoding, TextureTag};
pub use error::{
    BackendError, ErrorCode, GenerationError, SpecError, ValidationError, ValidationIssue,
    ValidationResult, ValidationWarning, WarningCode,
};
pub use material::{ChannelAdjustment, Material, MaterialScalars};
pub use options::{
    EdgeCurve, EdgeCurves, NormalBuildOptions, NormalEncoding, NormalMethod,
    OcclusionBuildOptions, Region,
};
pub use profile::{OutputTexture, Profile};
pub use sampler::SamplerKind;
