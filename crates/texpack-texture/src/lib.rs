//! texpack texture pipeline
//!
//! This crate turns a material's authored source textures into the packed
//! textures a profile asks for. Every output channel is resolved from a
//! literal, a material scalar, a matching input channel or a related channel
//! through a derivation rule, then written through a pixel value mapping.
//! Normal and occlusion maps can be synthesized from a height field when no
//! authored ones exist.
//!
//! # Features
//!
//! - **Channel resolution**: ordered derivation rules between related channels
//! - **Pixel value mapping**: pixel ranges, value ranges, power, invert, cyclic shift
//! - **Normal maps**: weighted Sobel kernels, frequency blending, edge curvature, compressed encodings
//! - **Ambient occlusion**: hemisphere ray marching over the height field
//! - **Deterministic PNG**: fixed compression settings for byte-identical output
//!
//! # Example
//!
//! ```
//! use texpack_spec::{ChannelId, ColorChannel, EncodingChannelSpec, Material, Profile, TextureEncoding};
//! use texpack_texture::{build_material, BuildContext, BuildOutcome, BuiltinSamplers, ImageBuffer, MemoryTextureStore, PixelFormat};
//!
//! let profile = Profile::new("lab")
//!     .with_input(TextureEncoding::new(vec![
//!         EncodingChannelSpec::new(ChannelId::Rough, "rough", ColorChannel::Red),
//!     ]))
//!     .with_output(TextureEncoding::new(vec![
//!         EncodingChannelSpec::new(ChannelId::Smooth, "specular", ColorChannel::Red),
//!     ]));
//! let material = Material::new("brick");
//!
//! let mut store = MemoryTextureStore::new().with_source(
//!     "brick",
//!     "rough",
//!     ImageBuffer::filled(4, 4, PixelFormat::Gray8, [100, 0, 0, 0]),
//! );
//! let source = store.clone();
//!
//! let ctx = BuildContext::new(&profile, &material);
//! let outcome = build_material(&ctx, &source, &mut store, &BuiltinSamplers::new()).unwrap();
//! assert!(matches!(outcome, BuildOutcome::Completed(_)));
//! assert_eq!(store.output("brick", "specular").unwrap().data[0], 155);
//! ```
//!
//! # Determinism
//!
//! - Row-parallel passes write disjoint rows, so scheduling never changes output
//! - Normal jitter draws from per-row PCG32 streams seeded through BLAKE3
//! - PNG encoding uses fixed compression settings

pub mod buffer;
pub mod cancel;
pub mod compose;
pub mod derivation;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod height;
pub mod io;
pub mod mapping;
pub mod normal_map;
pub mod occlusion;
pub mod png;
pub mod resolve;
pub mod rng;
pub mod sampler;

// Re-export main types for convenience
pub use buffer::{Gray16Buffer, GrayscaleBuffer, ImageBuffer, PixelFormat};
pub use cancel::CancellationToken;
pub use compose::{compose, SourceImages};
pub use derivation::{Derivation, DerivationRule, DERIVATION_RULES};
pub use diagnostics::{Diagnostic, DiagnosticCode};
pub use error::TextureError;
pub use graph::{build_material, needs_rebuild, BuildContext, BuildOutcome, BuildReport, OutputSummary};
pub use height::HeightField;
pub use io::{MemoryTextureStore, PngDirectory, TextureSink, TextureSource};
pub use mapping::{MappingSide, PixelMapping, RemappedByte};
pub use normal_map::{encode_normal_field, generate_normal_field, generate_normal_map, NormalField};
pub use occlusion::{generate_occlusion, RaySet};
pub use png::{PngConfig, PngError};
pub use resolve::{build_plan, resolve_channel, CompositionPlan, Resolution};
pub use rng::DeterministicRng;
pub use sampler::{BoxSampler, BuiltinSamplers, FilterSampler, Resampler, SamplerRegistry};
