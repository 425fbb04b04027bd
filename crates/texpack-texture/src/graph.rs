//! Texture graph orchestration for one material.
//!
//! [`build_material`] drives a whole build: validate configuration, load
//! sources, match sizes, synthesize normals and occlusion when asked to,
//! then compose and write every output texture in profile order.

use std::collections::HashMap;
use std::time::SystemTime;

use texpack_spec::validation::{validate_material, validate_profile};
use texpack_spec::{
    standard_normal_encoding, ChannelId, ColorChannel, EncodingChannelSpec, Material,
    NormalEncoding, OutputTexture, Profile, SamplerKind, TextureEncoding, TextureTag,
    ValidationResult,
};

use crate::buffer::PixelFormat;
use crate::cancel::CancellationToken;
use crate::compose::{compose, SourceImages};
use crate::diagnostics::{record, Diagnostic, DiagnosticCode};
use crate::error::TextureError;
use crate::height::HeightField;
use crate::io::{TextureSink, TextureSource};
use crate::normal_map::encoding::is_compressed;
use crate::normal_map::{encode_normal_field, generate_normal_field};
use crate::occlusion::generate_occlusion;
use crate::resolve::{build_plan, resolve_channel, Resolution};
use crate::sampler::{FilterSampler, Resampler, SamplerRegistry};

/// Tag under which a synthesized normal map is offered to the resolver.
pub const GENERATED_NORMAL_TAG: &str = "~normal";
/// Tag under which synthesized occlusion is offered to the resolver.
pub const GENERATED_OCCLUSION_TAG: &str = "~occlusion";
/// Tag of the unit-vector copy of a compressed generated normal map, read by
/// outputs that also want NormalZ.
pub const GENERATED_NORMAL_VECTOR_TAG: &str = "~normal-vector";
const HEIGHT_TAG: &str = "~height";

/// Everything one build needs besides I/O.
#[derive(Debug, Clone)]
pub struct BuildContext<'a> {
    pub profile: &'a Profile,
    pub material: &'a Material,
    pub cancel: CancellationToken,
}

impl<'a> BuildContext<'a> {
    pub fn new(profile: &'a Profile, material: &'a Material) -> Self {
        Self {
            profile,
            material,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// One written texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub tag: TextureTag,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub material: String,
    pub outputs: Vec<OutputSummary>,
    /// Frames stacked vertically in every output.
    pub frame_count: u32,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildReport {
    pub fn has_diagnostic(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Completed(BuildReport),
    /// The token fired before any output was written.
    Cancelled,
}

fn check_validation(what: String, result: ValidationResult) -> Result<(), TextureError> {
    let warnings = result
        .into_checked(what.as_str())
        .map_err(|e| TextureError::InvalidParameter(e.to_string()))?;
    for warning in &warnings {
        tracing::warn!(%warning, "{} warning", what);
    }
    Ok(())
}

/// Build every output texture of `ctx.profile` for `ctx.material`.
///
/// Cancellation is not an error: it yields [`BuildOutcome::Cancelled`].
#[tracing::instrument(skip_all, fields(material = %ctx.material.name, profile = %ctx.profile.name))]
pub fn build_material(
    ctx: &BuildContext<'_>,
    source: &dyn TextureSource,
    sink: &mut dyn TextureSink,
    samplers: &dyn SamplerRegistry,
) -> Result<BuildOutcome, TextureError> {
    match run_build(ctx, source, sink, samplers) {
        Ok(report) => {
            tracing::info!(
                outputs = report.outputs.len(),
                diagnostics = report.diagnostics.len(),
                "material built"
            );
            Ok(BuildOutcome::Completed(report))
        }
        Err(TextureError::Cancelled) => {
            tracing::info!("material build cancelled");
            Ok(BuildOutcome::Cancelled)
        }
        Err(e) => Err(e),
    }
}

struct LoadedSources {
    images: SourceImages,
    /// Sizes before resampling.
    original: HashMap<TextureTag, (u32, u32)>,
}

fn load_sources(
    ctx: &BuildContext<'_>,
    inputs: &TextureEncoding,
    source: &dyn TextureSource,
) -> Result<LoadedSources, TextureError> {
    let mut loaded = LoadedSources {
        images: SourceImages::new(),
        original: HashMap::new(),
    };
    for tag in inputs.tags() {
        ctx.cancel.check()?;
        match source.open_source_texture(&ctx.material.name, &tag)? {
            Some(image) if image.width > 0 && image.height > 0 => {
                tracing::debug!(%tag, width = image.width, height = image.height, "loaded source");
                loaded.original.insert(tag.clone(), (image.width, image.height));
                loaded.images.insert(tag, image);
            }
            _ => tracing::debug!(%tag, "source not present"),
        }
    }
    Ok(loaded)
}

/// Output size and frame count.
fn target_geometry(
    profile: &Profile,
    material: &Material,
    loaded: &LoadedSources,
) -> Result<(u32, u32, u32), TextureError> {
    let largest = loaded
        .images
        .values()
        .map(|i| (i.width, i.height))
        .max_by_key(|&(w, h)| (u64::from(w) * u64::from(h), w));

    let (width, height) = match (profile.texture_size, largest) {
        (Some(size), Some((w, h))) => {
            let scaled = (f64::from(size) * f64::from(h) / f64::from(w)).round() as u32;
            (size, scaled.max(1))
        }
        (None, Some(dims)) => dims,
        (Some(size), None) => (size, size * material.frame_count.unwrap_or(1)),
        (None, None) => {
            return Err(TextureError::MissingSource(format!(
                "material '{}' has no source textures and the profile sets no texture size",
                material.name
            )))
        }
    };

    let frames = material
        .frame_count
        .unwrap_or_else(|| (height / width).max(1));
    Ok((width, height, frames))
}

fn sampler_kind(
    tag: &TextureTag,
    inputs: &TextureEncoding,
    profile: &Profile,
    diagnostics: &mut Vec<Diagnostic>,
) -> SamplerKind {
    let name = inputs
        .iter()
        .filter(|c| &c.texture == tag)
        .find_map(|c| c.sampler.as_deref())
        .unwrap_or(&profile.sampler);
    match name.parse::<SamplerKind>() {
        Ok(kind) => kind,
        Err(_) => {
            record(
                diagnostics,
                Diagnostic::new(
                    DiagnosticCode::SamplerFallback,
                    None,
                    format!("unknown sampler '{}' for '{}'; using bilinear", name, tag),
                ),
            );
            SamplerKind::Bilinear
        }
    }
}

fn resample_sources(
    ctx: &BuildContext<'_>,
    inputs: &TextureEncoding,
    loaded: &mut LoadedSources,
    width: u32,
    height: u32,
    samplers: &dyn SamplerRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), TextureError> {
    let fallback = FilterSampler::bilinear();
    for tag in inputs.tags() {
        let Some(image) = loaded.images.get_mut(&tag) else {
            continue;
        };
        if image.width == width && image.height == height {
            continue;
        }
        ctx.cancel.check()?;
        let kind = sampler_kind(&tag, inputs, ctx.profile, diagnostics);
        let kernel: &dyn Resampler = match samplers.resolve_sampler(kind) {
            Some(kernel) => kernel,
            None => {
                record(
                    diagnostics,
                    Diagnostic::new(
                        DiagnosticCode::SamplerFallback,
                        None,
                        format!("sampler '{}' unavailable for '{}'; using bilinear", kind, tag),
                    ),
                );
                samplers
                    .resolve_sampler(SamplerKind::Bilinear)
                    .unwrap_or(&fallback)
            }
        };
        tracing::debug!(%tag, sampler = %kind, from_width = image.width, from_height = image.height, width, height, "resampling source");
        *image = kernel.resample(image, width, height)?;
    }
    Ok(())
}

fn requests_any(profile: &Profile, ids: &[ChannelId]) -> bool {
    profile
        .output
        .iter()
        .any(|c| ids.contains(&c.id) && c.has_color())
}

fn provides_any(available: &TextureEncoding, ids: &[ChannelId]) -> bool {
    available.iter().any(|c| ids.contains(&c.id) && c.has_color())
}

/// Compose the height channel into a field, or `None` when nothing
/// provides one.
fn build_height_field(
    ctx: &BuildContext<'_>,
    available: &TextureEncoding,
    loaded: &LoadedSources,
    width: u32,
    height: u32,
    frames: u32,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Option<HeightField>, TextureError> {
    let spec = EncodingChannelSpec::new(ChannelId::Height, HEIGHT_TAG, ColorChannel::Red);
    let scale = match resolve_channel(&spec, available, &ctx.material.scalars) {
        Resolution::Source(source) => loaded
            .original
            .get(&source.texture)
            .map(|&(w, _)| f64::from(width) / f64::from(w))
            .unwrap_or(1.0),
        Resolution::Constant(_) => 1.0,
        Resolution::ReconstructNormalZ | Resolution::Unresolved => {
            record(
                diagnostics,
                Diagnostic::new(
                    DiagnosticCode::HeightUnavailable,
                    Some(ChannelId::Height),
                    "generation requested but no height or depth source is available",
                ),
            );
            return Ok(None);
        }
    };

    let output = OutputTexture {
        tag: TextureTag::new(HEIGHT_TAG),
        channels: TextureEncoding::new(vec![spec]),
    };
    let (plan, _) = build_plan(&output, available, ctx.material);
    let image = compose(&plan, &loaded.images, width, height, &ctx.cancel)?;
    let frames = if frames > 0 && height % frames == 0 { frames } else { 1 };
    HeightField::from_image(&image, scale, frames).map(Some)
}

fn generated_normal_encoding(compressed: bool) -> TextureEncoding {
    standard_normal_encoding(GENERATED_NORMAL_TAG)
        .channels
        .into_iter()
        .filter(|c| !(compressed && c.id == ChannelId::NormalZ))
        .collect()
}

fn wants_normal_z(output: &OutputTexture) -> bool {
    output
        .channels
        .iter()
        .any(|c| c.id == ChannelId::NormalZ && c.has_color())
}

/// `available` with the compressed generated normal swapped for its
/// unit-vector copy, when one was produced.
fn vector_normal_inputs(
    available: &TextureEncoding,
    loaded: &LoadedSources,
) -> Option<TextureEncoding> {
    let vector_tag = TextureTag::new(GENERATED_NORMAL_VECTOR_TAG);
    if !loaded.images.contains_key(&vector_tag) {
        return None;
    }
    let normal_tag = TextureTag::new(GENERATED_NORMAL_TAG);
    Some(
        available
            .iter()
            .filter(|c| c.texture != normal_tag)
            .cloned()
            .chain(standard_normal_encoding(vector_tag).channels)
            .collect(),
    )
}

fn run_build(
    ctx: &BuildContext<'_>,
    source: &dyn TextureSource,
    sink: &mut dyn TextureSink,
    samplers: &dyn SamplerRegistry,
) -> Result<BuildReport, TextureError> {
    check_validation(
        format!("profile '{}'", ctx.profile.name),
        validate_profile(ctx.profile),
    )?;
    check_validation(
        format!("material '{}'", ctx.material.name),
        validate_material(ctx.material),
    )?;
    ctx.cancel.check()?;

    let material = ctx.material;
    let profile = ctx.profile;
    let inputs = material.input_encoding(profile);
    let mut diagnostics = Vec::new();

    let mut loaded = load_sources(ctx, inputs, source)?;
    let (width, height, frame_count) = target_geometry(profile, material, &loaded)?;
    tracing::debug!(width, height, frame_count, "target geometry");
    resample_sources(ctx, inputs, &mut loaded, width, height, samplers, &mut diagnostics)?;

    let mut available: TextureEncoding = inputs
        .iter()
        .filter(|c| loaded.images.contains_key(&c.texture))
        .cloned()
        .collect();

    let normal_ids = [ChannelId::NormalX, ChannelId::NormalY, ChannelId::NormalZ];
    let occlusion_ids = [ChannelId::Occlusion, ChannelId::Cavity];
    let want_normal = material.generate_normal
        && requests_any(profile, &normal_ids)
        && !provides_any(&available, &normal_ids[..2]);
    let want_occlusion = material.generate_occlusion
        && requests_any(profile, &occlusion_ids)
        && !provides_any(&available, &occlusion_ids);

    if want_normal || want_occlusion {
        let field = build_height_field(
            ctx,
            &available,
            &loaded,
            width,
            height,
            frame_count,
            &mut diagnostics,
        )?;
        if let Some(field) = field {
            if want_normal {
                let options = material.normal_options(profile);
                let normals = generate_normal_field(&field, &options, &ctx.cancel)?;
                let compressed = is_compressed(options.encoding);
                let image = encode_normal_field(&normals, options.encoding)?;
                loaded
                    .images
                    .insert(TextureTag::new(GENERATED_NORMAL_TAG), image);
                // Compressed X/Y are not vector components; Z must come from the field.
                if compressed && requests_any(profile, &[ChannelId::NormalZ]) {
                    let vector = encode_normal_field(&normals, NormalEncoding::Standard)?;
                    loaded
                        .images
                        .insert(TextureTag::new(GENERATED_NORMAL_VECTOR_TAG), vector);
                }
                available
                    .channels
                    .extend(generated_normal_encoding(compressed).channels);
                tracing::debug!(encoding = ?options.encoding, "generated normal map");
            }
            if want_occlusion {
                let options = material.occlusion_options(profile);
                let image = generate_occlusion(&field, &options, &ctx.cancel)?;
                loaded
                    .images
                    .insert(TextureTag::new(GENERATED_OCCLUSION_TAG), image);
                available.channels.push(EncodingChannelSpec::new(
                    ChannelId::Occlusion,
                    GENERATED_OCCLUSION_TAG,
                    ColorChannel::Red,
                ));
                tracing::debug!(quality = options.quality, "generated occlusion");
            }
        }
    }

    let vector_inputs = vector_normal_inputs(&available, &loaded);
    let mut composed = Vec::new();
    for output in profile.output_textures() {
        ctx.cancel.check()?;
        let inputs = match &vector_inputs {
            Some(vector) if wants_normal_z(&output) => vector,
            _ => &available,
        };
        let (plan, plan_diagnostics) = build_plan(&output, inputs, material);
        diagnostics.extend(plan_diagnostics);
        let image = compose(&plan, &loaded.images, width, height, &ctx.cancel)?;
        composed.push((output.tag, image));
    }

    // Nothing reaches the sink once the token has fired.
    ctx.cancel.check()?;
    let mut outputs = Vec::with_capacity(composed.len());
    for (tag, image) in composed {
        sink.write_output_texture(&material.name, &tag, &image)?;
        outputs.push(OutputSummary {
            tag,
            width: image.width,
            height: image.height,
            format: image.format,
        });
    }

    Ok(BuildReport {
        material: material.name.clone(),
        outputs,
        frame_count,
        diagnostics,
    })
}

/// True when any output is missing or older than the newest source.
pub fn needs_rebuild(
    profile: &Profile,
    material: &Material,
    source: &dyn TextureSource,
    sink: &dyn TextureSink,
) -> bool {
    let newest_source: Option<SystemTime> = material
        .input_encoding(profile)
        .tags()
        .iter()
        .filter_map(|tag| source.source_write_time(&material.name, tag))
        .max();

    let mut oldest_output: Option<SystemTime> = None;
    for output in profile.output_textures() {
        match sink.output_write_time(&material.name, &output.tag) {
            Some(time) => {
                oldest_output = Some(oldest_output.map_or(time, |t| t.min(time)));
            }
            None => return true,
        }
    }

    match (newest_source, oldest_output) {
        (Some(source), Some(output)) => source > output,
        (_, None) => true,
        (None, Some(_)) => false,
    }
}
