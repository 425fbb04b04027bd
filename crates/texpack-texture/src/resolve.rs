//! Channel resolution.
//!
//! For every wanted output channel, decide where its value comes from, in
//! this order (first match wins):
//!
//! 1. a literal value on the output channel;
//! 2. a material scalar for the channel;
//! 3. an input carrying the same channel;
//! 4. an input carrying a related channel, through a [`Derivation`], trying
//!    [`DERIVATION_RULES`](crate::derivation::DERIVATION_RULES) in order;
//! 5. for normal Z only, reconstruction from X and Y after composition.
//!
//! Anything else is left at its default byte with a diagnostic.

use std::collections::HashSet;

use texpack_spec::{
    ChannelId, ColorChannel, EncodingChannelSpec, Material, MaterialScalars, OutputTexture,
    TextureEncoding, TextureTag,
};

use crate::buffer::PixelFormat;
use crate::derivation::{rules_for, Derivation};
use crate::diagnostics::{record, Diagnostic, DiagnosticCode};
use crate::mapping::{MappingSide, PixelMapping};

/// Index of the magnitude plane in a composition work pixel (after RGBA).
pub const MAGNITUDE_SLOT: usize = 4;

/// Working slot for a color channel: RGBA are 0..4, magnitude is
/// [`MAGNITUDE_SLOT`], `None` has no slot.
pub fn work_slot(color: ColorChannel) -> Option<usize> {
    match color {
        ColorChannel::Magnitude => Some(MAGNITUDE_SLOT),
        other => other.index(),
    }
}

/// Where a resolved output channel reads from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub texture: TextureTag,
    pub color: ColorChannel,
    /// Encoding of the source channel.
    pub input: EncodingChannelSpec,
    pub derivation: Derivation,
}

impl ResolvedSource {
    fn new(input: &EncodingChannelSpec, derivation: Derivation) -> Self {
        Self {
            texture: input.texture.clone(),
            color: input.color,
            input: input.clone(),
            derivation,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Value-space constant.
    Constant(f64),
    Source(ResolvedSource),
    ReconstructNormalZ,
    Unresolved,
}

/// Resolve one output channel against the available inputs.
pub fn resolve_channel(
    output: &EncodingChannelSpec,
    inputs: &TextureEncoding,
    scalars: &MaterialScalars,
) -> Resolution {
    if let Some(value) = output.value {
        return Resolution::Constant(value);
    }
    if let Some(value) = scalars.scalar_for(output.id) {
        return Resolution::Constant(value);
    }
    if let Some(input) = inputs.find_mapped(output.id) {
        return Resolution::Source(ResolvedSource::new(input, Derivation::Identity));
    }
    for rule in rules_for(output.id) {
        if let Some(input) = inputs.find_mapped(rule.source) {
            return Resolution::Source(ResolvedSource::new(input, rule.derivation));
        }
    }
    if output.id == ChannelId::NormalZ {
        return Resolution::ReconstructNormalZ;
    }
    Resolution::Unresolved
}

/// One channel copied out of a source texture.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWrite {
    /// Output channel being written.
    pub channel: ChannelId,
    /// Slot read in the source (may be [`ColorChannel::Magnitude`]).
    pub source_color: ColorChannel,
    /// Work slot written in the destination.
    pub target: usize,
    pub mapping: PixelMapping,
    pub derivation: Derivation,
}

/// All writes that read from one source texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePass {
    pub tag: TextureTag,
    pub writes: Vec<PlannedWrite>,
}

/// A destination slot and how it is encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotEncoding {
    pub slot: usize,
    pub side: MappingSide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalZReconstruction {
    pub x: SlotEncoding,
    pub y: SlotEncoding,
    pub z: SlotEncoding,
}

/// Scale the composed normal by the magnitude plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeApplication {
    pub x: SlotEncoding,
    pub y: SlotEncoding,
    pub z: SlotEncoding,
    /// Encoding of the magnitude plane.
    pub magnitude: MappingSide,
}

/// Everything needed to compose one output texture.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionPlan {
    pub tag: TextureTag,
    pub format: PixelFormat,
    /// Initial bytes of every work slot (RGBA + magnitude).
    pub defaults: [u8; 5],
    /// Slots written with a fixed byte.
    pub constants: Vec<(usize, u8)>,
    /// Source passes in input order.
    pub passes: Vec<SourcePass>,
    pub reconstruct_z: Option<NormalZReconstruction>,
    pub magnitude: Option<MagnitudeApplication>,
}

impl CompositionPlan {
    /// Tags this plan reads.
    pub fn source_tags(&self) -> impl Iterator<Item = &TextureTag> {
        self.passes.iter().map(|p| &p.tag)
    }
}

fn slot_encoding(output: &TextureEncoding, id: ChannelId) -> Option<SlotEncoding> {
    output
        .iter()
        .find(|c| c.id == id && c.color.index().is_some())
        .and_then(|c| {
            c.color.index().map(|slot| SlotEncoding {
                slot,
                side: MappingSide::from_spec(c),
            })
        })
}

/// Resolve every channel of `output` and group the result into a plan.
///
/// `inputs` must list only channels whose textures are actually available.
pub fn build_plan(
    output: &OutputTexture,
    inputs: &TextureEncoding,
    material: &Material,
) -> (CompositionPlan, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let slots: Vec<ColorChannel> = output.channels.iter().map(|c| c.color).collect();
    let mut plan = CompositionPlan {
        tag: output.tag.clone(),
        format: PixelFormat::for_channels(&slots),
        defaults: [0, 0, 0, 255, 255],
        constants: Vec::new(),
        passes: Vec::new(),
        reconstruct_z: None,
        magnitude: None,
    };

    let magnitude_inputs = inputs
        .iter()
        .filter(|c| c.color == ColorChannel::Magnitude)
        .count();

    let mut writes: Vec<(TextureTag, PlannedWrite)> = Vec::new();
    let mut resolved: HashSet<ChannelId> = HashSet::new();
    let mut reconstruct: Option<&EncodingChannelSpec> = None;
    let mut magnitude_spec: Option<&EncodingChannelSpec> = None;

    for spec in output.channels.iter() {
        let Some(target) = work_slot(spec.color) else {
            continue;
        };
        if target == MAGNITUDE_SLOT {
            if magnitude_spec.is_some() {
                record(
                    &mut diagnostics,
                    Diagnostic::new(
                        DiagnosticCode::MultipleMagnitudeMappings,
                        Some(spec.id),
                        format!(
                            "output '{}' maps more than one channel to magnitude; keeping the first",
                            output.tag
                        ),
                    ),
                );
                continue;
            }
            magnitude_spec = Some(spec);
        }

        match resolve_channel(spec, inputs, &material.scalars) {
            Resolution::Constant(value) => {
                plan.constants
                    .push((target, MappingSide::from_spec(spec).encode(value)));
                resolved.insert(spec.id);
            }
            Resolution::Source(source) => {
                if source.color == ColorChannel::Magnitude && magnitude_inputs > 1 {
                    record(
                        &mut diagnostics,
                        Diagnostic::new(
                            DiagnosticCode::MultipleMagnitudeMappings,
                            Some(spec.id),
                            format!(
                                "{} inputs are mapped to magnitude; reading '{}'",
                                magnitude_inputs, source.texture
                            ),
                        ),
                    );
                }
                let (shift, scale) = material.adjustment_for(spec.id);
                let write = PlannedWrite {
                    channel: spec.id,
                    source_color: source.color,
                    target,
                    mapping: PixelMapping::between(&source.input, spec)
                        .with_adjustment(shift, scale),
                    derivation: source.derivation,
                };
                writes.push((source.texture, write));
                resolved.insert(spec.id);
            }
            Resolution::ReconstructNormalZ => {
                reconstruct = Some(spec);
            }
            Resolution::Unresolved => {
                let default = spec.id.default_byte().max(spec.color.default_byte());
                plan.constants.push((target, default));
                record(
                    &mut diagnostics,
                    Diagnostic::new(
                        DiagnosticCode::UnresolvedChannel,
                        Some(spec.id),
                        format!(
                            "no source for '{}' in output '{}'; left at {}",
                            spec.id, output.tag, default
                        ),
                    ),
                );
                if target == MAGNITUDE_SLOT {
                    magnitude_spec = None;
                }
            }
        }
    }

    // Group writes per source tag, tags in input order.
    for tag in inputs.tags() {
        let tag_writes: Vec<PlannedWrite> = writes
            .iter()
            .filter(|(t, _)| *t == tag)
            .map(|(_, w)| w.clone())
            .collect();
        if !tag_writes.is_empty() {
            plan.passes.push(SourcePass {
                tag,
                writes: tag_writes,
            });
        }
    }

    let x = slot_encoding(&output.channels, ChannelId::NormalX)
        .filter(|_| resolved.contains(&ChannelId::NormalX));
    let y = slot_encoding(&output.channels, ChannelId::NormalY)
        .filter(|_| resolved.contains(&ChannelId::NormalY));

    if let Some(z_spec) = reconstruct {
        match (x, y, z_spec.color.index()) {
            (Some(x), Some(y), Some(slot)) => {
                plan.reconstruct_z = Some(NormalZReconstruction {
                    x,
                    y,
                    z: SlotEncoding {
                        slot,
                        side: MappingSide::from_spec(z_spec),
                    },
                });
                resolved.insert(ChannelId::NormalZ);
            }
            _ => record(
                &mut diagnostics,
                Diagnostic::new(
                    DiagnosticCode::MissingNormalComponents,
                    Some(ChannelId::NormalZ),
                    format!(
                        "cannot reconstruct normal Z in '{}' without normal X and Y",
                        output.tag
                    ),
                ),
            ),
        }
    }

    if let Some(m_spec) = magnitude_spec {
        let z = slot_encoding(&output.channels, ChannelId::NormalZ)
            .filter(|_| resolved.contains(&ChannelId::NormalZ));
        match (x, y, z) {
            (Some(x), Some(y), Some(z)) => {
                plan.magnitude = Some(MagnitudeApplication {
                    x,
                    y,
                    z,
                    magnitude: MappingSide::from_spec(m_spec),
                });
            }
            _ => record(
                &mut diagnostics,
                Diagnostic::new(
                    DiagnosticCode::MissingNormalComponents,
                    Some(m_spec.id),
                    format!(
                        "magnitude in '{}' needs normal X, Y and Z; not applied",
                        output.tag
                    ),
                ),
            ),
        }
    }

    (plan, diagnostics)
}
