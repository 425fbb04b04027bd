//! Derivation rules.
//!
//! When no input carries a wanted channel directly, a semantically related
//! channel may stand in for it through a fixed conversion. The precedence
//! between candidate sources is the order of [`DERIVATION_RULES`].

use texpack_spec::ChannelId;

/// A named conversion from a related channel.
///
/// Value derivations act on the unmapped value (between unmap and the common
/// stage). Byte derivations act on the remapped output byte and wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Derivation {
    Identity,
    /// `1 - v`
    Invert,
    /// `sqrt(v)`
    Sqrt,
    /// `v²`
    Square,
    /// `sqrt(1 - v)`
    InvertThenSqrt,
    /// `1 - v²`
    InvertSquare,
    /// `v * 0.25`
    PorosityToPsss,
    /// `(65 + 190 v) / 255`
    SssToPsss,
    /// `(255 v - 65) / 190 + 0.5 / 255`
    PsssToSss,
    /// `byte - 1`, wrapping.
    ByteDecrement,
    /// `byte + 1`, wrapping.
    ByteIncrement,
}

impl Derivation {
    pub fn name(&self) -> &'static str {
        match self {
            Derivation::Identity => "identity",
            Derivation::Invert => "invert",
            Derivation::Sqrt => "sqrt",
            Derivation::Square => "square",
            Derivation::InvertThenSqrt => "invert-sqrt",
            Derivation::InvertSquare => "invert-square",
            Derivation::PorosityToPsss => "porosity-to-psss",
            Derivation::SssToPsss => "sss-to-psss",
            Derivation::PsssToSss => "psss-to-sss",
            Derivation::ByteDecrement => "byte-decrement",
            Derivation::ByteIncrement => "byte-increment",
        }
    }

    /// True for the rules that operate on output bytes.
    pub fn is_byte_wise(&self) -> bool {
        matches!(self, Derivation::ByteDecrement | Derivation::ByteIncrement)
    }

    /// Value-space step. Byte-wise derivations pass values through.
    pub fn apply_value(&self, v: f64) -> f64 {
        match self {
            Derivation::Identity | Derivation::ByteDecrement | Derivation::ByteIncrement => v,
            Derivation::Invert => 1.0 - v,
            Derivation::Sqrt => v.max(0.0).sqrt(),
            Derivation::Square => v * v,
            Derivation::InvertThenSqrt => (1.0 - v).max(0.0).sqrt(),
            Derivation::InvertSquare => 1.0 - v * v,
            Derivation::PorosityToPsss => v * 0.25,
            Derivation::SssToPsss => (65.0 + 190.0 * v) / 255.0,
            Derivation::PsssToSss => (v * 255.0 - 65.0) / 190.0 + 0.5 / 255.0,
        }
    }

    /// Byte step. Value derivations pass bytes through.
    pub fn apply_byte(&self, byte: u8) -> u8 {
        match self {
            Derivation::ByteDecrement => byte.wrapping_sub(1),
            Derivation::ByteIncrement => byte.wrapping_add(1),
            _ => byte,
        }
    }
}

/// `target` may be produced from `source` through `derivation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationRule {
    pub target: ChannelId,
    pub source: ChannelId,
    pub derivation: Derivation,
}

const fn rule(target: ChannelId, source: ChannelId, derivation: Derivation) -> DerivationRule {
    DerivationRule {
        target,
        source,
        derivation,
    }
}

/// Every derivation, in priority order per target.
pub const DERIVATION_RULES: &[DerivationRule] = &[
    rule(ChannelId::Height, ChannelId::Depth, Derivation::Invert),
    rule(ChannelId::Depth, ChannelId::Height, Derivation::Invert),
    rule(ChannelId::Occlusion, ChannelId::Cavity, Derivation::Invert),
    rule(ChannelId::Cavity, ChannelId::Occlusion, Derivation::Invert),
    rule(ChannelId::PerceptualSmooth, ChannelId::Smooth, Derivation::Sqrt),
    rule(ChannelId::Smooth, ChannelId::PerceptualSmooth, Derivation::Square),
    rule(ChannelId::Smooth, ChannelId::Rough, Derivation::Invert),
    rule(ChannelId::PerceptualSmooth, ChannelId::Rough, Derivation::InvertThenSqrt),
    rule(ChannelId::Rough, ChannelId::Smooth, Derivation::Invert),
    rule(ChannelId::Rough, ChannelId::PerceptualSmooth, Derivation::InvertSquare),
    rule(ChannelId::PorositySss, ChannelId::Porosity, Derivation::PorosityToPsss),
    rule(ChannelId::PorositySss, ChannelId::Sss, Derivation::SssToPsss),
    rule(ChannelId::Sss, ChannelId::PorositySss, Derivation::PsssToSss),
    rule(ChannelId::EmissiveClipped, ChannelId::Emissive, Derivation::ByteDecrement),
    rule(ChannelId::Emissive, ChannelId::EmissiveClipped, Derivation::ByteIncrement),
    rule(ChannelId::Emissive, ChannelId::EmissiveInverse, Derivation::Invert),
    rule(ChannelId::EmissiveInverse, ChannelId::Emissive, Derivation::Invert),
];

/// Rules that can produce `target`, highest priority first.
pub fn rules_for(target: ChannelId) -> impl Iterator<Item = &'static DerivationRule> {
    DERIVATION_RULES.iter().filter(move |r| r.target == target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn byte(v: f64) -> u8 {
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    }

    fn value(b: u8) -> f64 {
        f64::from(b) / 255.0
    }

    #[test]
    fn smooth_prefers_perceptual_over_rough() {
        let sources: Vec<ChannelId> = rules_for(ChannelId::Smooth).map(|r| r.source).collect();
        assert_eq!(sources, vec![ChannelId::PerceptualSmooth, ChannelId::Rough]);
    }

    #[test]
    fn every_target_has_unique_sources() {
        for r in DERIVATION_RULES {
            let same = DERIVATION_RULES
                .iter()
                .filter(|o| o.target == r.target && o.source == r.source)
                .count();
            assert_eq!(same, 1, "{:?} <- {:?}", r.target, r.source);
            assert_ne!(r.target, r.source);
        }
    }

    #[test]
    fn rough_smooth_is_exact_complement() {
        for (rough, smooth) in [(0u8, 255u8), (100, 155), (155, 100), (255, 0)] {
            assert_eq!(byte(Derivation::Invert.apply_value(value(rough))), smooth);
        }
    }

    #[test]
    fn porosity_to_psss() {
        let got: Vec<u8> = [0u8, 100, 200, 255]
            .iter()
            .map(|&b| byte(Derivation::PorosityToPsss.apply_value(value(b))))
            .collect();
        assert_eq!(got, vec![0, 25, 50, 64]);
    }

    #[test]
    fn sss_to_psss() {
        let got: Vec<u8> = [0u8, 100, 200, 253, 255]
            .iter()
            .map(|&b| byte(Derivation::SssToPsss.apply_value(value(b))))
            .collect();
        assert_eq!(got, vec![65, 140, 214, 254, 255]);
    }

    #[test]
    fn psss_to_sss_inverts_sss_to_psss() {
        for b in [0u8, 64, 128, 200, 255] {
            let psss = Derivation::SssToPsss.apply_value(value(b));
            let back = byte(Derivation::PsssToSss.apply_value(psss));
            assert!((i32::from(back) - i32::from(b)).abs() <= 1, "{} -> {}", b, back);
        }
    }

    #[test]
    fn emissive_clip_wraps() {
        let clip = Derivation::ByteDecrement;
        let unclip = Derivation::ByteIncrement;
        assert_eq!(clip.apply_byte(0), 255);
        assert_eq!(clip.apply_byte(1), 0);
        assert_eq!(clip.apply_byte(128), 127);
        assert_eq!(clip.apply_byte(255), 254);
        for b in 0..=255u8 {
            assert_eq!(unclip.apply_byte(clip.apply_byte(b)), b);
        }
        assert!(clip.is_byte_wise());
        assert_eq!(clip.apply_value(0.3), 0.3);
    }

    #[test]
    fn perceptual_smooth_conversions() {
        assert!((Derivation::Sqrt.apply_value(0.25) - 0.5).abs() < 1e-12);
        assert!((Derivation::Square.apply_value(0.5) - 0.25).abs() < 1e-12);
        assert!((Derivation::InvertThenSqrt.apply_value(0.75) - 0.5).abs() < 1e-12);
        assert!((Derivation::InvertSquare.apply_value(0.5) - 0.75).abs() < 1e-12);
    }
}
