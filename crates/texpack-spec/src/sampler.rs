//! Resampling kernel names.
//!
//! Kernels themselves live with whoever resizes images; configuration only
//! ever names them.

use std::fmt;
use std::str::FromStr;

use crate::channel::ParseChannelError;

/// Named resampling kernels a profile or channel may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerKind {
    Nearest,
    Box,
    Bilinear,
    Bicubic,
    CatmullRom,
    Hermite,
    Spline,
    Welch,
    Lanczos2,
    Lanczos3,
    Lanczos5,
    Lanczos8,
}

impl SamplerKind {
    pub const ALL: [SamplerKind; 12] = [
        SamplerKind::Nearest,
        SamplerKind::Box,
        SamplerKind::Bilinear,
        SamplerKind::Bicubic,
        SamplerKind::CatmullRom,
        SamplerKind::Hermite,
        SamplerKind::Spline,
        SamplerKind::Welch,
        SamplerKind::Lanczos2,
        SamplerKind::Lanczos3,
        SamplerKind::Lanczos5,
        SamplerKind::Lanczos8,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SamplerKind::Nearest => "nearest",
            SamplerKind::Box => "box",
            SamplerKind::Bilinear => "bilinear",
            SamplerKind::Bicubic => "bicubic",
            SamplerKind::CatmullRom => "catmull-rom",
            SamplerKind::Hermite => "hermite",
            SamplerKind::Spline => "spline",
            SamplerKind::Welch => "welch",
            SamplerKind::Lanczos2 => "lanczos-2",
            SamplerKind::Lanczos3 => "lanczos-3",
            SamplerKind::Lanczos5 => "lanczos-5",
            SamplerKind::Lanczos8 => "lanczos-8",
        }
    }
}

impl fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SamplerKind {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let folded = match folded.as_str() {
            "point" => "nearest".to_string(),
            "linear" => "bilinear".to_string(),
            "cubic" => "bicubic".to_string(),
            "lanczos" => "lanczos3".to_string(),
            _ => folded,
        };
        SamplerKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().replace('-', "") == folded)
            .ok_or_else(|| ParseChannelError {
                kind: "sampler",
                name: s.to_string(),
            })
    }
}
