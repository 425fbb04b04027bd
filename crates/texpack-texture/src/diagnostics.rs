//! Non-fatal build diagnostics.
//!
//! Problems the pipeline recovers from locally (an unresolved channel, an
//! ambiguous magnitude mapping) are logged with `tracing` and also collected
//! into the build report.

use std::fmt;

use texpack_spec::ChannelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// D001: No literal, scalar, direct or derived source for a channel.
    UnresolvedChannel,
    /// D002: Normal Z reconstruction or magnitude needs X and Y, which are missing.
    MissingNormalComponents,
    /// D003: Several channels compete for the magnitude slot.
    MultipleMagnitudeMappings,
    /// D004: Requested sampler is unknown or unavailable; bilinear used instead.
    SamplerFallback,
    /// D005: Normal or occlusion generation requested without a height source.
    HeightUnavailable,
}

impl DiagnosticCode {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticCode::UnresolvedChannel => "D001",
            DiagnosticCode::MissingNormalComponents => "D002",
            DiagnosticCode::MultipleMagnitudeMappings => "D003",
            DiagnosticCode::SamplerFallback => "D004",
            DiagnosticCode::HeightUnavailable => "D005",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub channel: Option<ChannelId>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, channel: Option<ChannelId>, message: impl Into<String>) -> Self {
        Self {
            code,
            channel,
            message: message.into(),
        }
    }

    /// Log this diagnostic at warn level.
    pub fn emit(&self) {
        match self.channel {
            Some(channel) => tracing::warn!(code = %self.code, %channel, "{}", self.message),
            None => tracing::warn!(code = %self.code, "{}", self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.channel {
            Some(channel) => write!(f, "{} [{}]: {}", self.code, channel, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Emit and keep.
pub(crate) fn record(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    diagnostic.emit();
    diagnostics.push(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_channel() {
        let d = Diagnostic::new(
            DiagnosticCode::UnresolvedChannel,
            Some(ChannelId::Metal),
            "left at default",
        );
        assert_eq!(d.to_string(), "D001 [metal]: left at default");
        let d = Diagnostic::new(DiagnosticCode::SamplerFallback, None, "using bilinear");
        assert_eq!(d.to_string(), "D004: using bilinear");
    }
}
