//! Warnings attached to resolutions and surfaced in the report.

use std::fmt;

use serde::Serialize;
use zkport_core::{ConstructId, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningCode {
    RecognitionAmbiguity,
    StreamingIo,
    AlignmentPadding,
    ChannelClassification,
    HintMerged,
    Rerouted,
    PrecompileDegraded,
    CycleCountUnavailable,
    ConstantStub,
    EntryStyle,
    Impossible,
    SequenceGap,
    SequenceKindMismatch,
    HostRewrite,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::RecognitionAmbiguity => "recognition-ambiguity",
            WarningCode::StreamingIo => "streaming-io",
            WarningCode::AlignmentPadding => "alignment-padding",
            WarningCode::ChannelClassification => "channel-classification",
            WarningCode::HintMerged => "hint-merged",
            WarningCode::Rerouted => "rerouted",
            WarningCode::PrecompileDegraded => "precompile-degraded",
            WarningCode::CycleCountUnavailable => "cycle-count-unavailable",
            WarningCode::ConstantStub => "constant-stub",
            WarningCode::EntryStyle => "entry-style",
            WarningCode::Impossible => "impossible",
            WarningCode::SequenceGap => "sequence-gap",
            WarningCode::SequenceKindMismatch => "sequence-kind-mismatch",
            WarningCode::HostRewrite => "host-rewrite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub side: Side,
    pub construct: Option<ConstructId>,
    pub code: WarningCode,
    pub message: String,
    /// The caller must confirm the decision before generating.
    pub requires_confirmation: bool,
}

impl Warning {
    pub fn new(side: Side, construct: ConstructId, code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            side,
            construct: Some(construct),
            code,
            message: message.into(),
            requires_confirmation: false,
        }
    }

    pub fn requiring_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.construct {
            Some(id) => write!(f, "[{} {}] ", self.side, id)?,
            None => write!(f, "[{}] ", self.side)?,
        }
        write!(f, "{}: {}", self.code.as_str(), self.message)?;
        if self.requires_confirmation {
            write!(f, " (confirmation required)")?;
        }
        Ok(())
    }
}
