//! Analysis and transfer errors.

use thiserror::Error;
use zkport_core::{Position, Side};

use crate::sequence::Channel;

/// Errors that fail the analysis of one source unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("malformed source at {position} (byte {offset}): {detail}")]
    MalformedSource {
        offset: usize,
        position: Position,
        detail: String,
    },

    #[error("unit has {found} constructs, more than the limit of {limit}")]
    ConstructLimit { limit: usize, found: usize },
}

/// Errors surfaced by `assess` and `generate`.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{side} unit failed analysis: {error}")]
    UnitFailed { side: Side, error: AnalysisError },

    #[error(
        "ordering violation on the {channel} input channel: guest reads {guest:?} do not pair with host writes {host:?}"
    )]
    OrderingViolation {
        channel: Channel,
        guest: Vec<usize>,
        host: Vec<usize>,
    },

    #[error("incomplete resolution of the {side} unit: {detail}")]
    Incomplete { side: Side, detail: String },

    #[error("{platform} has no {kind} template for the {side} side")]
    MissingTemplate {
        platform: String,
        side: Side,
        kind: String,
    },
}

pub type Result<T> = std::result::Result<T, TransferError>;
