//! Recognized platform constructs and the segments that tile a source unit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Which program of a guest/host pair a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    /// The program executed (and proven) inside the zkVM.
    Guest,
    /// The program that feeds input to the guest and reads its output.
    Host,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Guest => "guest",
            Side::Host => "host",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of an I/O construct relative to the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Data flowing from host to guest (guest reads, host writes).
    Input,
    /// Data flowing from guest to host (guest commits, host reads).
    Output,
}

/// The closed vocabulary of platform constructs.
///
/// On the host side the input kinds name the *writing* half of the same
/// channel: a host `stdin.write(&x)` is a `StructuredRead` construct because
/// it feeds the guest's structured read at the same sequence index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstructKind {
    EntryPoint,
    StructuredRead,
    StructuredCommit,
    RawRead,
    RawCommit,
    CycleCount,
    Hint,
    PrecompileCall,
}

impl ConstructKind {
    pub const ALL: [ConstructKind; 8] = [
        ConstructKind::EntryPoint,
        ConstructKind::StructuredRead,
        ConstructKind::StructuredCommit,
        ConstructKind::RawRead,
        ConstructKind::RawCommit,
        ConstructKind::CycleCount,
        ConstructKind::Hint,
        ConstructKind::PrecompileCall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstructKind::EntryPoint => "entry-point",
            ConstructKind::StructuredRead => "structured-read",
            ConstructKind::StructuredCommit => "structured-commit",
            ConstructKind::RawRead => "raw-read",
            ConstructKind::RawCommit => "raw-commit",
            ConstructKind::CycleCount => "cycle-count",
            ConstructKind::Hint => "hint",
            ConstructKind::PrecompileCall => "precompile-call",
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            ConstructKind::StructuredRead | ConstructKind::RawRead | ConstructKind::Hint => {
                Some(Direction::Input)
            }
            ConstructKind::StructuredCommit | ConstructKind::RawCommit => Some(Direction::Output),
            ConstructKind::EntryPoint | ConstructKind::CycleCount | ConstructKind::PrecompileCall => {
                None
            }
        }
    }

    /// Whether the construct moves untyped bytes (and is subject to alignment).
    pub fn is_raw(&self) -> bool {
        matches!(self, ConstructKind::RawRead | ConstructKind::RawCommit)
    }

    /// Classification precedence: lower wins when a call shape is ambiguous.
    ///
    /// Entry markers first, then I/O primitives, then precompiles.
    pub fn precedence(&self) -> u8 {
        match self {
            ConstructKind::EntryPoint => 0,
            ConstructKind::StructuredRead
            | ConstructKind::StructuredCommit
            | ConstructKind::RawRead
            | ConstructKind::RawCommit
            | ConstructKind::CycleCount
            | ConstructKind::Hint => 1,
            ConstructKind::PrecompileCall => 2,
        }
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of a construct within its unit's construct list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstructId(pub usize);

impl fmt::Display for ConstructId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a read returns its value or fills a caller-provided buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallForm {
    #[default]
    Value,
    /// `read_slice(&mut buf)`: the destination is named in [`CallSite::dst`].
    Fill,
}

/// One parameter of an entry function header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryParam {
    pub name: String,
    pub ty: String,
}

/// What the analyzer learned about an entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCapture {
    /// Name of the entry function.
    pub name: String,
    /// Header parameters (function-invocation platforms only).
    pub params: Vec<EntryParam>,
    /// Declared return type, if any.
    pub ret: Option<String>,
}

/// Captured pieces of a recognized call site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Canonical path of the matched shape, after alias resolution.
    pub path: String,
    /// Argument text between the call parentheses, trimmed.
    pub args: Option<String>,
    /// Where [`CallSite::args`] sits in the unit text.
    pub args_span: Option<Span>,
    /// Receiver expression text for method and field shapes.
    pub receiver: Option<String>,
    /// Variable bound by `let <binding> = <call>`.
    pub binding: Option<String>,
    /// Precompile operation name (e.g. `sha256`).
    pub operation: Option<String>,
    pub form: CallForm,
    /// Destination buffer of a fill-form read.
    pub dst: Option<String>,
    pub entry: Option<EntryCapture>,
}

/// One recognized platform-specific call site. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Construct {
    pub id: ConstructId,
    pub side: Side,
    pub kind: ConstructKind,
    pub source_span: Span,
    /// Header of the entry function, rewritten together with the marker.
    pub signature_span: Option<Span>,
    pub declared_type: Option<String>,
    /// Position among same-direction I/O constructs of the same side.
    pub sequence_index: Option<usize>,
    /// Innermost construct whose arguments contain this one.
    pub parent: Option<ConstructId>,
    pub call: CallSite,
}

impl Construct {
    pub fn direction(&self) -> Option<Direction> {
        self.kind.direction()
    }

    pub fn is_input(&self) -> bool {
        self.direction() == Some(Direction::Input)
    }

    pub fn is_output(&self) -> bool {
        self.direction() == Some(Direction::Output)
    }
}

/// A source region that is not part of any construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PureSpan {
    pub span: Span,
}

/// One tile of an analyzed unit; the tiles cover the text in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "segment", rename_all = "kebab-case")]
pub enum Segment {
    Pure(PureSpan),
    Construct { id: ConstructId, span: Span },
    /// The entry function header owned by the entry-point construct `id`.
    Signature { id: ConstructId, span: Span },
}

impl Segment {
    pub fn span(&self) -> Span {
        match self {
            Segment::Pure(p) => p.span,
            Segment::Construct { span, .. } | Segment::Signature { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions() {
        assert_eq!(ConstructKind::StructuredRead.direction(), Some(Direction::Input));
        assert_eq!(ConstructKind::Hint.direction(), Some(Direction::Input));
        assert_eq!(ConstructKind::RawCommit.direction(), Some(Direction::Output));
        assert_eq!(ConstructKind::CycleCount.direction(), None);
        assert_eq!(ConstructKind::EntryPoint.direction(), None);
    }

    #[test]
    fn precedence_orders_entry_io_precompile() {
        assert!(ConstructKind::EntryPoint.precedence() < ConstructKind::RawRead.precedence());
        assert!(ConstructKind::Hint.precedence() < ConstructKind::PrecompileCall.precedence());
    }

    #[test]
    fn kind_names_are_kebab_case() {
        for kind in ConstructKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn segment_span() {
        let seg = Segment::Construct {
            id: ConstructId(0),
            span: Span::new(3, 9),
        };
        assert_eq!(seg.span(), Span::new(3, 9));
    }
}
