//! Source data model for zkport.
//!
//! A guest or host program is viewed as an ordered list of [`Segment`]s:
//! opaque [`PureSpan`]s copied verbatim, and [`Construct`]s, the recognized
//! platform-specific call sites that the transfer engine rewrites.

pub mod construct;
pub mod hash;
pub mod span;

pub use construct::{
    CallForm, CallSite, Construct, ConstructId, ConstructKind, Direction, EntryCapture,
    EntryParam, PureSpan, Segment, Side,
};
pub use hash::Fingerprint;
pub use span::{Position, Span};
