//! Transfer engine for zkport.
//!
//! Moves a zkVM guest/host program pair from one platform to another through
//! a fixed pipeline: source analysis, compatibility resolution, I/O
//! sequencing, and code generation. `assess` runs everything up to the
//! report and returns an immutable [`TransferPlan`]; `generate` emits the
//! target sources only after the caller confirms the plan.
//!
//! ## Modules
//!
//! - [`analyze`] — Construct recognition and pure-span tiling
//! - [`hint`] — Proven/hint channel classification of guest inputs
//! - [`resolve`] — Per-construct compatibility decisions
//! - [`sequence`] — Guest read / host write pairing per input channel
//! - [`codegen`] — Target source emission
//! - [`report`] — Bucketed transfer report
//! - [`pipeline`] — `assess` and `generate`

pub mod analyze;
pub mod codegen;
pub mod error;
pub mod hint;
pub mod pipeline;
pub mod plan;
pub mod report;
pub mod resolve;
pub mod sequence;
pub mod warning;

#[cfg(test)]
mod fixtures;

pub use analyze::{analyze, AnalyzedUnit, AnalyzerConfig};
pub use codegen::{Artifacts, ChangeRecord};
pub use error::{AnalysisError, Result, TransferError};
pub use pipeline::{assess, generate, Assessment};
pub use plan::{ConfirmedPlan, TransferConfig, TransferPlan, TransferRequest, UnitAnalysis, UnitPlan};
pub use report::{Bucket, Report, ReportEntry, Totals};
pub use resolve::{Action, Adaptation, Resolution, Unsupported};
pub use sequence::{Channel, OrderingViolation, SequenceLedger};
pub use warning::{Warning, WarningCode};
