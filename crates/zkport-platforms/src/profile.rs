//! Platform profile rows.
//!
//! A profile is pure data: the vocabulary that recognizes and emits each
//! construct kind, the platform's I/O semantics, its precompile table, and the
//! fallback policy for kinds it lacks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use zkport_core::{ConstructKind, Side};

use crate::capability::FallbackPolicy;
use crate::platform::PlatformId;
use crate::shape::CallShape;
use crate::template::Template;

/// How a guest program declares its entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStyle {
    /// `entrypoint!(main);` naming a plain `fn main()`.
    Macro,
    /// An attribute directly on a streaming `fn main()`.
    Attribute,
    /// An attribute on a function whose parameters are the inputs and whose
    /// return value is the output; no streaming I/O.
    FunctionInvocation,
}

impl EntryStyle {
    /// Whether the marker must sit immediately before the entry function.
    pub fn marker_precedes_signature(&self) -> bool {
        !matches!(self, EntryStyle::Macro)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStyle::Macro => "macro",
            EntryStyle::Attribute => "attribute",
            EntryStyle::FunctionInvocation => "function-invocation",
        }
    }
}

/// Raw data transfer granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    /// Raw buffers move in whole words; payloads are padded to the word size.
    WordAligned,
    ByteAligned,
    /// The platform has no raw I/O.
    NotApplicable,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::WordAligned => "word-aligned",
            Alignment::ByteAligned => "byte-aligned",
            Alignment::NotApplicable => "not-applicable",
        }
    }
}

/// Availability of an accelerated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecompileStatus {
    Accelerated,
    Software,
    Unavailable,
}

/// A crate the generated program needs, for an external manifest emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LogicalDependency {
    pub name: String,
    pub version: semver::Version,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default = "default_side")]
    pub side: Side,
    /// Where a patched build of the crate lives, if not crates.io.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

fn default_side() -> Side {
    Side::Guest
}

/// Recognition shapes and emission templates for one construct kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KindEntry {
    pub shapes: Vec<CallShape>,
    /// Value-form emission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    /// Fill-form emission (`{dst}` names the buffer).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Template>,
    /// Entry marker (macro invocation or attribute).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Template>,
    /// Entry function header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Template>,
}

impl KindEntry {
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        [&self.template, &self.fill, &self.marker, &self.signature]
            .into_iter()
            .flatten()
    }
}

/// One side's construct vocabulary. Precompiles live in their own table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Vocabulary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<KindEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_read: Option<KindEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_commit: Option<KindEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_read: Option<KindEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_commit: Option<KindEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<KindEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<KindEntry>,
}

impl Vocabulary {
    pub fn get(&self, kind: ConstructKind) -> Option<&KindEntry> {
        match kind {
            ConstructKind::EntryPoint => self.entry_point.as_ref(),
            ConstructKind::StructuredRead => self.structured_read.as_ref(),
            ConstructKind::StructuredCommit => self.structured_commit.as_ref(),
            ConstructKind::RawRead => self.raw_read.as_ref(),
            ConstructKind::RawCommit => self.raw_commit.as_ref(),
            ConstructKind::CycleCount => self.cycle_count.as_ref(),
            ConstructKind::Hint => self.hint.as_ref(),
            ConstructKind::PrecompileCall => None,
        }
    }

    /// Present entries in [`ConstructKind::ALL`] order.
    pub fn entries(&self) -> impl Iterator<Item = (ConstructKind, &KindEntry)> {
        ConstructKind::ALL
            .into_iter()
            .filter_map(move |kind| self.get(kind).map(|e| (kind, e)))
    }
}

/// Fallback policy per kind the platform lacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FallbackTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<FallbackPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_read: Option<FallbackPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_commit: Option<FallbackPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_read: Option<FallbackPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_commit: Option<FallbackPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<FallbackPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<FallbackPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precompile_call: Option<FallbackPolicy>,
}

impl FallbackTable {
    /// Policy for `kind`; [`FallbackPolicy::None`] when the row is silent.
    pub fn get(&self, kind: ConstructKind) -> FallbackPolicy {
        let policy = match kind {
            ConstructKind::EntryPoint => &self.entry_point,
            ConstructKind::StructuredRead => &self.structured_read,
            ConstructKind::StructuredCommit => &self.structured_commit,
            ConstructKind::RawRead => &self.raw_read,
            ConstructKind::RawCommit => &self.raw_commit,
            ConstructKind::CycleCount => &self.cycle_count,
            ConstructKind::Hint => &self.hint,
            ConstructKind::PrecompileCall => &self.precompile_call,
        };
        policy.clone().unwrap_or(FallbackPolicy::None)
    }

    pub fn is_declared(&self, kind: ConstructKind) -> bool {
        !matches!(self.get(kind), FallbackPolicy::None)
    }
}

/// One precompile operation on one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PrecompileEntry {
    pub status: PrecompileStatus,
    pub shapes: Vec<CallShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<LogicalDependency>,
}

/// Templates that collapse unsupported streaming I/O into aggregate values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BundleTemplates {
    /// Entry function header taking the aggregate input and producing the
    /// aggregate output; the original body follows it.
    pub guest_signature: Template,
    pub guest_read: Template,
    pub guest_fill: Template,
    pub guest_commit: Template,
    /// Host expression creating the aggregate input value.
    pub host_channel: Template,
    pub host_write: Template,
    pub host_output: Template,
    /// Host statement running the bundled guest once and binding its
    /// aggregate output to `__output`.
    pub host_invoke: Template,
}

impl BundleTemplates {
    pub fn templates(&self) -> [&Template; 8] {
        [
            &self.guest_signature,
            &self.guest_read,
            &self.guest_fill,
            &self.guest_commit,
            &self.host_channel,
            &self.host_write,
            &self.host_output,
            &self.host_invoke,
        ]
    }
}

/// Complete capability description of one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformProfile {
    pub id: PlatformId,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub entry_style: EntryStyle,
    pub alignment: Alignment,
    /// Word size for word-aligned raw transfers.
    pub word_size_bytes: u32,
    pub hint_channel_present: bool,
    pub streaming_io_supported: bool,
    pub cycle_count_supported: bool,
    #[serde(default)]
    pub dependencies: Vec<LogicalDependency>,
    #[serde(default)]
    pub guest: Vocabulary,
    #[serde(default)]
    pub host: Vocabulary,
    #[serde(default)]
    pub fallback: FallbackTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<BundleTemplates>,
    #[serde(default)]
    pub precompiles: BTreeMap<String, PrecompileEntry>,
}

impl PlatformProfile {
    pub fn vocabulary(&self, side: Side) -> &Vocabulary {
        match side {
            Side::Guest => &self.guest,
            Side::Host => &self.host,
        }
    }

    pub fn precompile_status(&self, operation: &str) -> PrecompileStatus {
        self.precompiles
            .get(operation)
            .map(|p| p.status)
            .unwrap_or(PrecompileStatus::Unavailable)
    }

    /// Canonical recognition table for one side: every (shape, kind,
    /// operation) triple, in vocabulary order then precompile order.
    pub fn recognition_table(&self, side: Side) -> Vec<(&CallShape, ConstructKind, Option<&str>)> {
        let mut table: Vec<_> = self
            .vocabulary(side)
            .entries()
            .flat_map(|(kind, entry)| entry.shapes.iter().map(move |s| (s, kind, None)))
            .collect();
        if side == Side::Guest {
            for (op, entry) in &self.precompiles {
                for shape in &entry.shapes {
                    table.push((shape, ConstructKind::PrecompileCall, Some(op.as_str())));
                }
            }
        }
        table
    }

    /// Dependencies for one side.
    pub fn dependencies_for(&self, side: Side) -> impl Iterator<Item = &LogicalDependency> {
        self.dependencies.iter().filter(move |d| d.side == side)
    }
}
