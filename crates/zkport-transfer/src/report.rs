//! Transfer report: what happens to every construct, and why.

use std::fmt;

use serde::Serialize;
use zkport_core::{ConstructId, ConstructKind, Fingerprint, Position, Side};
use zkport_platforms::PlatformId;

use crate::error::{Result, TransferError};
use crate::plan::{TransferPlan, UnitAnalysis, UnitPlan};
use crate::resolve::{Action, Resolution};
use crate::sequence::{OrderingViolation, SequenceGap};
use crate::warning::Warning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    Direct,
    Adapted,
    Unsupported,
}

impl Bucket {
    pub fn of(action: &Action) -> Self {
        match action {
            Action::DirectMap => Bucket::Direct,
            Action::Adapt(_) => Bucket::Adapted,
            Action::Unsupported(_) => Bucket::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Direct => "direct",
            Bucket::Adapted => "adapted",
            Bucket::Unsupported => "unsupported",
        }
    }
}

/// One construct's line in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub side: Side,
    pub construct: ConstructId,
    pub kind: ConstructKind,
    pub position: Position,
    pub bucket: Bucket,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUnit {
    pub side: Side,
    pub error: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total: usize,
    pub direct: usize,
    pub adapted: usize,
    pub unsupported: usize,
}

impl Totals {
    fn add(&mut self, bucket: Bucket) {
        self.total += 1;
        match bucket {
            Bucket::Direct => self.direct += 1,
            Bucket::Adapted => self.adapted += 1,
            Bucket::Unsupported => self.unsupported += 1,
        }
    }
}

/// Report for one assessed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub source: PlatformId,
    pub target: PlatformId,
    pub fingerprint: Fingerprint,
    pub entries: Vec<ReportEntry>,
    /// Resolution warnings in construct order, guest first, then sequencing
    /// warnings.
    pub warnings: Vec<Warning>,
    pub failed_units: Vec<FailedUnit>,
    pub gaps: Vec<SequenceGap>,
    pub ordering_violations: Vec<OrderingViolation>,
    pub totals: Totals,
}

impl Report {
    /// Build the report, checking that every construct was resolved exactly
    /// once.
    pub fn build(plan: &TransferPlan) -> Result<Self> {
        let mut entries = Vec::new();
        let mut warnings = Vec::new();
        let mut failed_units = Vec::new();
        let mut totals = Totals::default();

        for unit_plan in [plan.guest(), plan.host()] {
            match unit_plan.analysis() {
                UnitAnalysis::Analyzed { unit, resolutions } => {
                    check_complete(unit_plan, resolutions)?;
                    for (c, r) in unit.constructs.iter().zip(resolutions) {
                        let bucket = Bucket::of(&r.action);
                        totals.add(bucket);
                        entries.push(ReportEntry {
                            side: c.side,
                            construct: c.id,
                            kind: c.kind,
                            position: Position::locate(&unit.text, c.source_span.start),
                            bucket,
                            detail: r.action.describe(),
                        });
                        warnings.extend(r.warnings.iter().cloned());
                    }
                }
                UnitAnalysis::Failed { error } => failed_units.push(FailedUnit {
                    side: unit_plan.side(),
                    error: error.to_string(),
                }),
            }
        }
        warnings.extend(plan.ledger().warnings.iter().cloned());

        Ok(Self {
            source: plan.source(),
            target: plan.target(),
            fingerprint: plan.fingerprint(),
            entries,
            warnings,
            failed_units,
            gaps: plan.ledger().gaps.clone(),
            ordering_violations: plan.ledger().violations.clone(),
            totals,
        })
    }

    pub fn requires_confirmation(&self) -> bool {
        self.warnings.iter().any(|w| w.requires_confirmation)
    }

    /// Whether `generate` will refuse this plan.
    pub fn is_blocked(&self) -> bool {
        !self.failed_units.is_empty() || !self.ordering_violations.is_empty()
    }

    pub fn bucket(&self, bucket: Bucket) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.bucket == bucket)
    }
}

fn check_complete(unit_plan: &UnitPlan, resolutions: &[Resolution]) -> Result<()> {
    let UnitAnalysis::Analyzed { unit, .. } = unit_plan.analysis() else {
        return Ok(());
    };
    let side = unit_plan.side();
    if unit.constructs.len() != resolutions.len() {
        return Err(TransferError::Incomplete {
            side,
            detail: format!(
                "{} constructs but {} resolutions",
                unit.constructs.len(),
                resolutions.len()
            ),
        });
    }
    for (c, r) in unit.constructs.iter().zip(resolutions) {
        if c.id != r.construct || c.kind != r.kind || r.side != side {
            return Err(TransferError::Incomplete {
                side,
                detail: format!("resolution for {} does not match construct {}", r.construct, c.id),
            });
        }
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Transfer Report ===")?;
        writeln!(f, "Source: {}", self.source)?;
        writeln!(f, "Target: {}", self.target)?;
        writeln!(f, "Fingerprint: {}", self.fingerprint.short())?;
        writeln!(f)?;

        writeln!(
            f,
            "--- Constructs: {} total, {} direct, {} adapted, {} unsupported ---",
            self.totals.total, self.totals.direct, self.totals.adapted, self.totals.unsupported
        )?;
        for bucket in [Bucket::Direct, Bucket::Adapted, Bucket::Unsupported] {
            let entries: Vec<_> = self.bucket(bucket).collect();
            if entries.is_empty() {
                continue;
            }
            writeln!(f, "  [{}]", bucket.as_str())?;
            for e in entries {
                if bucket == Bucket::Direct {
                    writeln!(f, "    {} {} {} at {}", e.side, e.construct, e.kind, e.position)?;
                } else {
                    writeln!(
                        f,
                        "    {} {} {} at {}: {}",
                        e.side, e.construct, e.kind, e.position, e.detail
                    )?;
                }
            }
        }

        if !self.failed_units.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Failed units ---")?;
            for u in &self.failed_units {
                writeln!(f, "  {}: {}", u.side, u.error)?;
            }
        }

        if !self.ordering_violations.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Ordering violations ---")?;
            for v in &self.ordering_violations {
                writeln!(
                    f,
                    "  {} channel: unpaired guest reads {:?}, host writes {:?}",
                    v.channel, v.guest, v.host
                )?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Warnings ({}) ---", self.warnings.len())?;
            for w in &self.warnings {
                writeln!(f, "  {w}")?;
            }
        }

        writeln!(f)?;
        let status = if self.is_blocked() {
            "BLOCKED"
        } else if self.requires_confirmation() {
            "NEEDS CONFIRMATION"
        } else {
            "READY"
        };
        write!(f, "Status: {status}")
    }
}
