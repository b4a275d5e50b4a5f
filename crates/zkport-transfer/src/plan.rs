//! Transfer requests, configuration, and the immutable transfer plan.

use serde::{Deserialize, Serialize};
use zkport_core::{Fingerprint, Side};
use zkport_platforms::PlatformId;

use crate::analyze::AnalyzedUnit;
use crate::error::AnalysisError;
use crate::resolve::{BundleLayout, Resolution, ResolvedUnit};
use crate::sequence::SequenceLedger;
use crate::warning::Warning;

/// A program to move from one platform to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRequest {
    pub source: PlatformId,
    pub target: PlatformId,
    pub guest: String,
    pub host: String,
}

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TransferConfig {
    /// Maximum constructs recognized per unit.
    pub max_constructs: usize,
    /// Analyze guest and host concurrently.
    pub parallel_analysis: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_constructs: 4096,
            parallel_analysis: true,
        }
    }
}

/// Outcome of analyzing and resolving one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitAnalysis {
    Analyzed {
        unit: AnalyzedUnit,
        resolutions: Vec<Resolution>,
    },
    Failed {
        error: AnalysisError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPlan {
    side: Side,
    analysis: UnitAnalysis,
}

impl UnitPlan {
    pub(crate) fn new(side: Side, analysis: UnitAnalysis) -> Self {
        Self { side, analysis }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn analysis(&self) -> &UnitAnalysis {
        &self.analysis
    }

    pub fn resolved(&self) -> Option<ResolvedUnit<'_>> {
        match &self.analysis {
            UnitAnalysis::Analyzed { unit, resolutions } => Some(ResolvedUnit { unit, resolutions }),
            UnitAnalysis::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match &self.analysis {
            UnitAnalysis::Failed { error } => Some(error),
            UnitAnalysis::Analyzed { .. } => None,
        }
    }
}

/// Everything `assess` decided. Immutable once built; the platform pair is
/// fixed for the plan's lifetime.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    source: PlatformId,
    target: PlatformId,
    guest: UnitPlan,
    host: UnitPlan,
    ledger: SequenceLedger,
    layout: BundleLayout,
    fingerprint: Fingerprint,
}

impl TransferPlan {
    pub(crate) fn new(
        source: PlatformId,
        target: PlatformId,
        guest: UnitPlan,
        host: UnitPlan,
        ledger: SequenceLedger,
        layout: BundleLayout,
        fingerprint: Fingerprint,
    ) -> Self {
        Self {
            source,
            target,
            guest,
            host,
            ledger,
            layout,
            fingerprint,
        }
    }

    pub fn source(&self) -> PlatformId {
        self.source
    }

    pub fn target(&self) -> PlatformId {
        self.target
    }

    pub fn guest(&self) -> &UnitPlan {
        &self.guest
    }

    pub fn host(&self) -> &UnitPlan {
        &self.host
    }

    pub fn unit(&self, side: Side) -> &UnitPlan {
        match side {
            Side::Guest => &self.guest,
            Side::Host => &self.host,
        }
    }

    pub fn ledger(&self) -> &SequenceLedger {
        &self.ledger
    }

    pub fn layout(&self) -> &BundleLayout {
        &self.layout
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Every warning of the plan, guest resolutions first.
    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        [&self.guest, &self.host]
            .into_iter()
            .filter_map(|u| match &u.analysis {
                UnitAnalysis::Analyzed { resolutions, .. } => Some(resolutions),
                UnitAnalysis::Failed { .. } => None,
            })
            .flat_map(|rs| rs.iter().flat_map(|r| r.warnings.iter()))
            .chain(self.ledger.warnings.iter())
    }

    /// Accept the plan, including every confirmation-required decision.
    pub fn confirm(self) -> ConfirmedPlan {
        tracing::debug!(
            source = %self.source,
            target = %self.target,
            confirmations = self.warnings().filter(|w| w.requires_confirmation).count(),
            "plan confirmed"
        );
        ConfirmedPlan { plan: self }
    }
}

/// A plan the caller has accepted. Only `TransferPlan::confirm` creates one.
#[derive(Debug, Clone)]
pub struct ConfirmedPlan {
    plan: TransferPlan,
}

impl ConfirmedPlan {
    pub fn plan(&self) -> &TransferPlan {
        &self.plan
    }
}
