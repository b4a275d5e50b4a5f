//! Transfer pipeline orchestrator: `assess` builds a plan and its report,
//! `generate` emits the target program from a confirmed plan.

use zkport_core::{Fingerprint, Side};
use zkport_platforms::{Catalog, PlatformProfile};

use crate::analyze::{analyze, AnalyzedUnit, AnalyzerConfig};
use crate::codegen::{self, Artifacts};
use crate::error::{AnalysisError, Result, TransferError};
use crate::plan::{
    ConfirmedPlan, TransferConfig, TransferPlan, TransferRequest, UnitAnalysis, UnitPlan,
};
use crate::report::Report;
use crate::resolve::{resolve, GuestOutcomes, ResolvedUnit};
use crate::sequence::sequence;

/// Output of a successful assessment.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub plan: TransferPlan,
    pub report: Report,
}

/// Analyze both units, resolve every construct against the target, and
/// sequence the I/O: analyze -> resolve guest -> resolve host -> sequence ->
/// report.
///
/// A unit that fails analysis is recorded in the plan; the other unit is
/// still analyzed and resolved.
#[tracing::instrument(skip_all, fields(source = %request.source, target = %request.target))]
pub fn assess(
    catalog: &Catalog,
    request: &TransferRequest,
    config: &TransferConfig,
) -> Result<Assessment> {
    let source = catalog.profile(request.source);
    let target = catalog.profile(request.target);
    let analyzer = AnalyzerConfig {
        max_constructs: config.max_constructs,
    };

    // Stage 1: analysis
    let run = |text: &str, side: Side| analyze(text, side, source, &analyzer);
    let (guest, host) = if config.parallel_analysis {
        rayon::join(
            || run(&request.guest, Side::Guest),
            || run(&request.host, Side::Host),
        )
    } else {
        (run(&request.guest, Side::Guest), run(&request.host, Side::Host))
    };

    // Stage 2: resolution, guest first so the host can follow its decisions
    let mut outcomes = GuestOutcomes::default();
    let guest = plan_unit(Side::Guest, guest, source, target, &mut outcomes);
    let host = plan_unit(Side::Host, host, source, target, &mut outcomes);

    // Stage 3: sequencing
    let ledger = sequence(guest.resolved(), host.resolved(), source);

    let fingerprint = Fingerprint::of_transfer(
        request.source.as_str(),
        request.target.as_str(),
        &request.guest,
        &request.host,
    );
    let plan = TransferPlan::new(
        request.source,
        request.target,
        guest,
        host,
        ledger,
        outcomes.layout,
        fingerprint,
    );

    // Stage 4: report
    let report = Report::build(&plan)?;
    tracing::debug!(
        total = report.totals.total,
        direct = report.totals.direct,
        adapted = report.totals.adapted,
        unsupported = report.totals.unsupported,
        warnings = report.warnings.len(),
        "assessment complete"
    );
    Ok(Assessment { plan, report })
}

fn plan_unit(
    side: Side,
    analyzed: std::result::Result<AnalyzedUnit, AnalysisError>,
    source: &PlatformProfile,
    target: &PlatformProfile,
    outcomes: &mut GuestOutcomes,
) -> UnitPlan {
    let analysis = match analyzed {
        Ok(unit) => {
            let resolutions = resolve(&unit, source, target, outcomes);
            UnitAnalysis::Analyzed { unit, resolutions }
        }
        Err(error) => {
            tracing::warn!(side = %side, %error, "unit failed analysis");
            UnitAnalysis::Failed { error }
        }
    };
    UnitPlan::new(side, analysis)
}

/// Emit the target guest and host sources of a confirmed plan.
///
/// Refuses plans with a failed unit or an ordering violation.
#[tracing::instrument(skip_all, fields(source = %confirmed.plan().source(), target = %confirmed.plan().target()))]
pub fn generate(catalog: &Catalog, confirmed: &ConfirmedPlan) -> Result<Artifacts> {
    let plan = confirmed.plan();
    let guest = resolved_or_refuse(plan.guest())?;
    let host = resolved_or_refuse(plan.host())?;

    if let Some(v) = plan.ledger().violations.first() {
        tracing::warn!(channel = %v.channel, "ordering violation blocks generation");
        return Err(TransferError::OrderingViolation {
            channel: v.channel,
            guest: v.guest.clone(),
            host: v.host.clone(),
        });
    }

    codegen::emit(
        catalog.profile(plan.source()),
        catalog.profile(plan.target()),
        guest,
        host,
        plan.layout(),
    )
}

fn resolved_or_refuse(unit: &UnitPlan) -> Result<ResolvedUnit<'_>> {
    match (unit.resolved(), unit.error()) {
        (Some(resolved), _) => Ok(resolved),
        (None, Some(error)) => {
            tracing::warn!(side = %unit.side(), "failed unit blocks generation");
            Err(TransferError::UnitFailed {
                side: unit.side(),
                error: error.clone(),
            })
        }
        (None, None) => Err(TransferError::Incomplete {
            side: unit.side(),
            detail: "unit has neither resolutions nor an error".to_string(),
        }),
    }
}
