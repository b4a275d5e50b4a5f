//! I/O sequencer: pairs retained guest reads with retained host writes.
//!
//! Each input channel keeps two counters over the constructs that survive
//! resolution. A dropped input leaves a [`SequenceGap`]; the inputs after it
//! move up one position on the target.

use std::fmt;

use serde::Serialize;
use zkport_core::{ConstructId, ConstructKind, Side};
use zkport_platforms::PlatformProfile;

use crate::resolve::{Action, ResolvedUnit, Unsupported};
use crate::warning::{Warning, WarningCode};

/// Input channel of the target program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// Input bound into the proof's public statement.
    Proven,
    /// Unconstrained advice supplied by the prover.
    Hint,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Proven, Channel::Hint];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Proven => "proven",
            Channel::Hint => "hint",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input dropped from its channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceGap {
    pub side: Side,
    pub construct: ConstructId,
    pub channel: Channel,
    /// Sequence index of the input in the source program.
    pub original_index: usize,
}

/// Guest read and host write at the same position disagree on structured
/// versus raw transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindMismatch {
    pub channel: Channel,
    pub position: usize,
    pub guest: ConstructId,
    pub host: ConstructId,
    pub guest_kind: ConstructKind,
    pub host_kind: ConstructKind,
}

/// Retained guest reads and host writes cannot be paired on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderingViolation {
    pub channel: Channel,
    /// Construct indices of guest reads without a host write.
    pub guest: Vec<usize>,
    /// Construct indices of host writes without a guest read.
    pub host: Vec<usize>,
}

/// Retained inputs of one channel, in target order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelSequence {
    pub guest: Vec<ConstructId>,
    pub host: Vec<ConstructId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceLedger {
    pub proven: ChannelSequence,
    pub hint: ChannelSequence,
    pub gaps: Vec<SequenceGap>,
    pub mismatches: Vec<KindMismatch>,
    pub violations: Vec<OrderingViolation>,
    pub warnings: Vec<Warning>,
}

impl SequenceLedger {
    pub fn channel(&self, channel: Channel) -> &ChannelSequence {
        match channel {
            Channel::Proven => &self.proven,
            Channel::Hint => &self.hint,
        }
    }

    fn channel_mut(&mut self, channel: Channel) -> &mut ChannelSequence {
        match channel {
            Channel::Proven => &mut self.proven,
            Channel::Hint => &mut self.hint,
        }
    }

    /// Target position of a retained input.
    pub fn position(&self, side: Side, id: ConstructId) -> Option<(Channel, usize)> {
        Channel::ALL.into_iter().find_map(|channel| {
            let seq = self.channel(channel);
            let list = match side {
                Side::Guest => &seq.guest,
                Side::Host => &seq.host,
            };
            list.iter().position(|c| *c == id).map(|p| (channel, p))
        })
    }

    pub fn is_blocked(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Build the ledger. Counts are cross-checked only when both units resolved
/// and the source platform streams its inputs.
pub fn sequence(
    guest: Option<ResolvedUnit<'_>>,
    host: Option<ResolvedUnit<'_>>,
    source: &PlatformProfile,
) -> SequenceLedger {
    let mut ledger = SequenceLedger::default();
    for (side, unit) in [(Side::Guest, guest), (Side::Host, host)] {
        if let Some(unit) = unit {
            retain(&mut ledger, side, unit);
        }
    }

    if guest.is_some() && host.is_some() && source.streaming_io_supported {
        let kind_of = |unit: Option<ResolvedUnit<'_>>, id: ConstructId| {
            unit.and_then(|u| u.unit.construct(id)).map(|c| c.kind)
        };
        for channel in Channel::ALL {
            let seq = ledger.channel(channel).clone();
            for (position, (g, h)) in seq.guest.iter().zip(&seq.host).enumerate() {
                let (Some(guest_kind), Some(host_kind)) = (kind_of(guest, *g), kind_of(host, *h)) else {
                    continue;
                };
                if guest_kind.is_raw() != host_kind.is_raw() {
                    ledger.warnings.push(Warning::new(
                        Side::Host,
                        *h,
                        WarningCode::SequenceKindMismatch,
                        format!(
                            "host {host_kind} at {channel} position {position} feeds guest {guest_kind} {g}"
                        ),
                    ));
                    ledger.mismatches.push(KindMismatch {
                        channel,
                        position,
                        guest: *g,
                        host: *h,
                        guest_kind,
                        host_kind,
                    });
                }
            }
            if seq.guest.len() != seq.host.len() {
                let paired = seq.guest.len().min(seq.host.len());
                let violation = OrderingViolation {
                    channel,
                    guest: seq.guest[paired..].iter().map(|c| c.0).collect(),
                    host: seq.host[paired..].iter().map(|c| c.0).collect(),
                };
                tracing::warn!(
                    channel = %channel,
                    guest = seq.guest.len(),
                    host = seq.host.len(),
                    "input sequences do not pair"
                );
                ledger.violations.push(violation);
            }
        }
    }

    tracing::debug!(
        proven = ledger.proven.guest.len(),
        hint = ledger.hint.guest.len(),
        gaps = ledger.gaps.len(),
        violations = ledger.violations.len(),
        "inputs sequenced"
    );
    ledger
}

fn retain(ledger: &mut SequenceLedger, side: Side, unit: ResolvedUnit<'_>) {
    for resolution in unit.resolutions {
        let Some(construct) = unit.unit.construct(resolution.construct) else {
            continue;
        };
        if !construct.is_input() {
            continue;
        }
        let channel = resolution.channel.unwrap_or(Channel::Proven);
        let dropped = matches!(resolution.action, Action::Unsupported(Unsupported::Impossible { .. }))
            || resolution.is_stub();
        if dropped {
            let original_index = construct.sequence_index.unwrap_or_default();
            ledger.warnings.push(Warning::new(
                side,
                construct.id,
                WarningCode::SequenceGap,
                format!(
                    "input {original_index} is dropped; later {channel} inputs move up one position"
                ),
            ));
            ledger.gaps.push(SequenceGap {
                side,
                construct: construct.id,
                channel,
                original_index,
            });
            continue;
        }
        let seq = ledger.channel_mut(channel);
        match side {
            Side::Guest => seq.guest.push(construct.id),
            Side::Host => seq.host.push(construct.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{analyze, AnalyzerConfig};
    use crate::fixtures::{self, catalog};
    use crate::analyze::AnalyzedUnit;
    use crate::resolve::{resolve, GuestOutcomes, Resolution};
    use zkport_platforms::PlatformId;

    struct Resolved {
        guest: AnalyzedUnit,
        host: AnalyzedUnit,
        guest_res: Vec<Resolution>,
        host_res: Vec<Resolution>,
    }

    fn resolved(guest: &str, host: &str, source: PlatformId, target: PlatformId) -> Resolved {
        let catalog = catalog();
        let (src, tgt) = (catalog.profile(source), catalog.profile(target));
        let config = AnalyzerConfig::default();
        let guest = analyze(guest, Side::Guest, src, &config).unwrap();
        let host = analyze(host, Side::Host, src, &config).unwrap();
        let mut outcomes = GuestOutcomes::default();
        let guest_res = resolve(&guest, src, tgt, &mut outcomes);
        let host_res = resolve(&host, src, tgt, &mut outcomes);
        Resolved {
            guest,
            host,
            guest_res,
            host_res,
        }
    }

    fn ledger(r: &Resolved, source: PlatformId) -> SequenceLedger {
        sequence(
            Some(ResolvedUnit {
                unit: &r.guest,
                resolutions: &r.guest_res,
            }),
            Some(ResolvedUnit {
                unit: &r.host,
                resolutions: &r.host_res,
            }),
            catalog().profile(source),
        )
    }

    #[test]
    fn matching_counts_pair_up() {
        let r = resolved(fixtures::SP1_GUEST, fixtures::SP1_HOST, PlatformId::Sp1, PlatformId::Risc0);
        let ledger = ledger(&r, PlatformId::Sp1);
        assert_eq!(ledger.proven.guest.len(), 1);
        assert_eq!(ledger.proven.host.len(), 1);
        assert!(ledger.violations.is_empty());
        assert!(!ledger.is_blocked());
    }

    #[test]
    fn hint_split_keeps_channels_aligned() {
        let r = resolved(
            fixtures::SP1_CHECK_GUEST,
            fixtures::SP1_CHECK_HOST,
            PlatformId::Sp1,
            PlatformId::Nexus,
        );
        let ledger = ledger(&r, PlatformId::Sp1);
        assert_eq!(ledger.proven.guest.len(), 2);
        assert_eq!(ledger.hint.guest.len(), 1);
        assert_eq!(ledger.hint.host.len(), 1);
        assert_eq!(
            ledger.position(Side::Host, ConstructId(3)),
            Some((Channel::Hint, 0))
        );
        assert!(ledger.violations.is_empty());
    }

    #[test]
    fn unpaired_writes_are_a_violation() {
        let host = fixtures::SP1_HOST.replace(
            "stdin.write(&n);",
            "stdin.write(&n);\n    stdin.write(&n);",
        );
        let r = resolved(fixtures::SP1_GUEST, &host, PlatformId::Sp1, PlatformId::OpenVm);
        let ledger = ledger(&r, PlatformId::Sp1);
        assert_eq!(
            ledger.violations,
            vec![OrderingViolation {
                channel: Channel::Proven,
                guest: vec![],
                host: vec![2],
            }]
        );
        assert!(ledger.is_blocked());
    }

    #[test]
    fn raw_against_structured_is_a_warning() {
        let host = fixtures::SP1_HOST.replace("stdin.write(&n);", "stdin.write_slice(&n);");
        let r = resolved(fixtures::SP1_GUEST, &host, PlatformId::Sp1, PlatformId::OpenVm);
        let ledger = ledger(&r, PlatformId::Sp1);
        assert_eq!(ledger.mismatches.len(), 1);
        assert!(ledger.violations.is_empty());
        assert!(ledger
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::SequenceKindMismatch));
    }

    #[test]
    fn dropped_inputs_leave_gaps() {
        let r = resolved(fixtures::NEXUS_GUEST, "fn main() {}", PlatformId::Nexus, PlatformId::Jolt);
        let guest_only = sequence(
            Some(ResolvedUnit {
                unit: &r.guest,
                resolutions: &r.guest_res,
            }),
            None,
            catalog().profile(PlatformId::Nexus),
        );
        assert!(guest_only.gaps.is_empty());

        let unbound = "#[nexus_rt::main]\nfn main() { consume(nexus_rt::read_private_input::<Vec<u8>>()); }";
        let r = resolved(unbound, "fn main() {}", PlatformId::Nexus, PlatformId::Jolt);
        let ledger = sequence(
            Some(ResolvedUnit {
                unit: &r.guest,
                resolutions: &r.guest_res,
            }),
            None,
            catalog().profile(PlatformId::Nexus),
        );
        assert_eq!(ledger.gaps.len(), 1);
        assert_eq!(ledger.gaps[0].original_index, 0);
        assert!(ledger.warnings.iter().any(|w| w.code == WarningCode::SequenceGap));
    }
}
