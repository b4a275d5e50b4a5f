//! Compatibility resolver.
//!
//! Decides, for every construct of an analyzed unit, whether the target
//! platform offers it directly, offers it after a named adaptation, or lacks
//! it altogether. Every decision is read off the two platform rows; nothing
//! here knows which platform is which.
//!
//! The guest unit is resolved first. Its input channels and bundle slots are
//! recorded in [`GuestOutcomes`] so that each host write follows the guest
//! read it feeds.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use zkport_core::{Construct, ConstructId, ConstructKind, Direction, Side};
use zkport_platforms::{
    Alignment, Capability, EntryStyle, FallbackPolicy, PlatformProfile, PrecompileStatus,
};

use crate::analyze::types::{byte_size, is_fixed_size, tuple_type};
use crate::analyze::AnalyzedUnit;
use crate::hint::classify_inputs;
use crate::sequence::Channel;
use crate::warning::{Warning, WarningCode};

/// Which aggregate value a bundled construct lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Aggregate {
    Input,
    Output,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Input => "input",
            Aggregate::Output => "output",
        }
    }
}

/// A transformation applied to keep a construct working on the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "adaptation", rename_all = "kebab-case")]
pub enum Adaptation {
    AlignmentPaddingRemoved {
        payload_bytes: Option<usize>,
        word_bytes: u32,
    },
    AlignmentPaddingAdded {
        payload_bytes: Option<usize>,
        word_bytes: u32,
    },
    ChannelSplit { channel: Channel },
    HintMerged,
    Rerouted { to: ConstructKind },
    PrecompileDegraded { operation: String },
    ConstantStub { value: String },
    EntryStyleConverted { from: EntryStyle, to: EntryStyle },
}

impl Adaptation {
    pub fn describe(&self) -> String {
        match self {
            Adaptation::AlignmentPaddingRemoved {
                payload_bytes,
                word_bytes,
            } => match payload_bytes {
                Some(n) => format!(
                    "alignment padding removed: {n}-byte payload is no longer padded to {word_bytes}-byte words"
                ),
                None => format!(
                    "alignment padding removed: payload is no longer padded to {word_bytes}-byte words"
                ),
            },
            Adaptation::AlignmentPaddingAdded {
                payload_bytes,
                word_bytes,
            } => match payload_bytes {
                Some(n) => format!(
                    "alignment padding added: {n}-byte payload is padded to {word_bytes}-byte words"
                ),
                None => format!("alignment padding added: payload is padded to {word_bytes}-byte words"),
            },
            Adaptation::ChannelSplit { channel } => format!("input moved to the {channel} channel"),
            Adaptation::HintMerged => "hint input merged into the proven input stream".to_string(),
            Adaptation::Rerouted { to } => format!("rerouted to {to}"),
            Adaptation::PrecompileDegraded { operation } => {
                format!("{operation} runs as software on target")
            }
            Adaptation::ConstantStub { value } => format!("replaced by constant {value}"),
            Adaptation::EntryStyleConverted { from, to } => format!(
                "entry point converted from {} to {} style",
                from.as_str(),
                to.as_str()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "unsupported", rename_all = "kebab-case")]
pub enum Unsupported {
    /// Carried through a slot of the aggregate entry input or output.
    Bundled { aggregate: Aggregate, slot: usize },
    Impossible { reason: String },
}

impl Unsupported {
    pub fn describe(&self) -> String {
        match self {
            Unsupported::Bundled { aggregate, slot } => {
                format!("bundled into aggregate {} slot {slot}", aggregate.as_str())
            }
            Unsupported::Impossible { reason } => format!("unsupported: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "detail", rename_all = "kebab-case")]
pub enum Action {
    DirectMap,
    /// One or more adaptations, in the order they apply.
    Adapt(Vec<Adaptation>),
    Unsupported(Unsupported),
}

impl Action {
    pub fn describe(&self) -> String {
        match self {
            Action::DirectMap => "direct".to_string(),
            Action::Adapt(adaptations) => adaptations
                .iter()
                .map(Adaptation::describe)
                .collect::<Vec<_>>()
                .join("; "),
            Action::Unsupported(u) => u.describe(),
        }
    }
}

/// How the code generator emits a construct on the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rewrite", rename_all = "kebab-case")]
pub enum Rewrite {
    /// The target's template for `kind` (differs from the source kind when
    /// rerouted or split onto the hint channel).
    Template { kind: ConstructKind },
    /// Entry marker and, on conversion, the entry function header.
    Entry,
    /// Host entry becomes the constructor of the aggregate input.
    BundleChannel,
    Bundle { aggregate: Aggregate, slot: usize },
    Stub { value: String },
    /// Neutral placeholder for an impossible construct.
    Neutral,
}

/// The decision for one construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub construct: ConstructId,
    pub side: Side,
    pub kind: ConstructKind,
    pub action: Action,
    pub rewrite: Rewrite,
    /// Target input channel (input constructs only).
    pub channel: Option<Channel>,
    pub warnings: Vec<Warning>,
}

impl Resolution {
    pub fn is_stub(&self) -> bool {
        matches!(self.rewrite, Rewrite::Stub { .. })
    }

    pub fn is_direct(&self) -> bool {
        self.action == Action::DirectMap
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}: {}", self.side, self.construct, self.kind, self.action.describe())
    }
}

/// An analyzed unit together with its resolutions, index-aligned.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedUnit<'a> {
    pub unit: &'a AnalyzedUnit,
    pub resolutions: &'a [Resolution],
}

/// Element types of the aggregate entry input and output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BundleLayout {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl BundleLayout {
    pub fn input_ty(&self) -> String {
        tuple_type(&self.inputs)
    }

    pub fn output_ty(&self) -> String {
        tuple_type(&self.outputs)
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    fn push(&mut self, aggregate: Aggregate, ty: String) -> usize {
        let list = match aggregate {
            Aggregate::Input => &mut self.inputs,
            Aggregate::Output => &mut self.outputs,
        };
        list.push(ty);
        list.len() - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GuestOutcome {
    channel: Option<Channel>,
    slot: Option<usize>,
    dropped: bool,
}

/// What the guest resolution decided for each I/O position.
#[derive(Debug, Clone, Default)]
pub struct GuestOutcomes {
    by_sequence: BTreeMap<(Direction, usize), GuestOutcome>,
    pub layout: BundleLayout,
}

impl GuestOutcomes {
    fn get(&self, c: &Construct) -> Option<GuestOutcome> {
        let key = (c.direction()?, c.sequence_index?);
        self.by_sequence.get(&key).copied()
    }

    fn record(&mut self, c: &Construct, outcome: GuestOutcome) {
        if let (Some(direction), Some(index)) = (c.direction(), c.sequence_index) {
            self.by_sequence.insert((direction, index), outcome);
        }
    }
}

/// Resolve every construct of `unit` from `source` onto `target`.
///
/// Guest units record their outcomes; host units read them.
pub fn resolve(
    unit: &AnalyzedUnit,
    source: &PlatformProfile,
    target: &PlatformProfile,
    outcomes: &mut GuestOutcomes,
) -> Vec<Resolution> {
    let channels = if unit.side == Side::Guest {
        classify_inputs(unit)
    } else {
        BTreeMap::new()
    };
    let mut resolver = Resolver {
        side: unit.side,
        source,
        target,
        channels,
        outcomes,
    };
    let mut resolutions: Vec<Resolution> = unit.constructs.iter().map(|c| resolver.construct(c)).collect();

    for ambiguity in &unit.ambiguities {
        if let Some(r) = resolutions.get_mut(ambiguity.construct.0) {
            let others: Vec<&str> = ambiguity
                .candidates
                .iter()
                .filter(|k| **k != ambiguity.chosen)
                .map(|k| k.as_str())
                .collect();
            r.warnings.push(Warning::new(
                unit.side,
                ambiguity.construct,
                WarningCode::RecognitionAmbiguity,
                format!(
                    "call also matches {}; classified as {}",
                    others.join(", "),
                    ambiguity.chosen
                ),
            ));
        }
    }

    tracing::debug!(
        side = %unit.side,
        source = %source.id,
        target = %target.id,
        direct = resolutions.iter().filter(|r| r.is_direct()).count(),
        total = resolutions.len(),
        "unit resolved"
    );
    resolutions
}

struct Resolver<'a> {
    side: Side,
    source: &'a PlatformProfile,
    target: &'a PlatformProfile,
    channels: BTreeMap<ConstructId, Channel>,
    outcomes: &'a mut GuestOutcomes,
}

/// Intermediate decision before channel bookkeeping.
struct Decision {
    action: Action,
    rewrite: Rewrite,
    warnings: Vec<Warning>,
}

impl Decision {
    fn new(action: Action, rewrite: Rewrite) -> Self {
        Self {
            action,
            rewrite,
            warnings: Vec::new(),
        }
    }
}

impl Resolver<'_> {
    fn construct(&mut self, c: &Construct) -> Resolution {
        let decision = if c.kind == ConstructKind::EntryPoint {
            self.entry(c)
        } else {
            self.io_or_call(c)
        };
        let channel = c.is_input().then(|| match &decision.rewrite {
            Rewrite::Template {
                kind: ConstructKind::Hint,
            } => Channel::Hint,
            _ => Channel::Proven,
        });

        if self.side == Side::Guest {
            let slot = match decision.rewrite {
                Rewrite::Bundle { slot, .. } => Some(slot),
                _ => None,
            };
            let dropped = matches!(decision.action, Action::Unsupported(Unsupported::Impossible { .. }))
                || matches!(decision.rewrite, Rewrite::Stub { .. });
            self.outcomes.record(c, GuestOutcome { channel, slot, dropped });
        }

        Resolution {
            construct: c.id,
            side: self.side,
            kind: c.kind,
            action: decision.action,
            rewrite: decision.rewrite,
            channel,
            warnings: decision.warnings,
        }
    }

    fn entry(&self, c: &Construct) -> Decision {
        let (from, to) = (self.source.entry_style, self.target.entry_style);
        let converted = match self.side {
            Side::Guest => from != to,
            Side::Host => {
                (from == EntryStyle::FunctionInvocation) != (to == EntryStyle::FunctionInvocation)
            }
        };
        let rewrite = match self.side {
            Side::Guest => Rewrite::Entry,
            Side::Host if converted && to == EntryStyle::FunctionInvocation => Rewrite::BundleChannel,
            Side::Host => Rewrite::Template {
                kind: ConstructKind::EntryPoint,
            },
        };
        if !converted {
            return Decision::new(Action::DirectMap, rewrite);
        }
        let adaptation = Adaptation::EntryStyleConverted { from, to };
        let mut decision = Decision::new(Action::Adapt(vec![adaptation.clone()]), rewrite);
        let detail = match (self.side, from, to) {
            (Side::Guest, EntryStyle::FunctionInvocation, _) => {
                "entry parameters are read and the return value committed by a synthesized wrapper"
            }
            (Side::Guest, _, EntryStyle::FunctionInvocation) => {
                "streaming inputs and outputs move into the entry function's aggregate parameter and return value"
            }
            (Side::Host, EntryStyle::FunctionInvocation, _) => {
                "entry arguments must now be written to the input stream in parameter order"
            }
            (Side::Host, _, _) => {
                "host writes now fill the aggregate entry input; the guest runs once through a generated invocation bound to `__output`"
            }
            (Side::Guest, _, _) => "entry marker rewritten",
        };
        decision.warnings.push(Warning::new(
            self.side,
            c.id,
            WarningCode::EntryStyle,
            format!("{}: {detail}", adaptation.describe()),
        ));
        if decision.rewrite == Rewrite::BundleChannel {
            decision.warnings.push(Warning::new(
                self.side,
                c.id,
                WarningCode::HostRewrite,
                "prover setup replaced by the aggregate input value; the prover and verifier calls around it are left for manual porting",
            ));
        }
        decision
    }

    fn io_or_call(&mut self, c: &Construct) -> Decision {
        if self.side == Side::Host {
            if let Some(outcome) = self.outcomes.get(c) {
                if outcome.dropped {
                    return self.impossible(c, "the guest side of this transfer is dropped on target".to_string());
                }
            }
        }

        let operation = c.call.operation.as_deref();
        match self.target.capability(self.side, c.kind, operation) {
            Capability::Supported(_) => self.supported(c, c.kind, Vec::new()),
            Capability::Degraded { penalty, .. } => {
                let op = operation.unwrap_or_default().to_string();
                let accelerated_on_source = self.source.precompile_status(&op) == PrecompileStatus::Accelerated;
                if !accelerated_on_source {
                    return self.supported(c, c.kind, Vec::new());
                }
                let mut decision = self.supported(
                    c,
                    c.kind,
                    vec![Adaptation::PrecompileDegraded { operation: op }],
                );
                decision
                    .warnings
                    .push(Warning::new(self.side, c.id, WarningCode::PrecompileDegraded, penalty));
                decision
            }
            Capability::Unsupported(policy) => self.fallback(c, policy),
        }
    }

    /// The target emits `kind` for `c`; add alignment and channel adaptations.
    fn supported(&mut self, c: &Construct, kind: ConstructKind, mut adaptations: Vec<Adaptation>) -> Decision {
        let mut warnings = Vec::new();

        if kind.is_raw() && c.kind.is_raw() {
            let payload_bytes = c.declared_type.as_deref().and_then(byte_size);
            let alignment = match (self.source.alignment, self.target.alignment) {
                (Alignment::WordAligned, Alignment::ByteAligned) => Some(Adaptation::AlignmentPaddingRemoved {
                    payload_bytes,
                    word_bytes: self.source.word_size_bytes,
                }),
                (Alignment::ByteAligned, Alignment::WordAligned) => Some(Adaptation::AlignmentPaddingAdded {
                    payload_bytes,
                    word_bytes: self.target.word_size_bytes,
                }),
                _ => None,
            };
            if let Some(a) = alignment {
                warnings.push(Warning::new(self.side, c.id, WarningCode::AlignmentPadding, a.describe()));
                adaptations.push(a);
            }
        }

        let mut emitted = kind;
        let splits = c.is_input()
            && kind != ConstructKind::Hint
            && self.target.hint_channel_present
            && !self.source.hint_channel_present;
        if splits {
            let channel = match self.side {
                Side::Guest => self.channels.get(&c.id).copied(),
                Side::Host => self.outcomes.get(c).and_then(|o| o.channel),
            };
            if let Some(channel) = channel {
                if channel == Channel::Hint
                    && self.target.vocabulary(self.side).get(ConstructKind::Hint).is_some()
                {
                    emitted = ConstructKind::Hint;
                }
                let split = Adaptation::ChannelSplit { channel };
                if self.side == Side::Guest {
                    warnings.push(
                        Warning::new(
                            self.side,
                            c.id,
                            WarningCode::ChannelClassification,
                            format!("data-flow heuristic classified this input as {channel}; {}", split.describe()),
                        )
                        .requiring_confirmation(),
                    );
                }
                adaptations.push(split);
            }
        }

        let action = if adaptations.is_empty() {
            Action::DirectMap
        } else {
            Action::Adapt(adaptations)
        };
        Decision {
            action,
            rewrite: Rewrite::Template { kind: emitted },
            warnings,
        }
    }

    fn fallback(&mut self, c: &Construct, policy: FallbackPolicy) -> Decision {
        match policy {
            FallbackPolicy::Stub(value) => {
                let adaptation = Adaptation::ConstantStub { value: value.clone() };
                let (code, message) = if c.kind == ConstructKind::CycleCount {
                    (
                        WarningCode::CycleCountUnavailable,
                        format!("cycle counting unavailable on target; replaced by {value}"),
                    )
                } else {
                    (
                        WarningCode::ConstantStub,
                        format!("{} unavailable on target; replaced by {value}", c.kind),
                    )
                };
                let mut decision = Decision::new(Action::Adapt(vec![adaptation]), Rewrite::Stub { value });
                decision.warnings.push(Warning::new(self.side, c.id, code, message));
                decision
            }
            FallbackPolicy::Reroute(to) => {
                if !matches!(self.target.capability(self.side, to, None), Capability::Supported(_)) {
                    return self.impossible(c, format!("{} reroutes to {to}, which the target also lacks", c.kind));
                }
                let (adaptation, code, message) = if c.kind == ConstructKind::Hint {
                    (
                        Adaptation::HintMerged,
                        WarningCode::HintMerged,
                        "target has no hint channel; hint input becomes a proven input".to_string(),
                    )
                } else {
                    (
                        Adaptation::Rerouted { to },
                        WarningCode::Rerouted,
                        format!("target has no {}; emitted as {to}", c.kind),
                    )
                };
                let mut decision = self.supported(c, to, vec![adaptation]);
                decision.warnings.insert(0, Warning::new(self.side, c.id, code, message));
                decision
            }
            FallbackPolicy::Bundle => self.bundle(c),
            FallbackPolicy::None => {
                let reason = match c.call.operation.as_deref() {
                    Some(op) => format!("no {op} precompile on target"),
                    None => format!("target has no {} and no fallback", c.kind),
                };
                self.impossible(c, reason)
            }
        }
    }

    fn bundle(&mut self, c: &Construct) -> Decision {
        let Some(direction) = c.direction() else {
            return self.impossible(c, format!("{} cannot be bundled", c.kind));
        };
        let aggregate = match direction {
            Direction::Input => Aggregate::Input,
            Direction::Output => Aggregate::Output,
        };
        let slot = match self.side {
            Side::Guest => {
                let Some(ty) = c.declared_type.as_deref().filter(|t| is_fixed_size(t)) else {
                    return self.impossible(
                        c,
                        format!(
                            "{} of a type without a statically known size cannot be bundled",
                            c.kind
                        ),
                    );
                };
                self.outcomes.layout.push(aggregate, ty.to_string())
            }
            Side::Host => match self.outcomes.get(c).and_then(|o| o.slot) {
                Some(slot) => slot,
                None => return self.impossible(c, "no bundled guest counterpart at this position".to_string()),
            },
        };
        let unsupported = Unsupported::Bundled { aggregate, slot };
        let mut decision = Decision::new(
            Action::Unsupported(unsupported),
            Rewrite::Bundle { aggregate, slot },
        );
        decision.warnings.push(Warning::new(
            self.side,
            c.id,
            WarningCode::StreamingIo,
            format!(
                "target has no streaming I/O; {} bundled into the aggregate {} at slot {slot}",
                c.kind,
                aggregate.as_str()
            ),
        ));
        if self.side == Side::Host {
            decision.warnings.push(host_rewrite_warning(c, aggregate, slot));
        }
        decision
    }

    fn impossible(&self, c: &Construct, reason: String) -> Decision {
        let mut decision = Decision::new(
            Action::Unsupported(Unsupported::Impossible { reason: reason.clone() }),
            Rewrite::Neutral,
        );
        decision
            .warnings
            .push(Warning::new(self.side, c.id, WarningCode::Impossible, reason));
        decision
    }
}

fn host_rewrite_warning(c: &Construct, aggregate: Aggregate, slot: usize) -> Warning {
    let chained = c.call.receiver.as_deref() == Some("");
    match aggregate {
        Aggregate::Output => Warning::new(
            Side::Host,
            c.id,
            WarningCode::HostRewrite,
            format!("output now read from `__output.{slot}`, bound by the generated guest invocation"),
        ),
        Aggregate::Input if chained => Warning::new(
            Side::Host,
            c.id,
            WarningCode::HostRewrite,
            format!("chained builder write cannot assign slot {slot} of the aggregate input; rewrite the chain as separate statements"),
        )
        .requiring_confirmation(),
        Aggregate::Input => Warning::new(
            Side::Host,
            c.id,
            WarningCode::HostRewrite,
            format!("write now assigns slot {slot} of the aggregate input"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{analyze, AnalyzerConfig};
    use crate::fixtures::{self, catalog};
    use zkport_platforms::PlatformId;

    fn guest(text: &str, source: PlatformId, target: PlatformId) -> (Vec<Resolution>, GuestOutcomes) {
        let catalog = catalog();
        let unit = analyze(text, Side::Guest, catalog.profile(source), &AnalyzerConfig::default()).unwrap();
        let mut outcomes = GuestOutcomes::default();
        let res = resolve(&unit, catalog.profile(source), catalog.profile(target), &mut outcomes);
        (res, outcomes)
    }

    fn host(
        guest_text: &str,
        host_text: &str,
        source: PlatformId,
        target: PlatformId,
    ) -> Vec<Resolution> {
        let catalog = catalog();
        let (src, tgt) = (catalog.profile(source), catalog.profile(target));
        let config = AnalyzerConfig::default();
        let g = analyze(guest_text, Side::Guest, src, &config).unwrap();
        let h = analyze(host_text, Side::Host, src, &config).unwrap();
        let mut outcomes = GuestOutcomes::default();
        resolve(&g, src, tgt, &mut outcomes);
        resolve(&h, src, tgt, &mut outcomes)
    }

    #[test]
    fn equivalent_platforms_map_directly() {
        let (res, _) = guest(fixtures::SP1_GUEST, PlatformId::Sp1, PlatformId::OpenVm);
        assert_eq!(res.len(), 3);
        assert!(res.iter().all(|r| r.action == Action::DirectMap));
        assert!(res.iter().all(|r| r.warnings.is_empty()));
    }

    #[test]
    fn streaming_io_bundles_onto_function_invocation() {
        let (res, outcomes) = guest(fixtures::RISC0_SLICES_GUEST, PlatformId::Risc0, PlatformId::Jolt);
        let bundled: Vec<usize> = res
            .iter()
            .filter_map(|r| match r.action {
                Action::Unsupported(Unsupported::Bundled {
                    aggregate: Aggregate::Input,
                    slot,
                }) => Some(slot),
                _ => None,
            })
            .collect();
        assert_eq!(bundled, vec![0, 1, 2, 3, 4]);
        assert_eq!(outcomes.layout.inputs, vec!["[u32; 4]"; 5]);
        assert_eq!(outcomes.layout.output_ty(), "()");
        assert!(res
            .iter()
            .flat_map(|r| &r.warnings)
            .any(|w| w.code == WarningCode::StreamingIo && w.message.contains("streaming I/O")));
        assert!(matches!(
            &res[0].action,
            Action::Adapt(a) if a == &vec![Adaptation::EntryStyleConverted {
                from: EntryStyle::Macro,
                to: EntryStyle::FunctionInvocation,
            }]
        ));
    }

    #[test]
    fn missing_cycle_counter_is_stubbed() {
        let (res, _) = guest(fixtures::RISC0_CYCLES_GUEST, PlatformId::Risc0, PlatformId::Sp1);
        let stubs: Vec<&Resolution> = res.iter().filter(|r| r.kind == ConstructKind::CycleCount).collect();
        assert_eq!(stubs.len(), 2);
        for r in stubs {
            assert_eq!(r.rewrite, Rewrite::Stub { value: "0u64".into() });
            assert!(r.warnings.iter().any(|w| w.code == WarningCode::CycleCountUnavailable
                && w.message.contains("cycle counting unavailable on target")));
        }
    }

    #[test]
    fn word_to_byte_raw_reads_drop_padding() {
        let (res, _) = guest(fixtures::RISC0_BYTES_GUEST, PlatformId::Risc0, PlatformId::Sp1);
        let adapted: Vec<&Resolution> = res.iter().filter(|r| matches!(r.action, Action::Adapt(_))).collect();
        assert_eq!(adapted.len(), 2);
        for r in &adapted {
            assert!(r.action.describe().contains("alignment padding removed"));
        }
        assert_eq!(
            adapted[0].action,
            Action::Adapt(vec![Adaptation::AlignmentPaddingRemoved {
                payload_bytes: Some(1),
                word_bytes: 4,
            }])
        );
    }

    #[test]
    fn byte_to_word_raw_writes_add_padding() {
        let text = "sp1_zkvm::entrypoint!(main);\npub fn main() { let v = [1u8, 2, 3]; sp1_zkvm::io::commit_slice(&v); }";
        let (res, _) = guest(text, PlatformId::Sp1, PlatformId::Risc0);
        assert!(matches!(
            &res[1].action,
            Action::Adapt(a) if matches!(a[0], Adaptation::AlignmentPaddingAdded { word_bytes: 4, .. })
        ));
    }

    #[test]
    fn hint_split_requires_confirmation() {
        let (res, _) = guest(fixtures::SP1_CHECK_GUEST, PlatformId::Sp1, PlatformId::Nexus);
        let channels: Vec<Channel> = res.iter().filter_map(|r| r.channel).collect();
        assert_eq!(channels, vec![Channel::Proven, Channel::Proven, Channel::Hint]);
        assert_eq!(
            res[3].rewrite,
            Rewrite::Template {
                kind: ConstructKind::Hint
            }
        );
        assert!(res[1..4]
            .iter()
            .all(|r| r.warnings.iter().any(|w| w.requires_confirmation)));
    }

    #[test]
    fn host_writes_follow_guest_channels() {
        let res = host(
            fixtures::SP1_CHECK_GUEST,
            fixtures::SP1_CHECK_HOST,
            PlatformId::Sp1,
            PlatformId::Nexus,
        );
        let channels: Vec<Channel> = res.iter().filter_map(|r| r.channel).collect();
        assert_eq!(channels, vec![Channel::Proven, Channel::Proven, Channel::Hint]);
    }

    #[test]
    fn host_writes_follow_guest_slots() {
        let res = host(
            fixtures::RISC0_SLICES_GUEST,
            fixtures::RISC0_SLICES_HOST,
            PlatformId::Risc0,
            PlatformId::Jolt,
        );
        assert_eq!(res[0].rewrite, Rewrite::BundleChannel);
        let slots: Vec<usize> = res
            .iter()
            .filter_map(|r| match r.rewrite {
                Rewrite::Bundle { slot, .. } => Some(slot),
                _ => None,
            })
            .collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn bundled_host_sites_carry_rewrite_warnings() {
        let guest_text = "use risc0_zkvm::guest::env;\nrisc0_zkvm::guest::entry!(main);\nfn main() {\n    let x: u32 = env::read();\n    env::commit(&x);\n}\n";
        let host_text = "use risc0_zkvm::{default_prover, ExecutorEnv};\nfn main() {\n    let n: u32 = 3;\n    let env = ExecutorEnv::builder().write(&n).build().unwrap();\n    let receipt = default_prover().prove(env, GUEST_ELF).unwrap().receipt;\n    let out: u32 = receipt.journal.decode().unwrap();\n}\n";
        let res = host(guest_text, host_text, PlatformId::Risc0, PlatformId::Jolt);
        assert_eq!(res.len(), 3);
        let rewrites: Vec<&Warning> = res
            .iter()
            .map(|r| r.warnings.iter().find(|w| w.code == WarningCode::HostRewrite))
            .collect::<Option<_>>()
            .unwrap();
        assert!(!rewrites[0].requires_confirmation);
        assert!(rewrites[1].requires_confirmation);
        assert!(rewrites[1].message.contains("chained builder write"));
        assert!(rewrites[2].message.contains("`__output.0`"));
        assert!(!rewrites[2].requires_confirmation);
    }

    #[test]
    fn hints_merge_without_a_hint_channel() {
        let (res, _) = guest(fixtures::NEXUS_GUEST, PlatformId::Nexus, PlatformId::Sp1);
        let hint = res.iter().find(|r| r.kind == ConstructKind::Hint).unwrap();
        assert_eq!(hint.action, Action::Adapt(vec![Adaptation::HintMerged]));
        assert_eq!(hint.channel, Some(Channel::Proven));
        assert_eq!(
            hint.rewrite,
            Rewrite::Template {
                kind: ConstructKind::StructuredRead
            }
        );
    }

    #[test]
    fn unbounded_values_cannot_be_bundled() {
        let text = "sp1_zkvm::entrypoint!(main);\npub fn main() { let v: Vec<u8> = sp1_zkvm::io::read(); }";
        let (res, outcomes) = guest(text, PlatformId::Sp1, PlatformId::Jolt);
        assert!(matches!(
            res[1].action,
            Action::Unsupported(Unsupported::Impossible { .. })
        ));
        assert_eq!(res[1].rewrite, Rewrite::Neutral);
        assert!(outcomes.layout.is_empty());
    }

    #[test]
    fn precompiles_degrade_from_accelerated() {
        let text = "use sha2::{Digest, Sha256};\nsp1_zkvm::entrypoint!(main);\npub fn main() { let h = Sha256::digest(b\"x\"); }";
        let (res, _) = guest(text, PlatformId::Sp1, PlatformId::Jolt);
        let pre = res.iter().find(|r| r.kind == ConstructKind::PrecompileCall).unwrap();
        assert_eq!(
            pre.action,
            Action::Adapt(vec![Adaptation::PrecompileDegraded {
                operation: "sha256".into()
            }])
        );
        assert!(pre.warnings.iter().any(|w| w.code == WarningCode::PrecompileDegraded));
    }

    #[test]
    fn same_platform_is_identity() {
        for (text, id) in [
            (fixtures::SP1_GUEST, PlatformId::Sp1),
            (fixtures::RISC0_CYCLES_GUEST, PlatformId::Risc0),
            (fixtures::NEXUS_GUEST, PlatformId::Nexus),
            (fixtures::JOLT_GUEST, PlatformId::Jolt),
        ] {
            let (res, _) = guest(text, id, id);
            assert!(res.iter().all(|r| r.is_direct()), "{id}");
        }
    }
}
