//! The single capability query over a platform row.

use serde::{Deserialize, Serialize};
use zkport_core::{ConstructKind, Side};

use crate::profile::{KindEntry, PlatformProfile, PrecompileEntry, PrecompileStatus};
use crate::template::Template;

/// What to do with a construct kind the target lacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Collapse statically bounded values into one aggregate input/output.
    Bundle,
    /// Replace the construct with a neutral constant.
    Stub(String),
    /// Emit the construct through another kind's templates.
    Reroute(ConstructKind),
    /// No fallback exists.
    None,
}

/// The emission templates a capability grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule<'a> {
    pub kind: ConstructKind,
    pub template: Option<&'a Template>,
    pub fill: Option<&'a Template>,
    pub marker: Option<&'a Template>,
    pub signature: Option<&'a Template>,
}

impl<'a> Rule<'a> {
    fn from_entry(kind: ConstructKind, entry: &'a KindEntry) -> Self {
        Self {
            kind,
            template: entry.template.as_ref(),
            fill: entry.fill.as_ref(),
            marker: entry.marker.as_ref(),
            signature: entry.signature.as_ref(),
        }
    }

    fn from_precompile(entry: &'a PrecompileEntry) -> Self {
        Self {
            kind: ConstructKind::PrecompileCall,
            template: entry.template.as_ref(),
            fill: None,
            marker: None,
            signature: None,
        }
    }
}

/// Answer to `capability(platform, kind)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<'a> {
    Supported(Rule<'a>),
    /// Available, at a cost described by `penalty`.
    Degraded { rule: Rule<'a>, penalty: String },
    Unsupported(FallbackPolicy),
}

impl PlatformProfile {
    /// Availability of `kind` on `side` of this platform.
    ///
    /// `operation` names the precompile for [`ConstructKind::PrecompileCall`]
    /// and is ignored otherwise.
    pub fn capability(
        &self,
        side: Side,
        kind: ConstructKind,
        operation: Option<&str>,
    ) -> Capability<'_> {
        if kind == ConstructKind::PrecompileCall {
            let entry = operation.and_then(|op| self.precompiles.get(op));
            return match entry {
                Some(e) if e.template.is_some() => match e.status {
                    PrecompileStatus::Accelerated => Capability::Supported(Rule::from_precompile(e)),
                    PrecompileStatus::Software => Capability::Degraded {
                        rule: Rule::from_precompile(e),
                        penalty: format!(
                            "{} runs as a software implementation on {}; expect a higher cycle count",
                            operation.unwrap_or("precompile"),
                            self.display_name
                        ),
                    },
                    PrecompileStatus::Unavailable => {
                        Capability::Unsupported(self.fallback.get(kind))
                    }
                },
                _ => Capability::Unsupported(self.fallback.get(kind)),
            };
        }

        match self.vocabulary(side).get(kind) {
            Some(entry) => Capability::Supported(Rule::from_entry(kind, entry)),
            None => Capability::Unsupported(self.fallback.get(kind)),
        }
    }
}
