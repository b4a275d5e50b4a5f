//! Loading, validation, and lookup of platform rows.
//!
//! The five built-in rows live in `platforms/*.platform.toml` and are
//! embedded at compile time. [`Catalog::builtin`] parses and validates them
//! once; the resulting catalog is passed by reference to every consumer.

use std::path::Path;

use zkport_core::{ConstructKind, Side};

use crate::capability::{Capability, FallbackPolicy};
use crate::error::{PlatformError, Result};
use crate::platform::PlatformId;
use crate::profile::{Alignment, EntryStyle, PlatformProfile, PrecompileStatus};

const BUILTIN_ROWS: [(PlatformId, &str); 5] = [
    (PlatformId::Sp1, include_str!("../platforms/sp1.platform.toml")),
    (PlatformId::Risc0, include_str!("../platforms/risc0.platform.toml")),
    (PlatformId::OpenVm, include_str!("../platforms/openvm.platform.toml")),
    (PlatformId::Nexus, include_str!("../platforms/nexus.platform.toml")),
    (PlatformId::Jolt, include_str!("../platforms/jolt.platform.toml")),
];

/// Immutable set of platform profiles, one per [`PlatformId`].
#[derive(Debug, Clone)]
pub struct Catalog {
    profiles: Vec<PlatformProfile>,
}

impl Catalog {
    /// Parse and validate the embedded rows.
    pub fn builtin() -> Result<Self> {
        let profiles = BUILTIN_ROWS
            .iter()
            .map(|(id, text)| {
                let profile = parse_profile_toml(text)?;
                if profile.id != *id {
                    return Err(PlatformError::Validation {
                        platform: id.to_string(),
                        detail: format!("row declares id '{}'", profile.id),
                    });
                }
                Ok(profile)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_profiles(profiles)
    }

    /// Build a catalog from exactly one valid profile per platform.
    pub fn from_profiles(profiles: Vec<PlatformProfile>) -> Result<Self> {
        let mut slots: Vec<Option<PlatformProfile>> = vec![None; PlatformId::ALL.len()];
        for profile in profiles {
            if let Err(issues) = validate_profile(&profile) {
                let errors: Vec<_> = issues
                    .iter()
                    .filter(|i| i.severity == "error")
                    .map(|i| i.message.clone())
                    .collect();
                if !errors.is_empty() {
                    return Err(PlatformError::Validation {
                        platform: profile.id.to_string(),
                        detail: errors.join("; "),
                    });
                }
            }
            let slot = &mut slots[profile.id.index()];
            if slot.is_some() {
                return Err(PlatformError::Validation {
                    platform: profile.id.to_string(),
                    detail: "duplicate row".into(),
                });
            }
            *slot = Some(profile);
        }

        let mut rows = Vec::with_capacity(slots.len());
        for (id, slot) in PlatformId::ALL.iter().zip(slots) {
            match slot {
                Some(p) => rows.push(p),
                None => {
                    return Err(PlatformError::Validation {
                        platform: id.to_string(),
                        detail: "missing row".into(),
                    })
                }
            }
        }
        tracing::debug!(platforms = rows.len(), "platform catalog loaded");
        Ok(Self { profiles: rows })
    }

    /// Replace one row, re-validating it.
    pub fn with_profile(&self, profile: PlatformProfile) -> Result<Self> {
        let mut profiles: Vec<_> = self
            .profiles
            .iter()
            .filter(|p| p.id != profile.id)
            .cloned()
            .collect();
        profiles.push(profile);
        Self::from_profiles(profiles)
    }

    pub fn profile(&self, id: PlatformId) -> &PlatformProfile {
        &self.profiles[id.index()]
    }

    pub fn profiles(&self) -> impl Iterator<Item = &PlatformProfile> {
        self.profiles.iter()
    }

    /// `capability(platform, kind)`; see [`PlatformProfile::capability`].
    pub fn capability(
        &self,
        platform: PlatformId,
        side: Side,
        kind: ConstructKind,
        operation: Option<&str>,
    ) -> Capability<'_> {
        self.profile(platform).capability(side, kind, operation)
    }
}

/// A validation issue found in a platform row.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// Load a profile from a `.platform.toml` file.
pub fn load_profile_toml(path: &Path) -> Result<PlatformProfile> {
    if !path.exists() {
        return Err(PlatformError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_profile_toml(&content)
}

/// Parse a profile from a TOML string.
pub fn parse_profile_toml(toml_str: &str) -> Result<PlatformProfile> {
    let profile: PlatformProfile = toml::from_str(toml_str)?;
    Ok(profile)
}

/// Serialize a profile to pretty TOML.
pub fn profile_to_toml(profile: &PlatformProfile) -> Result<String> {
    let toml_str = toml::to_string_pretty(profile)?;
    Ok(toml_str)
}

/// Validate a profile for internal consistency.
///
/// Returns `Ok(())` if there are no issues, or `Err(issues)` listing them.
pub fn validate_profile(profile: &PlatformProfile) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut error = |message: String| {
        issues.push(ValidationIssue {
            severity: "error",
            message,
        })
    };

    // 1. Guest entry point with marker and signature templates
    match &profile.guest.entry_point {
        Some(entry) if entry.marker.is_some() && entry.signature.is_some() => {}
        Some(_) => error("guest entry-point needs both marker and signature templates".into()),
        None => error("guest entry-point is missing".into()),
    }

    // 2-4. Capability flags agree with the guest vocabulary
    let flags = [
        (
            "streaming-io-supported",
            profile.streaming_io_supported,
            ConstructKind::StructuredRead,
        ),
        (
            "cycle-count-supported",
            profile.cycle_count_supported,
            ConstructKind::CycleCount,
        ),
        (
            "hint-channel-present",
            profile.hint_channel_present,
            ConstructKind::Hint,
        ),
    ];
    for (flag, value, kind) in flags {
        if value != profile.guest.get(kind).is_some() {
            error(format!(
                "{flag} = {value} disagrees with guest {kind} vocabulary"
            ));
        }
    }

    // 5. Function-invocation entry implies bundle templates and no streaming
    if profile.entry_style == EntryStyle::FunctionInvocation {
        if profile.streaming_io_supported {
            error("function-invocation platforms cannot declare streaming I/O".into());
        }
        if profile.bundle.is_none() {
            error("function-invocation platforms need [bundle] templates".into());
        }
    }
    let bundles = ConstructKind::ALL
        .iter()
        .any(|k| profile.fallback.get(*k) == FallbackPolicy::Bundle);
    if bundles && profile.bundle.is_none() {
        error("a bundle fallback is declared but [bundle] templates are missing".into());
    }

    // 6. Alignment agrees with raw vocabulary
    let has_raw = profile.guest.raw_read.is_some() || profile.guest.raw_commit.is_some();
    match profile.alignment {
        Alignment::NotApplicable if has_raw => {
            error("alignment is not-applicable but raw I/O kinds are present".into())
        }
        Alignment::WordAligned | Alignment::ByteAligned if !has_raw => {
            error(format!("alignment is {} but no raw I/O kinds are present", profile.alignment.as_str()))
        }
        Alignment::WordAligned if !profile.word_size_bytes.is_power_of_two() => error(format!(
            "word size {} is not a power of two",
            profile.word_size_bytes
        )),
        _ => {}
    }

    // 7-8. Vocabulary entries are complete and use known placeholders
    for side in [Side::Guest, Side::Host] {
        for (kind, entry) in profile.vocabulary(side).entries() {
            if entry.shapes.is_empty() {
                error(format!("{side} {kind} has no shapes"));
            }
            if kind != ConstructKind::EntryPoint && entry.template.is_none() {
                error(format!("{side} {kind} has no template"));
            }
            for template in entry.templates() {
                for p in template.unknown_placeholders() {
                    error(format!("{side} {kind} template uses unknown placeholder {{{p}}}"));
                }
            }
        }
    }
    if let Some(bundle) = &profile.bundle {
        for template in bundle.templates() {
            for p in template.unknown_placeholders() {
                error(format!("bundle template uses unknown placeholder {{{p}}}"));
            }
        }
    }

    // 9. Reroute targets exist on both sides that could need them
    for kind in ConstructKind::ALL {
        if let FallbackPolicy::Reroute(to) = profile.fallback.get(kind) {
            if to == kind || profile.guest.get(to).is_none() {
                error(format!("{kind} reroutes to {to}, which the guest vocabulary lacks"));
            }
        }
    }

    // 10. Usable precompiles carry shapes and a template
    for (op, entry) in &profile.precompiles {
        if entry.shapes.is_empty() {
            error(format!("precompile {op} has no shapes"));
        }
        if entry.status != PrecompileStatus::Unavailable && entry.template.is_none() {
            error(format!("precompile {op} is available but has no template"));
        }
        if let Some(t) = &entry.template {
            for p in t.unknown_placeholders() {
                error(format!("precompile {op} template uses unknown placeholder {{{p}}}"));
            }
        }
    }

    // 11. Fallbacks for kinds that are present are never used
    for kind in ConstructKind::ALL {
        if kind != ConstructKind::PrecompileCall
            && profile.guest.get(kind).is_some()
            && profile.host.get(kind).is_some()
            && profile.fallback.is_declared(kind)
        {
            issues.push(ValidationIssue {
                severity: "warning",
                message: format!("fallback for {kind} is unused; the kind is supported"),
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_all_rows() {
        let catalog = Catalog::builtin().unwrap();
        for id in PlatformId::ALL {
            assert_eq!(catalog.profile(id).id, id);
        }
        assert_eq!(catalog.profiles().count(), 5);
    }

    #[test]
    fn builtin_rows_validate_cleanly() {
        let catalog = Catalog::builtin().unwrap();
        for profile in catalog.profiles() {
            let result = validate_profile(profile);
            assert!(result.is_ok(), "{}: {:?}", profile.id, result.unwrap_err());
        }
    }

    #[test]
    fn builtin_semantics_table() {
        let catalog = Catalog::builtin().unwrap();
        let sp1 = catalog.profile(PlatformId::Sp1);
        assert_eq!(sp1.alignment, Alignment::ByteAligned);
        assert!(sp1.streaming_io_supported);
        let risc0 = catalog.profile(PlatformId::Risc0);
        assert_eq!(risc0.alignment, Alignment::WordAligned);
        assert_eq!(risc0.word_size_bytes, 4);
        assert!(risc0.cycle_count_supported);
        let jolt = catalog.profile(PlatformId::Jolt);
        assert_eq!(jolt.entry_style, EntryStyle::FunctionInvocation);
        assert!(!jolt.streaming_io_supported);
        assert!(catalog.profile(PlatformId::Nexus).hint_channel_present);
    }

    #[test]
    fn round_trip_toml() {
        let catalog = Catalog::builtin().unwrap();
        for profile in catalog.profiles() {
            let text = profile_to_toml(profile).unwrap();
            let parsed = parse_profile_toml(&text).unwrap();
            assert_eq!(&parsed, profile);
        }
    }

    #[test]
    fn parse_invalid_returns_error() {
        assert!(parse_profile_toml("this is not valid toml [[[").is_err());
        assert!(parse_profile_toml("id = \"sp1\"\n").is_err());
        assert!(parse_profile_toml(&BUILTIN_ROWS[0].1.replace("\"sp1\"", "\"sp2\"")).is_err());
    }

    #[test]
    fn validate_flag_disagreement() {
        let catalog = Catalog::builtin().unwrap();
        let mut profile = catalog.profile(PlatformId::Sp1).clone();
        profile.cycle_count_supported = true;
        let issues = validate_profile(&profile).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("cycle-count-supported")));
        assert!(catalog.with_profile(profile).is_err());
    }

    #[test]
    fn validate_missing_bundle_templates() {
        let catalog = Catalog::builtin().unwrap();
        let mut profile = catalog.profile(PlatformId::Jolt).clone();
        profile.bundle = None;
        let issues = validate_profile(&profile).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("[bundle]")));
    }

    #[test]
    fn validate_unknown_placeholder() {
        let catalog = Catalog::builtin().unwrap();
        let mut profile = catalog.profile(PlatformId::Sp1).clone();
        if let Some(entry) = profile.guest.structured_read.as_mut() {
            entry.template = Some(crate::template::Template::new("read::<{type}>()"));
        }
        let issues = validate_profile(&profile).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("{type}")));
    }

    #[test]
    fn validate_alignment_without_raw_io() {
        let catalog = Catalog::builtin().unwrap();
        let mut profile = catalog.profile(PlatformId::Nexus).clone();
        profile.alignment = Alignment::WordAligned;
        let issues = validate_profile(&profile).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("no raw I/O")));
    }

    #[test]
    fn load_not_found() {
        let result = load_profile_toml(Path::new("/nonexistent/x.platform.toml"));
        assert!(matches!(result.unwrap_err(), PlatformError::NotFound { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risc0.platform.toml");
        std::fs::write(&path, BUILTIN_ROWS[1].1).unwrap();
        let profile = load_profile_toml(&path).unwrap();
        assert_eq!(profile.id, PlatformId::Risc0);
    }

    #[test]
    fn with_profile_replaces_row() {
        let catalog = Catalog::builtin().unwrap();
        let mut profile = catalog.profile(PlatformId::OpenVm).clone();
        profile.display_name = "OpenVM (patched)".into();
        let updated = catalog.with_profile(profile).unwrap();
        assert_eq!(updated.profile(PlatformId::OpenVm).display_name, "OpenVM (patched)");
        assert_eq!(catalog.profile(PlatformId::OpenVm).display_name, "OpenVM");
    }
}
