//! `zkport platform` — catalog listing, description, and row validation.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use zkport_core::Side;
use zkport_platforms::{load_profile_toml, profile_to_toml, validate_profile, Catalog, PlatformId};

/// List every cataloged platform.
pub fn list(catalog: &Catalog) -> Result<()> {
    println!("Platforms:");
    println!();
    for profile in catalog.profiles() {
        println!(
            "  {:<8} {:<12} {}",
            profile.id.as_str(),
            profile.display_name,
            profile.description
        );
    }
    println!();
    println!("Use 'zkport platform describe <id>' for details.");
    Ok(())
}

pub fn describe(catalog: &Catalog, id: &str, format: Option<&str>) -> Result<()> {
    println!("{}", describe_text(catalog, id, format)?);
    Ok(())
}

/// A platform row as a readable summary, or as TOML with `--format toml`.
pub fn describe_text(catalog: &Catalog, id: &str, format: Option<&str>) -> Result<String> {
    let id: PlatformId = id
        .parse()
        .with_context(|| "use 'zkport platform list' to see available platforms")?;
    let profile = catalog.profile(id);

    match format {
        None | Some("text") => {}
        Some("toml") => return profile_to_toml(profile).context("serializing platform row"),
        Some(other) => bail!("unknown format '{other}' (expected text or toml)"),
    }

    let mut out = String::new();
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    writeln!(out, "=== Platform: {} ({}) ===", profile.display_name, profile.id)?;
    if !profile.description.is_empty() {
        writeln!(out, "{}", profile.description)?;
    }
    writeln!(out)?;

    writeln!(out, "--- Semantics ---")?;
    writeln!(out, "  Entry style:  {}", profile.entry_style.as_str())?;
    writeln!(
        out,
        "  Alignment:    {} ({}-byte words)",
        profile.alignment.as_str(),
        profile.word_size_bytes
    )?;
    writeln!(out, "  Hint channel: {}", yes_no(profile.hint_channel_present))?;
    writeln!(out, "  Streaming IO: {}", yes_no(profile.streaming_io_supported))?;
    writeln!(out, "  Cycle count:  {}", yes_no(profile.cycle_count_supported))?;
    writeln!(out)?;

    for side in [Side::Guest, Side::Host] {
        writeln!(out, "--- {side} vocabulary ---")?;
        for (kind, entry) in profile.vocabulary(side).entries() {
            let shapes: Vec<String> = entry.shapes.iter().map(|s| s.to_string()).collect();
            writeln!(out, "  {:<18} {}", kind.as_str(), shapes.join(", "))?;
        }
        writeln!(out)?;
    }

    if !profile.precompiles.is_empty() {
        writeln!(out, "--- Precompiles ---")?;
        for (op, entry) in &profile.precompiles {
            writeln!(out, "  {op:<12} {:?}", entry.status)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "--- Dependencies ---")?;
    for dep in &profile.dependencies {
        writeln!(out, "  {} {} ({})", dep.name, dep.version, dep.side)?;
    }
    Ok(out.trim_end().to_string())
}

/// Parse and validate a `.platform.toml` file.
pub fn validate(path: &Path) -> Result<()> {
    let profile = load_profile_toml(path).with_context(|| format!("loading {}", path.display()))?;
    match validate_profile(&profile) {
        Ok(()) => {
            println!("{}: valid ({})", path.display(), profile.id);
            Ok(())
        }
        Err(issues) => {
            for issue in &issues {
                println!("  {}: {}", issue.severity, issue.message);
            }
            let errors = issues.iter().filter(|i| i.severity == "error").count();
            if errors > 0 {
                bail!("{}: {errors} validation error(s)", path.display());
            }
            Ok(())
        }
    }
}
