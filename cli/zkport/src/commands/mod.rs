//! CLI command implementations.

pub mod assess;
pub mod generate;
pub mod init;
pub mod platform;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use zkport_platforms::{load_profile_toml, Catalog, PlatformId};
use zkport_transfer::{TransferConfig, TransferRequest};

use crate::manifest::ZkportManifest;

/// Transfer inputs given on the command line. Each overrides `[transfer]`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct TransferArgs {
    /// Source platform (sp1, risc0, openvm, nexus, jolt)
    #[arg(long)]
    pub source: Option<String>,
    /// Target platform
    #[arg(long)]
    pub target: Option<String>,
    /// Guest source file
    #[arg(long)]
    pub guest: Option<PathBuf>,
    /// Host source file
    #[arg(long)]
    pub host: Option<PathBuf>,
}

/// Built-in catalog with any manifest row replacements applied.
pub fn load_catalog(project_dir: &Path, manifest: Option<&ZkportManifest>) -> Result<Catalog> {
    let mut catalog = Catalog::builtin().context("loading built-in platform rows")?;
    for row in manifest.map(|m| m.platforms.rows.as_slice()).unwrap_or_default() {
        let path = project_dir.join(row);
        let profile = load_profile_toml(&path).with_context(|| format!("loading {}", path.display()))?;
        tracing::debug!(platform = %profile.id, path = %path.display(), "replacing built-in row");
        catalog = catalog
            .with_profile(profile)
            .with_context(|| format!("applying {}", path.display()))?;
    }
    Ok(catalog)
}

/// Merge flags over the manifest and read both source files.
///
/// Paths from flags are taken as given; paths from the manifest are relative
/// to the project directory.
pub fn resolve_request(
    project_dir: &Path,
    manifest: Option<&ZkportManifest>,
    args: &TransferArgs,
) -> Result<(TransferRequest, TransferConfig)> {
    let section = manifest.map(|m| &m.transfer);
    let source = platform_arg("source", args.source.as_deref(), section.and_then(|s| s.source.as_deref()))?;
    let target = platform_arg("target", args.target.as_deref(), section.and_then(|s| s.target.as_deref()))?;

    let path = |flag: &Option<PathBuf>, fallback: Option<&PathBuf>, what: &str| -> Result<PathBuf> {
        match (flag, fallback) {
            (Some(p), _) => Ok(p.clone()),
            (None, Some(p)) => Ok(project_dir.join(p)),
            (None, None) => bail!("no {what} source given (use --{what} or [transfer] {what} in zkport.toml)"),
        }
    };
    let guest_path = path(&args.guest, section.and_then(|s| s.guest.as_ref()), "guest")?;
    let host_path = path(&args.host, section.and_then(|s| s.host.as_ref()), "host")?;

    let guest = std::fs::read_to_string(&guest_path)
        .with_context(|| format!("reading {}", guest_path.display()))?;
    let host = std::fs::read_to_string(&host_path)
        .with_context(|| format!("reading {}", host_path.display()))?;

    let config = manifest
        .map(ZkportManifest::transfer_config)
        .unwrap_or_default();
    Ok((
        TransferRequest {
            source,
            target,
            guest,
            host,
        },
        config,
    ))
}

fn platform_arg(what: &str, flag: Option<&str>, manifest: Option<&str>) -> Result<PlatformId> {
    let Some(name) = flag.or(manifest) else {
        bail!("no {what} platform given (use --{what} or [transfer] {what} in zkport.toml)");
    };
    name.parse::<PlatformId>()
        .with_context(|| format!("invalid --{what}"))
}
