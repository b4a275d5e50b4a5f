//! `zkport generate` — emit the ported guest and host sources.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use zkport_platforms::Catalog;
use zkport_transfer::{assess, generate, Artifacts, Report, TransferConfig, TransferRequest};

pub fn run(
    catalog: &Catalog,
    request: &TransferRequest,
    config: &TransferConfig,
    confirm: bool,
    out_dir: &Path,
) -> Result<()> {
    let assessment = assess(catalog, request, config).context("assessing transfer")?;
    println!("{}", assessment.report);
    println!();

    if assessment.report.is_blocked() {
        bail!("the transfer plan is blocked; fix the reported problems first");
    }
    if !confirm {
        bail!("review the report above and rerun with --confirm to generate");
    }

    let artifacts = generate(catalog, &assessment.plan.confirm()).context("generating target sources")?;
    let written = write_artifacts(out_dir, &assessment.report, &artifacts)?;
    println!("Generated {} files:", written.len());
    for path in &written {
        println!("  {}", path.display());
    }
    Ok(())
}

/// Write `guest.rs`, `host.rs`, `changes.json` and `dependencies.json`.
pub fn write_artifacts(out_dir: &Path, report: &Report, artifacts: &Artifacts) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let changes = serde_json::json!({
        "source": report.source,
        "target": report.target,
        "fingerprint": report.fingerprint,
        "changes": artifacts.changes,
    });
    let files = [
        ("guest.rs", artifacts.guest_source.clone()),
        ("host.rs", artifacts.host_source.clone()),
        (
            "changes.json",
            serde_json::to_string_pretty(&changes).context("serializing change log")?,
        ),
        (
            "dependencies.json",
            serde_json::to_string_pretty(&artifacts.dependencies).context("serializing dependencies")?,
        ),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = out_dir.join(name);
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkport_platforms::PlatformId;

    const GUEST: &str = "risc0_zkvm::guest::entry!(main);\nfn main() {\n    let x: u64 = risc0_zkvm::guest::env::read();\n    risc0_zkvm::guest::env::commit(&x);\n}\n";
    const HOST: &str = "fn main() {\n    let x: u64 = 7;\n    let env = risc0_zkvm::ExecutorEnv::builder().write(&x).build().unwrap();\n}\n";

    fn request() -> TransferRequest {
        TransferRequest {
            source: PlatformId::Risc0,
            target: PlatformId::Sp1,
            guest: GUEST.to_string(),
            host: HOST.to_string(),
        }
    }

    #[test]
    fn writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let catalog = Catalog::builtin().unwrap();

        run(&catalog, &request(), &TransferConfig::default(), true, &out).unwrap();

        let guest = fs::read_to_string(out.join("guest.rs")).unwrap();
        assert!(guest.contains("sp1_zkvm::entrypoint!(main);"));
        assert!(guest.contains("sp1_zkvm::io::read::<u64>()"));
        let host = fs::read_to_string(out.join("host.rs")).unwrap();
        assert!(host.contains("sp1_sdk::SP1Stdin::new().write(&x)"));

        let changes: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("changes.json")).unwrap()).unwrap();
        assert_eq!(changes["target"], "sp1");
        assert_eq!(changes["changes"].as_array().unwrap().len(), 5);

        let deps: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("dependencies.json")).unwrap()).unwrap();
        assert!(deps
            .as_array()
            .unwrap()
            .iter()
            .any(|d| d["name"] == "sp1-zkvm"));
    }

    #[test]
    fn refuses_without_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let catalog = Catalog::builtin().unwrap();

        let err = run(&catalog, &request(), &TransferConfig::default(), false, &out).unwrap_err();
        assert!(err.to_string().contains("--confirm"));
        assert!(!out.exists());
    }
}
