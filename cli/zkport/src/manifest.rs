//! `zkport.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use zkport_transfer::TransferConfig;

/// The top-level manifest structure for a zkport project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZkportManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    /// Default transfer inputs and engine settings.
    #[serde(default)]
    pub transfer: TransferSection,
    /// Replacement platform rows.
    #[serde(default)]
    pub platforms: PlatformsSection,
    #[serde(default)]
    pub output: OutputSection,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required).
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// `[transfer]`: every key can be overridden on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransferSection {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    /// Guest source file, relative to the project directory.
    #[serde(default)]
    pub guest: Option<PathBuf>,
    /// Host source file, relative to the project directory.
    #[serde(default)]
    pub host: Option<PathBuf>,
    #[serde(default)]
    pub max_constructs: Option<usize>,
    #[serde(default)]
    pub parallel_analysis: Option<bool>,
}

/// `[platforms]`: `.platform.toml` files that replace built-in rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformsSection {
    #[serde(default)]
    pub rows: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl ZkportManifest {
    /// Search upward from `start_dir` for a `zkport.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join("zkport.toml");
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: ZkportManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing zkport.toml")
    }

    /// Engine settings, with defaults for anything the manifest leaves out.
    pub fn transfer_config(&self) -> TransferConfig {
        let defaults = TransferConfig::default();
        TransferConfig {
            max_constructs: self.transfer.max_constructs.unwrap_or(defaults.max_constructs),
            parallel_analysis: self
                .transfer
                .parallel_analysis
                .unwrap_or(defaults.parallel_analysis),
        }
    }

    /// Generate the default template for `zkport init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"
version = "0.1.0"

[transfer]
source = "sp1"
target = "risc0"
guest = "guest/src/main.rs"
host = "host/src/main.rs"

[output]
dir = "out"
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let toml_str = r#"
[project]
name = "fib-port"
version = "1.0.0"
description = "Fibonacci on every zkVM"

[transfer]
source = "risc0"
target = "jolt"
guest = "methods/guest/src/main.rs"
host = "host/src/main.rs"
max-constructs = 64
parallel-analysis = false

[platforms]
rows = ["rows/jolt.platform.toml"]

[output]
dir = "ported"
"#;
        let manifest = ZkportManifest::from_str(toml_str).unwrap();
        assert_eq!(manifest.project.name, "fib-port");
        assert_eq!(manifest.transfer.source.as_deref(), Some("risc0"));
        assert_eq!(
            manifest.transfer.guest.as_deref(),
            Some(Path::new("methods/guest/src/main.rs"))
        );
        assert_eq!(manifest.platforms.rows.len(), 1);
        assert_eq!(manifest.output.dir.as_deref(), Some(Path::new("ported")));

        let config = manifest.transfer_config();
        assert_eq!(config.max_constructs, 64);
        assert!(!config.parallel_analysis);
    }

    #[test]
    fn parse_minimal_manifest() {
        let manifest = ZkportManifest::from_str("[project]\nname = \"minimal\"\n").unwrap();
        assert_eq!(manifest.project.version, "0.1.0");
        assert!(manifest.transfer.source.is_none());
        assert!(manifest.platforms.rows.is_empty());
        assert_eq!(manifest.transfer_config(), TransferConfig::default());
    }

    #[test]
    fn reject_invalid_toml() {
        assert!(ZkportManifest::from_str("this is not valid toml [[[").is_err());
    }

    #[test]
    fn template_is_valid_toml() {
        let manifest = ZkportManifest::from_str(&ZkportManifest::template("demo")).unwrap();
        assert_eq!(manifest.project.name, "demo");
        assert_eq!(manifest.transfer.target.as_deref(), Some("risc0"));
        assert_eq!(manifest.output.dir.as_deref(), Some(Path::new("out")));
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zkport.toml"), "[project]\nname = \"parent\"\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found_dir) = ZkportManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.project.name, "parent");
        assert_eq!(found_dir, dir.path());
    }
}
