//! zkport CLI — port zkVM guest/host programs between platforms.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::TransferArgs;
use manifest::ZkportManifest;

#[derive(Parser)]
#[command(name = "zkport", version, about = "Port zkVM programs between SP1, RISC Zero, OpenVM, Nexus and Jolt")]
struct Cli {
    /// Log pipeline phases (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new zkport project
    Init {
        /// Project name
        name: String,
    },
    /// Analyze a program pair and report what a transfer would change
    Assess {
        #[command(flatten)]
        transfer: TransferArgs,
        /// Report format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Generate the ported program
    Generate {
        #[command(flatten)]
        transfer: TransferArgs,
        /// Accept every decision in the report, including those needing confirmation
        #[arg(long)]
        confirm: bool,
        /// Output directory (default: [output] dir, then out/)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Inspect the platform catalog
    Platform {
        #[command(subcommand)]
        action: PlatformAction,
    },
}

#[derive(Subcommand)]
enum PlatformAction {
    /// List all platforms
    List,
    /// Show a platform's capabilities
    Describe {
        /// Platform identifier
        id: String,
        /// Output format (text, toml)
        #[arg(long)]
        format: Option<String>,
    },
    /// Validate a .platform.toml file
    Validate {
        /// Path to the row
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&name),

        Commands::Assess { transfer, format } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            let catalog = commands::load_catalog(&project_dir, manifest.as_ref())?;
            let (request, config) =
                commands::resolve_request(&project_dir, manifest.as_ref(), &transfer)?;
            commands::assess::run(&catalog, &request, &config, &format)
        }

        Commands::Generate {
            transfer,
            confirm,
            out,
        } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or_else(|| cwd.clone());
            let catalog = commands::load_catalog(&project_dir, manifest.as_ref())?;
            let (request, config) =
                commands::resolve_request(&project_dir, manifest.as_ref(), &transfer)?;
            let out_dir = match (out, manifest.as_ref().and_then(|m| m.output.dir.clone())) {
                (Some(flag), _) => flag,
                (None, Some(dir)) => project_dir.join(dir),
                (None, None) => cwd.join("out"),
            };
            commands::generate::run(&catalog, &request, &config, confirm, &out_dir)
        }

        Commands::Platform { action } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            match action {
                PlatformAction::List => {
                    let catalog = commands::load_catalog(&project_dir, manifest.as_ref())?;
                    commands::platform::list(&catalog)
                }
                PlatformAction::Describe { id, format } => {
                    let catalog = commands::load_catalog(&project_dir, manifest.as_ref())?;
                    commands::platform::describe(&catalog, &id, format.as_deref())
                }
                PlatformAction::Validate { file } => commands::platform::validate(&file),
            }
        }
    }
}

/// Try to load a manifest from the current directory upward. Returns
/// (None, None) if not found.
fn load_manifest_optional(cwd: &Path) -> anyhow::Result<(Option<ZkportManifest>, Option<PathBuf>)> {
    match ZkportManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((Some(manifest), Some(dir))),
        None => Ok((None, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "zkport", "generate", "--source", "risc0", "--target", "jolt", "--guest", "g.rs",
            "--host", "h.rs", "--confirm", "--out", "ported",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                transfer,
                confirm,
                out,
            } => {
                assert_eq!(transfer.source.as_deref(), Some("risc0"));
                assert_eq!(transfer.guest.as_deref(), Some(Path::new("g.rs")));
                assert!(confirm);
                assert_eq!(out.as_deref(), Some(Path::new("ported")));
            }
            _ => panic!("expected generate"),
        }
    }
}
