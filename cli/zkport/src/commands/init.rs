//! `zkport init` — project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::ZkportManifest;

const SAMPLE_GUEST: &str = r#"#![no_main]
sp1_zkvm::entrypoint!(main);

pub fn main() {
    let n = sp1_zkvm::io::read::<u32>();
    let mut a: u64 = 0;
    let mut b: u64 = 1;
    for _ in 0..n {
        let c = a.wrapping_add(b);
        a = b;
        b = c;
    }
    sp1_zkvm::io::commit(&b);
}
"#;

const SAMPLE_HOST: &str = r#"use sp1_sdk::{ProverClient, SP1Stdin};

const ELF: &[u8] = include_bytes!("../../elf/guest");

fn main() {
    let client = ProverClient::from_env();
    let mut stdin = SP1Stdin::new();
    let n: u32 = 20;
    stdin.write(&n);
    let (pk, vk) = client.setup(ELF);
    let mut proof = client.prove(&pk, &stdin).run().unwrap();
    let b = proof.public_values.read::<u64>();
    println!("fib({n}) = {b}");
    client.verify(&proof, &vk).unwrap();
}
"#;

/// Create a new zkport project in directory `name` relative to cwd.
pub fn run(name: &str) -> Result<()> {
    create_project(Path::new(name), name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    fs::create_dir_all(project_dir.join("guest/src")).context("creating guest/src/ directory")?;
    fs::create_dir_all(project_dir.join("host/src")).context("creating host/src/ directory")?;
    fs::create_dir_all(project_dir.join("out")).context("creating out/ directory")?;

    fs::write(project_dir.join("zkport.toml"), ZkportManifest::template(name))
        .context("writing zkport.toml")?;
    fs::write(project_dir.join("guest/src/main.rs"), SAMPLE_GUEST)
        .context("writing guest/src/main.rs")?;
    fs::write(project_dir.join("host/src/main.rs"), SAMPLE_HOST)
        .context("writing host/src/main.rs")?;
    fs::write(project_dir.join(".gitignore"), "out/\n").context("writing .gitignore")?;

    println!("Created project '{name}'");
    println!("  {name}/zkport.toml");
    println!("  {name}/guest/src/main.rs");
    println!("  {name}/host/src/main.rs");
    println!("  {name}/out/");
    println!("  {name}/.gitignore");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{resolve_request, TransferArgs};
    use zkport_platforms::{Catalog, PlatformId};

    #[test]
    fn init_creates_project_structure() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("demo");
        create_project(&project, "demo").unwrap();

        assert!(project.join("zkport.toml").is_file());
        assert!(project.join("guest/src/main.rs").is_file());
        assert!(project.join("host/src/main.rs").is_file());
        assert!(project.join("out").is_dir());
        assert!(project.join(".gitignore").is_file());
    }

    #[test]
    fn scaffold_assesses_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("fib");
        create_project(&project, "fib").unwrap();

        let content = fs::read_to_string(project.join("zkport.toml")).unwrap();
        let manifest = ZkportManifest::from_str(&content).unwrap();
        let (request, config) =
            resolve_request(&project, Some(&manifest), &TransferArgs::default()).unwrap();
        assert_eq!(request.source, PlatformId::Sp1);

        let assessment =
            zkport_transfer::assess(&Catalog::builtin().unwrap(), &request, &config).unwrap();
        assert!(!assessment.report.is_blocked());
        assert_eq!(assessment.report.totals.total, assessment.report.totals.direct);
    }

    #[test]
    fn init_refuses_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("existing");
        fs::create_dir(&project).unwrap();

        let err = create_project(&project, "existing").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
