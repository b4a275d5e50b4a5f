//! Guest/host programs shared by the transfer tests.

use zkport_platforms::{Catalog, PlatformId, PlatformProfile};

pub fn catalog() -> Catalog {
    Catalog::builtin().unwrap()
}

pub fn profile(id: PlatformId) -> PlatformProfile {
    catalog().profile(id).clone()
}

pub const SP1_GUEST: &str = r#"#![no_main]
sp1_zkvm::entrypoint!(main);

pub fn main() {
    // Read the number of iterations.
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

pub const SP1_HOST: &str = r#"use sp1_sdk::{ProverClient, SP1Stdin};

const ELF: &[u8] = include_bytes!("../../elf/fibonacci");

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

/// Five word-array buffers filled by raw reads.
pub const RISC0_SLICES_GUEST: &str = r#"use risc0_zkvm::guest::env;

risc0_zkvm::guest::entry!(main);

fn main() {
    let mut a = [0u32; 4];
    env::read_slice(&mut a);
    let mut b = [0u32; 4];
    env::read_slice(&mut b);
    let mut c = [0u32; 4];
    env::read_slice(&mut c);
    let mut d = [0u32; 4];
    env::read_slice(&mut d);
    let mut e = [0u32; 4];
    env::read_slice(&mut e);
    for i in 0..4 {
        assert!(a[i] ^ b[i] ^ c[i] ^ d[i] == e[i]);
    }
}
"#;

pub const RISC0_SLICES_HOST: &str = r#"use risc0_zkvm::{default_prover, ExecutorEnv};

fn main() -> anyhow::Result<()> {
    let a: [u32; 4] = [1, 2, 3, 4];
    let b: [u32; 4] = [5, 6, 7, 8];
    let c: [u32; 4] = [9, 10, 11, 12];
    let d: [u32; 4] = [13, 14, 15, 16];
    let e: [u32; 4] = [0, 0, 0, 0];
    let mut builder = ExecutorEnv::builder();
    builder.write_slice(&a);
    builder.write_slice(&b);
    builder.write_slice(&c);
    builder.write_slice(&d);
    builder.write_slice(&e);
    let env = builder.build()?;
    let receipt = default_prover().prove(env, GUEST_ELF)?.receipt;
    receipt.verify(GUEST_ID)?;
    Ok(())
}
"#;

pub const RISC0_CYCLES_GUEST: &str = r#"use risc0_zkvm::guest::env;

risc0_zkvm::guest::entry!(main);

fn main() {
    let start = env::cycle_count();
    let x: u64 = env::read();
    let y = x * x;
    let used = env::cycle_count() - start;
    env::commit(&y);
    env::commit(&used);
}
"#;

/// A one-byte tag and a four-byte word read as raw slices.
pub const RISC0_BYTES_GUEST: &str = r#"use risc0_zkvm::guest::env;

risc0_zkvm::guest::entry!(main);

fn main() {
    let mut tag = [0u8; 1];
    env::read_slice(&mut tag);
    let mut word = [0u8; 4];
    env::read_slice(&mut word);
    env::commit(&(tag[0] as u32 + u32::from_le_bytes(word)));
}
"#;

pub const RISC0_BYTES_HOST: &str = r#"use risc0_zkvm::{default_prover, ExecutorEnv};

fn main() {
    let tag: [u8; 1] = [7];
    let word: [u8; 4] = 42u32.to_le_bytes();
    let env = ExecutorEnv::builder()
        .write_slice(&tag)
        .write_slice(&word)
        .build()
        .unwrap();
    let receipt = default_prover().prove(env, GUEST_ELF).unwrap().receipt;
    let total: u32 = receipt.journal.decode().unwrap();
    println!("{total}");
}
"#;

pub const NEXUS_GUEST: &str = r#"#![cfg_attr(target_arch = "riscv32", no_std, no_main)]

#[nexus_rt::main]
fn main() {
    let n = nexus_rt::read_public_input::<u32>().unwrap_or_default();
    let secret = nexus_rt::read_private_input::<u32>().unwrap_or_default();
    assert!(secret < n);
    nexus_rt::write_public_output(&n);
}
"#;

pub const JOLT_GUEST: &str = r#"#![cfg_attr(feature = "guest", no_std)]

#[jolt::provable]
fn fib(n: u32) -> u128 {
    let mut a: u128 = 0;
    let mut b: u128 = 1;
    for _ in 1..n {
        let sum = a + b;
        a = b;
        b = sum;
    }
    b
}
"#;

pub const JOLT_HOST: &str = r#"pub fn main() {
    let target_dir = "/tmp/jolt-guest-targets";
    let mut program = guest::compile_fib(target_dir);
    let prover_preprocessing = guest::preprocess_prover_fib(&mut program);
    let prove_fib = guest::build_prover_fib(program, prover_preprocessing);
    let (output, proof, io_device) = prove_fib(50);
    println!("output: {output}");
}
"#;

/// A guest whose reads feed a comparison against a committed value.
pub const SP1_CHECK_GUEST: &str = r#"sp1_zkvm::entrypoint!(main);

pub fn main() {
    let expected = sp1_zkvm::io::read::<u64>();
    let witness = sp1_zkvm::io::read::<u64>();
    let scratch = sp1_zkvm::io::read::<u64>();
    let square = witness * witness;
    assert_eq!(square, expected);
    let _ = scratch;
    sp1_zkvm::io::commit(&expected);
}
"#;

pub const SP1_CHECK_HOST: &str = r#"use sp1_sdk::SP1Stdin;

fn main() {
    let mut stdin = SP1Stdin::new();
    let expected: u64 = 49;
    let witness: u64 = 7;
    let scratch: u64 = 0;
    stdin.write(&expected);
    stdin.write(&witness);
    stdin.write(&scratch);
}
"#;
