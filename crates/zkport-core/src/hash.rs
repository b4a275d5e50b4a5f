//! Transfer plan fingerprints.
//!
//! A fingerprint is the SHA-256 digest of the platform pair and both source
//! units. Every field is length-prefixed, so text moving from the guest into
//! the host (or a renamed platform) always yields a different fingerprint.

use std::fmt;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Digest identifying the inputs of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of_transfer(source: &str, target: &str, guest: &str, host: &str) -> Self {
        let mut hasher = Sha256::new();
        for field in [source, target, guest, host] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First 16 hex digits, for human-facing output.
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_sources_same_fingerprint() {
        let a = Fingerprint::of_transfer("sp1", "risc0", "fn main() {}", "");
        let b = Fingerprint::of_transfer("sp1", "risc0", "fn main() {}", "");
        assert_eq!(a, b);
    }

    #[test]
    fn platform_pair_changes_fingerprint() {
        let a = Fingerprint::of_transfer("sp1", "risc0", "fn main() {}", "");
        let b = Fingerprint::of_transfer("sp1", "jolt", "fn main() {}", "");
        assert_ne!(a, b);
    }

    #[test]
    fn unit_boundaries_are_part_of_the_digest() {
        let a = Fingerprint::of_transfer("sp1", "risc0", "ab", "c");
        let b = Fingerprint::of_transfer("sp1", "risc0", "a", "bc");
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_as_hex() {
        let fp = Fingerprint::of_transfer("nexus", "jolt", "", "");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp.to_hex()));
        assert_eq!(fp.to_hex().len(), 64);
        assert!(fp.to_hex().starts_with(&fp.short()));
    }
}
