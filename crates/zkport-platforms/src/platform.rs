//! The closed catalog of platform identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// One of the five supported zkVM platforms.
///
/// Adding a platform means adding a variant here and a row in `platforms/`;
/// nothing in the transfer engine matches on these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Sp1,
    Risc0,
    #[serde(rename = "openvm")]
    OpenVm,
    Nexus,
    Jolt,
}

impl PlatformId {
    pub const ALL: [PlatformId; 5] = [
        PlatformId::Sp1,
        PlatformId::Risc0,
        PlatformId::OpenVm,
        PlatformId::Nexus,
        PlatformId::Jolt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Sp1 => "sp1",
            PlatformId::Risc0 => "risc0",
            PlatformId::OpenVm => "openvm",
            PlatformId::Nexus => "nexus",
            PlatformId::Jolt => "jolt",
        }
    }

    /// Position of this platform's row in the catalog.
    pub(crate) fn index(&self) -> usize {
        match self {
            PlatformId::Sp1 => 0,
            PlatformId::Risc0 => 1,
            PlatformId::OpenVm => 2,
            PlatformId::Nexus => 3,
            PlatformId::Jolt => 4,
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PlatformError::UnknownPlatform { name: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_ids() {
        assert_eq!("sp1".parse::<PlatformId>().unwrap(), PlatformId::Sp1);
        assert_eq!("RISC0".parse::<PlatformId>().unwrap(), PlatformId::Risc0);
        assert_eq!(" openvm ".parse::<PlatformId>().unwrap(), PlatformId::OpenVm);
    }

    #[test]
    fn unknown_id_is_configuration_error() {
        let err = "zkwasm".parse::<PlatformId>().unwrap_err();
        assert!(matches!(err, PlatformError::UnknownPlatform { ref name } if name == "zkwasm"));
    }

    #[test]
    fn indices_are_dense() {
        for (i, id) in PlatformId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(id.as_str().parse::<PlatformId>().unwrap(), *id);
        }
    }
}
