//! Error types for platform catalog operations.

use std::path::PathBuf;

/// Errors that can occur while loading or querying platform profiles.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The identifier does not name one of the cataloged platforms.
    #[error("unknown platform '{name}' (expected one of: sp1, risc0, openvm, nexus, jolt)")]
    UnknownPlatform {
        /// The rejected identifier.
        name: String,
    },

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading a profile file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Profile file not found.
    #[error("platform file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// A call shape string could not be parsed.
    #[error("invalid call shape '{shape}': {detail}")]
    InvalidShape {
        /// The offending shape text.
        shape: String,
        /// What was wrong with it.
        detail: String,
    },

    /// A profile failed structural validation.
    #[error("validation error in '{platform}': {detail}")]
    Validation {
        /// Platform whose row is invalid.
        platform: String,
        /// Description of the validation failures.
        detail: String,
    },
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
