//! zkVM platform capability model for zkport.
//!
//! Each supported platform is described by one immutable
//! [`PlatformProfile`] row loaded from TOML:
//! - **Vocabulary:** which constructs exist on the guest and host side, the
//!   call shapes that recognize them, and the templates that emit them
//! - **Semantics:** entry style, data alignment, hint channel, streaming I/O
//! - **Precompiles:** accelerated, software, or unavailable per operation
//! - **Fallbacks:** what to do when a construct has no equivalent
//!
//! The [`Catalog`] holds exactly one row per [`PlatformId`] and answers
//! [`Catalog::capability`] queries without any per-platform code paths.

pub mod capability;
pub mod catalog;
pub mod error;
pub mod platform;
pub mod profile;
pub mod shape;
pub mod template;

pub use capability::{Capability, FallbackPolicy, Rule};
pub use catalog::{
    load_profile_toml, parse_profile_toml, profile_to_toml, validate_profile, Catalog,
    ValidationIssue,
};
pub use error::{PlatformError, Result};
pub use platform::PlatformId;
pub use profile::{
    Alignment, BundleTemplates, EntryStyle, FallbackTable, KindEntry, LogicalDependency,
    PlatformProfile, PrecompileEntry, PrecompileStatus, Vocabulary,
};
pub use shape::{CallShape, Receiver};
pub use template::Template;
