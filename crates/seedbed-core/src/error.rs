//! Registry error types.

use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Which kind of fixture a lookup named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Identity,
    Group,
}

impl Display for FixtureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Group => f.write_str("group"),
        }
    }
}

/// Errors raised by the fixture registry.
///
/// Both variants are programmer errors surfaced before any store
/// interaction: a reference to a key that was never defined, or a lookup
/// for one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A group definition referenced an identity key that was not
    /// previously defined. Raised eagerly at definition time.
    #[error("group '{group_key}' references undefined identity key '{identity_key}'")]
    UndefinedReference {
        group_key: String,
        identity_key: String,
    },

    /// Lookup of a key that was never defined.
    #[error("{kind} fixture not found: '{key}'")]
    NotFound { kind: FixtureKind, key: String },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
