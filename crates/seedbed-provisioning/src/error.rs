//! Provisioning error types.
//!
//! Transient store failures are retried invisibly inside the engine; what
//! surfaces here is terminal for the current fixture. A terminal error
//! aborts only that fixture's setup, never sibling fixtures, and never
//! leaves the lock held.

use std::fmt::{Display, Formatter};
use thiserror::Error;

use seedbed_core::{IdentityId, RegistryError};
use seedbed_lock::LockError;
use seedbed_store::StoreError;

/// Which verification read path failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPath {
    /// The writer's direct store read.
    Storage,
    /// The independently routed read real consumers use.
    Consumer,
}

impl Display for VerifyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage => f.write_str("storage"),
            Self::Consumer => f.write_str("consumer"),
        }
    }
}

/// Errors that can occur while provisioning fixtures.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Lock acquisition failed or timed out. Contention or a crashed
    /// holder; never silently retried beyond the configured wait.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Registry lookup or reference failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The transactional group write kept failing after the configured
    /// attempts.
    #[error("group '{group}' (owner {owner}) could not be created after {attempts} attempt(s)")]
    GroupCreation {
        group: String,
        owner: IdentityId,
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// A write that one of the read paths never confirmed within the
    /// retry bound: either not yet visible or incorrectly applied.
    #[error("group '{group}' (owner {owner}) failed {path} verification after {attempts} attempt(s)")]
    Verification {
        group: String,
        owner: IdentityId,
        path: VerifyPath,
        attempts: u32,
    },

    /// A store failure outside the retried creation loop.
    #[error("store error during {context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Result type for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
