//! seedbed Core Library
//!
//! Shared types for the seedbed fixture layer.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`IdentityId`, `GroupId`)
//! - [`fixture`] - Fixture entity definitions (identities, groups, roles)
//! - [`generator`] - Run-scoped collision-resistant name derivation
//! - [`registry`] - In-memory definition table with eager reference checks
//! - [`error`] - Registry error types
//!
//! # Example
//!
//! ```
//! use seedbed_core::{FixtureRegistry, GroupRole, IdentityGenerator};
//!
//! let mut registry = FixtureRegistry::new(IdentityGenerator::new());
//! registry.define_identity("owner", "owner", "Owner");
//! registry.define_identity("member", "member", "Member");
//! let group = registry
//!     .define_group("team", "team", "owner", &[("member", GroupRole::Member)])
//!     .expect("all references defined");
//! assert_eq!(group.members.len(), 1);
//! ```

pub mod error;
pub mod fixture;
pub mod generator;
pub mod ids;
pub mod registry;

pub use error::{FixtureKind, RegistryError, RegistryResult};
pub use fixture::{GroupMember, GroupRole, TestGroup, TestIdentity};
pub use generator::IdentityGenerator;
pub use ids::{GroupId, IdentityId, ParseIdError};
pub use registry::FixtureRegistry;
