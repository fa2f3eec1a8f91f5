//! # Storage boundary
//!
//! The fixture layer needs exactly four store capabilities: idempotent
//! upsert by unique key, one multi-row atomic transaction, a point lookup
//! over the writer's read path, and a second lookup over the route real
//! consumers use. [`FixtureStore`] captures that contract; the
//! provisioning engine is generic over it.
//!
//! Implementations:
//!
//! - [`PgFixtureStore`]: the shared Postgres database workers coordinate
//!   through.
//! - [`MemoryFixtureStore`]: process-local maps for tests and local
//!   development.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryFixtureStore;
pub use postgres::PgFixtureStore;
pub use records::{GroupRecord, IdentityRecord, MembershipRecord};
pub use traits::{FixtureStore, GroupWrite, IdentityWrite};
