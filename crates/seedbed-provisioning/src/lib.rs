//! # Provisioning Engine
//!
//! Fixture provisioning and coordination for parallel test workers
//! sharing one external store and one coordination directory.
//!
//! This crate provides:
//! - Best-effort, idempotent batch creation of test identities
//! - Lock-guarded, exactly-once-effective group creation
//! - Two-path post-write verification (storage route and consumer route)
//! - Bounded retries: linear backoff for writes, exponential backoff
//!   with jitter for verification
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐      ┌───────────────────┐      ┌─────────────────┐
//! │ FixtureRegistry  │─────►│ ProvisioningEngine│─────►│  FixtureStore   │
//! │ (definitions)    │      │ (state machine)   │      │ (shared store)  │
//! └──────────────────┘      └─────────┬─────────┘      └─────────────────┘
//!                                     │
//!                           ┌─────────▼─────────┐
//!                           │ MarkerLockManager │
//!                           │ (shared dir)      │
//!                           └───────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use seedbed_core::GroupRole;
//! use seedbed_lock::LockConfig;
//! use seedbed_provisioning::{ProvisionConfig, ProvisioningSession};
//! use seedbed_store::MemoryFixtureStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryFixtureStore::new());
//! let mut session =
//!     ProvisioningSession::new(store, LockConfig::default(), ProvisionConfig::default());
//!
//! session.define_identity("owner", "owner", "Owner");
//! session.define_identity("member", "member", "Member");
//! session.define_group("team", "team", "owner", &[("member", GroupRole::Member)])?;
//!
//! session.create_identities().await;
//! session.create_group("team").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod retry;
pub mod session;

pub use config::ProvisionConfig;
pub use engine::{CreateIdentitiesReport, GroupOutcome, ProvisioningEngine};
pub use error::{ProvisionError, ProvisionResult, VerifyPath};
pub use retry::{CreateRetryPolicy, VerifyBackoff};
pub use session::ProvisioningSession;
