//! Filesystem-marker mutual exclusion.
//!
//! Cooperating test workers share no memory; the only coordination media
//! are a common store and one shared directory. This crate realizes a
//! bounded-wait advisory lock against that directory: a marker file's
//! existence encodes exclusive ownership of a named resource, acquisition
//! is an atomic exclusive create, and release is an idempotent delete.
//!
//! The atomicity of create-if-absent is the single correctness-critical
//! primitive the layers above depend on.
//!
//! # Example
//!
//! ```no_run
//! use seedbed_lock::{LockConfig, MarkerLockManager};
//!
//! # async fn example() -> Result<(), seedbed_lock::LockError> {
//! let locks = MarkerLockManager::new(LockConfig::default());
//! let guard = locks.acquire("owner-42").await?;
//! // ... exclusive section ...
//! guard.release()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod marker;

pub use config::LockConfig;
pub use marker::{LockError, LockGuard, LockMarker, LockResult, MarkerLockManager};
