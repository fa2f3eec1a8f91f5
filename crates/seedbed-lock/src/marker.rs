//! Marker-file mutual exclusion.
//!
//! A resource is held while a marker file exists at a well-known path in a
//! directory shared by every worker. Acquisition is a single atomic
//! exclusive create (`O_EXCL`); there is deliberately no exists-check
//! before the create. Release deletes the marker, and absence of the
//! marker is the only "free" signal.
//!
//! A marker abandoned by a crashed holder is not broken or expired here;
//! acquisition surfaces [`LockError::Timeout`] within the configured wait
//! ceiling and the operator decides what to do with the marker.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LockConfig;

/// Errors raised by the marker lock manager.
#[derive(Debug, Error)]
pub enum LockError {
    /// The resource stayed held for the whole wait ceiling. Evidence of
    /// contention or a crashed holder; never silently retried further.
    #[error("lock acquisition timed out for '{resource}' after {waited_ms}ms")]
    Timeout { resource: String, waited_ms: u64 },

    /// Unexpected filesystem error while touching a marker.
    #[error("lock I/O error for '{resource}' while {context}: {source}")]
    Io {
        resource: String,
        context: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;

/// Contents of a marker file.
///
/// Written for post-mortem diagnostics of crashed holders; nothing reads
/// it back programmatically. The file's existence carries the lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockMarker {
    pub resource: String,
    pub holder: String,
    pub created_at: DateTime<Utc>,
}

/// Advisory lock manager over a shared marker directory.
///
/// At most one marker exists per resource name at any instant, guaranteed
/// by the exclusive create on the shared medium.
#[derive(Debug, Clone)]
pub struct MarkerLockManager {
    config: LockConfig,
    holder: String,
}

impl MarkerLockManager {
    /// Create a manager over the given configuration. The holder token
    /// defaults to the process id.
    #[must_use]
    pub fn new(config: LockConfig) -> Self {
        Self {
            config,
            holder: format!("pid-{}", std::process::id()),
        }
    }

    /// Override the holder token written into markers, typically the
    /// session's run token plus the process id.
    #[must_use]
    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = holder.into();
        self
    }

    /// Path of the marker encoding ownership of `resource`.
    #[must_use]
    pub fn marker_path(&self, resource: &str) -> PathBuf {
        self.config
            .marker_dir
            .join(format!("{}.lock", sanitize(resource)))
    }

    /// Attempt to acquire `resource` without waiting.
    ///
    /// Returns `Ok(None)` when the marker already exists. Two workers
    /// racing here cannot both succeed: the create is a true exclusive
    /// create on the shared medium.
    pub fn try_acquire(&self, resource: &str) -> LockResult<Option<LockGuard>> {
        fs::create_dir_all(&self.config.marker_dir).map_err(|source| LockError::Io {
            resource: resource.to_string(),
            context: "creating marker directory",
            source,
        })?;

        let path = self.marker_path(resource);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let marker = LockMarker {
                    resource: resource.to_string(),
                    holder: self.holder.clone(),
                    created_at: Utc::now(),
                };
                // Body is best-effort diagnostics only.
                let body = serde_json::to_vec(&marker).unwrap_or_default();
                if let Err(err) = file.write_all(&body) {
                    warn!(resource, error = %err, "failed to write lock marker body");
                }
                debug!(resource, path = %path.display(), "lock acquired");
                Ok(Some(LockGuard {
                    manager: self.clone(),
                    resource: resource.to_string(),
                    released: false,
                }))
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(source) => Err(LockError::Io {
                resource: resource.to_string(),
                context: "creating lock marker",
                source,
            }),
        }
    }

    /// Acquire `resource`, polling until the configured wait ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] when the resource stays held for the
    /// whole `max_wait`.
    pub async fn acquire(&self, resource: &str) -> LockResult<LockGuard> {
        let start = Instant::now();
        loop {
            if let Some(guard) = self.try_acquire(resource)? {
                return Ok(guard);
            }
            let elapsed = start.elapsed();
            if elapsed >= self.config.max_wait {
                return Err(LockError::Timeout {
                    resource: resource.to_string(),
                    waited_ms: elapsed.as_millis() as u64,
                });
            }
            debug!(resource, "lock held elsewhere, polling");
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Release `resource` by deleting its marker.
    ///
    /// Returns `Ok(true)` when a marker was deleted and `Ok(false)` when
    /// it was already absent. A peer's double release or a
    /// timeout-then-retry must not crash the caller, so absence is not an
    /// error.
    pub fn release(&self, resource: &str) -> LockResult<bool> {
        match fs::remove_file(self.marker_path(resource)) {
            Ok(()) => {
                debug!(resource, "lock released");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(LockError::Io {
                resource: resource.to_string(),
                context: "deleting lock marker",
                source,
            }),
        }
    }

    /// Whether a marker currently exists for `resource`.
    #[must_use]
    pub fn is_held(&self, resource: &str) -> bool {
        self.marker_path(resource).exists()
    }
}

/// Replace path-hostile characters in a resource name.
fn sanitize(resource: &str) -> String {
    resource
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Guard for a held lock.
///
/// Dropping the guard releases the marker best-effort, so release runs on
/// every exit path including panics. Call [`LockGuard::release`] to
/// observe release errors on the happy path.
pub struct LockGuard {
    manager: MarkerLockManager,
    resource: String,
    released: bool,
}

impl LockGuard {
    /// The resource this guard holds.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Release explicitly, reporting any filesystem error.
    pub fn release(mut self) -> LockResult<()> {
        self.released = true;
        self.manager.release(&self.resource).map(|_| ())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.manager.release(&self.resource) {
            warn!(resource = %self.resource, error = %err, "failed to release lock marker on drop");
        }
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("resource", &self.resource)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
