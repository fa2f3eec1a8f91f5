//! Lock manager configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default hard ceiling on a single lock acquisition.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(30);

/// Default sleep between acquisition attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Environment variable overriding the marker directory.
pub const MARKER_DIR_ENV_VAR: &str = "SEEDBED_LOCK_DIR";

/// Environment variable overriding the acquisition ceiling (seconds).
pub const MAX_WAIT_ENV_VAR: &str = "SEEDBED_LOCK_MAX_WAIT_SECS";

/// Environment variable overriding the poll interval (milliseconds).
pub const POLL_INTERVAL_ENV_VAR: &str = "SEEDBED_LOCK_POLL_MS";

/// Configuration for the marker lock manager.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Directory holding marker files. Must be reachable by every worker
    /// cooperating on the same resources.
    pub marker_dir: PathBuf,

    /// Hard wall-clock ceiling on a single acquisition. Exceeding it is
    /// treated as contention or a crashed holder, never retried further.
    pub max_wait: Duration,

    /// Sleep between acquisition attempts while the resource is held.
    pub poll_interval: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            marker_dir: env::temp_dir().join("seedbed-locks"),
            max_wait: DEFAULT_MAX_WAIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl LockConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            marker_dir: env::var(MARKER_DIR_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.marker_dir),
            max_wait: env_u64(MAX_WAIT_ENV_VAR)
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_wait),
            poll_interval: env_u64(POLL_INTERVAL_ENV_VAR)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}
