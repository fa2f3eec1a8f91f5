//! Shared test scaffolding for engine integration tests.

pub mod stores;

use std::time::Duration;

use seedbed_lock::LockConfig;
use seedbed_provisioning::{CreateRetryPolicy, ProvisionConfig, VerifyBackoff};
use tempfile::TempDir;

/// Install a subscriber once so failing tests show engine logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("seedbed=debug")
        .with_test_writer()
        .try_init();
}

/// Millisecond-scale retry policy so tests run fast.
pub fn fast_config() -> ProvisionConfig {
    ProvisionConfig {
        create_retry: CreateRetryPolicy {
            max_attempts: 3,
            step: Duration::from_millis(10),
        },
        verify_backoff: VerifyBackoff {
            max_attempts: 4,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            jitter: 0.25,
        },
    }
}

/// Lock configuration rooted in a per-test temp directory.
pub fn lock_config(dir: &TempDir) -> LockConfig {
    LockConfig {
        marker_dir: dir.path().to_path_buf(),
        max_wait: Duration::from_secs(5),
        poll_interval: Duration::from_millis(5),
    }
}
