//! Provisioning configuration loaded from environment variables.
//!
//! Everything has a production default; unset or unparsable variables
//! fall back rather than failing, since a worker with defaults is
//! preferable to a worker that cannot start.

use std::env;
use std::time::Duration;

use crate::retry::{CreateRetryPolicy, VerifyBackoff};

/// Environment variable overriding the group-write attempt count.
pub const CREATE_ATTEMPTS_ENV_VAR: &str = "SEEDBED_CREATE_ATTEMPTS";

/// Environment variable overriding the group-write backoff step (ms).
pub const CREATE_BACKOFF_ENV_VAR: &str = "SEEDBED_CREATE_BACKOFF_MS";

/// Environment variable overriding the verification attempt count.
pub const VERIFY_ATTEMPTS_ENV_VAR: &str = "SEEDBED_VERIFY_ATTEMPTS";

/// Environment variable overriding the verification base delay (ms).
pub const VERIFY_BASE_ENV_VAR: &str = "SEEDBED_VERIFY_BASE_MS";

/// Environment variable overriding the verification delay ceiling (ms).
pub const VERIFY_MAX_ENV_VAR: &str = "SEEDBED_VERIFY_MAX_MS";

/// Tunables for the provisioning engine.
#[derive(Debug, Clone, Default)]
pub struct ProvisionConfig {
    pub create_retry: CreateRetryPolicy,
    pub verify_backoff: VerifyBackoff,
}

impl ProvisionConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            create_retry: CreateRetryPolicy {
                max_attempts: env_u32(CREATE_ATTEMPTS_ENV_VAR)
                    .filter(|&n| n > 0)
                    .unwrap_or(defaults.create_retry.max_attempts),
                step: env_u64(CREATE_BACKOFF_ENV_VAR)
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.create_retry.step),
            },
            verify_backoff: VerifyBackoff {
                max_attempts: env_u32(VERIFY_ATTEMPTS_ENV_VAR)
                    .filter(|&n| n > 0)
                    .unwrap_or(defaults.verify_backoff.max_attempts),
                base_delay: env_u64(VERIFY_BASE_ENV_VAR)
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.verify_backoff.base_delay),
                max_delay: env_u64(VERIFY_MAX_ENV_VAR)
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.verify_backoff.max_delay),
                jitter: defaults.verify_backoff.jitter,
            },
        }
    }
}

fn env_u32(name: &str) -> Option<u32> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}
