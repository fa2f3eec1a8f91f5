//! Run-scoped identifier generation.
//!
//! Every provisioning session derives its names and email addresses from a
//! single random run token. Derivations are pure functions of the token
//! plus their inputs, so repeated calls within a session return the same
//! value, while two sessions collide only with negligible probability.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Number of digest hex characters appended to generated names.
const SCOPE_DIGEST_LEN: usize = 10;

/// Default mail domain for generated addresses.
pub const DEFAULT_MAIL_DOMAIN: &str = "seedbed.test";

/// Collision-resistant name and email derivation for one test run.
#[derive(Debug, Clone)]
pub struct IdentityGenerator {
    run_token: String,
    mail_domain: String,
}

impl IdentityGenerator {
    /// Create a generator with a fresh random run token.
    #[must_use]
    pub fn new() -> Self {
        Self::with_token(Uuid::new_v4().simple().to_string())
    }

    /// Create a generator with an explicit run token, for reproducing a
    /// previous run's names.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            run_token: token.into(),
            mail_domain: DEFAULT_MAIL_DOMAIN.to_string(),
        }
    }

    /// Override the mail domain used for generated addresses.
    #[must_use]
    pub fn with_mail_domain(mut self, domain: impl Into<String>) -> Self {
        self.mail_domain = domain.into();
        self
    }

    /// The run token every derivation is scoped to.
    #[must_use]
    pub fn run_token(&self) -> &str {
        &self.run_token
    }

    /// Derive a run-scoped name from `namespace` and `base`.
    ///
    /// Pure function of (token, namespace, base): no I/O, no failure modes.
    #[must_use]
    pub fn scoped(&self, namespace: &str, base: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.run_token.as_bytes());
        hasher.update(b":");
        hasher.update(namespace.as_bytes());
        hasher.update(b":");
        hasher.update(base.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{base}-{}", &digest[..SCOPE_DIGEST_LEN])
    }

    /// Derive a run-scoped email address for an identity.
    #[must_use]
    pub fn email(&self, base: &str) -> String {
        format!("{}@{}", self.scoped("identity", base), self.mail_domain)
    }

    /// Derive a run-unique group name.
    #[must_use]
    pub fn group_name(&self, base: &str) -> String {
        self.scoped("group", base)
    }
}

impl Default for IdentityGenerator {
    fn default() -> Self {
        Self::new()
    }
}
