//! Per-session provisioning facade.
//!
//! One [`ProvisioningSession`] owns the run token, the registry, the lock
//! manager handle, and the engine. Nothing is ambient process state, so
//! sessions compose and test in isolation, and two sessions in one
//! process never share fixtures.
//!
//! This is the consumer-facing boundary: UI-driving test code defines
//! entities, triggers batch creation, and looks entities up by key. It
//! never touches storage or locks directly.

use std::sync::Arc;

use tracing::warn;

use seedbed_core::{
    FixtureRegistry, GroupRole, IdentityGenerator, RegistryResult, TestGroup, TestIdentity,
};
use seedbed_lock::{LockConfig, MarkerLockManager};
use seedbed_store::FixtureStore;

use crate::config::ProvisionConfig;
use crate::engine::{CreateIdentitiesReport, GroupOutcome, ProvisioningEngine};
use crate::error::ProvisionResult;

/// A provisioning session scoped to one test run.
pub struct ProvisioningSession<S> {
    registry: FixtureRegistry,
    engine: ProvisioningEngine<S>,
}

impl<S: FixtureStore> ProvisioningSession<S> {
    /// Create a session with a fresh run token.
    pub fn new(store: Arc<S>, lock_config: LockConfig, config: ProvisionConfig) -> Self {
        let generator = IdentityGenerator::new();
        let locks = MarkerLockManager::new(lock_config).with_holder(format!(
            "{}:{}",
            generator.run_token(),
            std::process::id()
        ));
        Self {
            registry: FixtureRegistry::new(generator),
            engine: ProvisioningEngine::new(store, locks, config),
        }
    }

    /// Create a session configured from `SEEDBED_*` environment
    /// variables.
    pub fn from_env(store: Arc<S>) -> Self {
        Self::new(store, LockConfig::from_env(), ProvisionConfig::from_env())
    }

    // ── Definition-time API (pure, no store interaction) ──────────────

    /// Define an identity under `key`.
    pub fn define_identity(&mut self, key: &str, base: &str, display_name: &str) -> &TestIdentity {
        self.registry.define_identity(key, base, display_name)
    }

    /// Define an identity that arrives via an external flow; batch
    /// creation skips it.
    pub fn define_external_identity(
        &mut self,
        key: &str,
        base: &str,
        display_name: &str,
    ) -> &TestIdentity {
        self.registry.define_external_identity(key, base, display_name)
    }

    /// Define a group under `key`, validating owner and member
    /// references eagerly.
    pub fn define_group(
        &mut self,
        key: &str,
        base_name: &str,
        owner_key: &str,
        members: &[(&str, GroupRole)],
    ) -> RegistryResult<&TestGroup> {
        self.registry.define_group(key, base_name, owner_key, members)
    }

    // ── Creation API ──────────────────────────────────────────────────

    /// Best-effort batch creation of every defined, non-external
    /// identity.
    pub async fn create_identities(&self) -> CreateIdentitiesReport {
        self.engine.create_identities(&self.registry).await
    }

    /// Create one group by key.
    pub async fn create_group(&self, key: &str) -> ProvisionResult<GroupOutcome> {
        self.engine.create_group(&self.registry, key).await
    }

    /// Create every defined group. A failing group does not abort its
    /// siblings; each key's result is reported separately.
    pub async fn create_groups(&self) -> Vec<(String, ProvisionResult<GroupOutcome>)> {
        let mut results = Vec::new();
        for (key, _) in self.registry.groups() {
            let result = self.engine.create_group(&self.registry, key).await;
            if let Err(err) = &result {
                warn!(key, error = %err, "group provisioning failed");
            }
            results.push((key.to_string(), result));
        }
        results
    }

    // ── Lookup API ────────────────────────────────────────────────────

    /// Look up a defined identity by key.
    pub fn identity(&self, key: &str) -> RegistryResult<&TestIdentity> {
        self.registry.identity(key)
    }

    /// Look up a defined group by key.
    pub fn group(&self, key: &str) -> RegistryResult<&TestGroup> {
        self.registry.group(key)
    }

    /// The underlying registry, for read-only inspection.
    pub fn registry(&self) -> &FixtureRegistry {
        &self.registry
    }
}

impl<S> std::fmt::Debug for ProvisioningSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningSession")
            .field("run_token", &self.registry.generator().run_token())
            .finish_non_exhaustive()
    }
}
