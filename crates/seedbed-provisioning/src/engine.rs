//! Provisioning engine.
//!
//! Turns registry definitions into durable store records. Identity
//! creation is a best-effort idempotent batch with no locking: upserts on
//! a unique key are commutative and idempotent regardless of
//! interleaving. Group creation is a lock-guarded check-then-act state
//! machine with two-path post-write verification:
//!
//! ```text
//! Locked ──► Precheck ──► Creating ──► Verify(storage) ──► Verify(consumer) ──► Done
//!               │ owner already has a membership                                  ▲
//!               └──────────────────────────────────────────────────────(skip)─────┘
//! ```
//!
//! The lock releases on every path out, success or error.

use std::sync::Arc;

use tracing::{debug, info, warn};

use seedbed_core::{FixtureRegistry, GroupId, TestGroup};
use seedbed_lock::MarkerLockManager;
use seedbed_store::{FixtureStore, GroupWrite, IdentityWrite};

use crate::config::ProvisionConfig;
use crate::error::{ProvisionError, ProvisionResult, VerifyPath};

/// How a `create_group` call terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    /// The group and its memberships were written and verified on both
    /// read paths.
    Created { group_id: GroupId },
    /// The owner already had a membership; creation was skipped.
    AlreadyProvisioned,
}

/// Outcome of the best-effort identity batch, keyed by registry key.
#[derive(Debug, Clone, Default)]
pub struct CreateIdentitiesReport {
    pub created: Vec<String>,
    pub skipped_external: Vec<String>,
    pub failed: Vec<String>,
}

/// The provisioning engine. Generic over the store so tests and local
/// runs swap the transport without touching coordination logic.
pub struct ProvisioningEngine<S> {
    store: Arc<S>,
    locks: MarkerLockManager,
    config: ProvisionConfig,
}

impl<S: FixtureStore> ProvisioningEngine<S> {
    pub fn new(store: Arc<S>, locks: MarkerLockManager, config: ProvisionConfig) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    /// The lock resource name serializing all group work for one owner.
    fn owner_lock_name(group: &TestGroup) -> String {
        format!("owner-{}", group.owner)
    }

    /// Idempotently upsert every non-external identity in the registry.
    ///
    /// Individual failures are logged and swallowed rather than aborting
    /// the batch: a test whose fixture is missing fails later with a
    /// specific assertion, which beats failing every sibling here. The
    /// report records what happened to each key.
    pub async fn create_identities(&self, registry: &FixtureRegistry) -> CreateIdentitiesReport {
        let mut report = CreateIdentitiesReport::default();
        for (key, identity) in registry.identities() {
            if identity.external {
                debug!(key, email = %identity.email, "identity arrives via an external flow, skipping");
                report.skipped_external.push(key.to_string());
                continue;
            }
            let write = IdentityWrite::from(identity);
            match self.store.upsert_identity(&write).await {
                Ok(_) => {
                    debug!(key, email = %identity.email, "identity upserted");
                    report.created.push(key.to_string());
                }
                Err(err) => {
                    warn!(key, email = %identity.email, error = %err, "identity creation failed, continuing batch");
                    report.failed.push(key.to_string());
                }
            }
        }
        info!(
            created = report.created.len(),
            skipped_external = report.skipped_external.len(),
            failed = report.failed.len(),
            "identity batch finished"
        );
        report
    }

    /// Create the group registered under `key`, exactly-once-effective
    /// across all workers contending on the same owner.
    pub async fn create_group(
        &self,
        registry: &FixtureRegistry,
        key: &str,
    ) -> ProvisionResult<GroupOutcome> {
        let group = registry.group(key)?;
        let lock_name = Self::owner_lock_name(group);

        let guard = self.locks.acquire(&lock_name).await?;
        let outcome = self.create_group_locked(group).await;
        // Unconditional release; the guard's drop also covers panics
        // inside the locked section.
        if let Err(err) = guard.release() {
            warn!(resource = %lock_name, error = %err, "lock release failed");
        }
        outcome
    }

    async fn create_group_locked(&self, group: &TestGroup) -> ProvisionResult<GroupOutcome> {
        // Precheck: an existing membership of the owner means a previous
        // call, ours or a peer's, already realized this group.
        let existing = self
            .store
            .find_membership_by_owner(group.owner)
            .await
            .map_err(|source| ProvisionError::Store {
                context: "owner membership precheck",
                source,
            })?;
        if let Some(membership) = existing {
            info!(
                group = %group.name,
                owner = %group.owner,
                group_id = %membership.group_id,
                "owner already has a membership, skipping creation"
            );
            return Ok(GroupOutcome::AlreadyProvisioned);
        }

        let group_id = self.write_group(group).await?;
        self.verify(group, VerifyPath::Storage).await?;
        self.verify(group, VerifyPath::Consumer).await?;

        info!(group = %group.name, owner = %group.owner, group_id = %group_id, "group provisioned and verified");
        Ok(GroupOutcome::Created { group_id })
    }

    /// The transactional write, with bounded linear retry on transient
    /// store errors.
    async fn write_group(&self, group: &TestGroup) -> ProvisionResult<GroupId> {
        let write = GroupWrite {
            name: group.name.clone(),
            owner: group.owner,
            members: group.members.iter().map(|m| (m.identity, m.role)).collect(),
        };

        let policy = &self.config.create_retry;
        let mut attempt = 1u32;
        loop {
            match self.store.create_group_with_members(&write).await {
                Ok(group_id) => return Ok(group_id),
                Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                    let delay = policy.delay_after(attempt);
                    debug!(
                        group = %group.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient store error, retrying group write"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(ProvisionError::GroupCreation {
                        group: group.name.clone(),
                        owner: group.owner,
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    /// Poll one read path until the owner's membership is visible.
    ///
    /// Read errors count as "not visible yet": replication lag and a
    /// flapping read replica look identical from here, and both resolve
    /// or exhaust the same bounded backoff.
    async fn verify(&self, group: &TestGroup, path: VerifyPath) -> ProvisionResult<()> {
        let backoff = &self.config.verify_backoff;
        for attempt in 0..backoff.max_attempts {
            let lookup = match path {
                VerifyPath::Storage => self.store.find_membership_by_owner(group.owner).await,
                VerifyPath::Consumer => self.store.find_membership_as_consumer(group.owner).await,
            };
            match lookup {
                Ok(Some(_)) => {
                    if attempt > 0 {
                        debug!(
                            group = %group.name,
                            path = %path,
                            attempts = attempt + 1,
                            "verification succeeded after retries"
                        );
                    }
                    return Ok(());
                }
                Ok(None) => {
                    debug!(group = %group.name, path = %path, attempt = attempt + 1, "membership not visible yet")
                }
                Err(err) => {
                    debug!(group = %group.name, path = %path, attempt = attempt + 1, error = %err, "verification read failed")
                }
            }
            if attempt + 1 < backoff.max_attempts {
                tokio::time::sleep(backoff.delay_for(attempt)).await;
            }
        }
        Err(ProvisionError::Verification {
            group: group.name.clone(),
            owner: group.owner,
            path,
            attempts: backoff.max_attempts,
        })
    }
}

impl<S> std::fmt::Debug for ProvisioningEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
