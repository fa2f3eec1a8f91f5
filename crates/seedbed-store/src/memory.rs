//! In-memory fixture store for tests and local development.
//!
//! Mirrors the Postgres contract: upserts are idempotent by email, the
//! group write is one critical section, and the two read paths resolve
//! through different indexes (the membership rows directly vs the
//! per-group index) like the database implementation routes different
//! queries.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use seedbed_core::{GroupId, GroupRole, IdentityId};

use crate::error::StoreResult;
use crate::records::{GroupRecord, IdentityRecord, MembershipRecord};
use crate::traits::{FixtureStore, GroupWrite, IdentityWrite};

#[derive(Debug, Default)]
struct MemoryState {
    identities_by_email: HashMap<String, IdentityRecord>,
    groups_by_name: HashMap<String, GroupRecord>,
    /// Flat membership rows; the direct read path scans these.
    memberships: Vec<MembershipRecord>,
    /// Per-group index; the consumer read path resolves through this.
    members_by_group: HashMap<Uuid, Vec<MembershipRecord>>,
}

impl MemoryState {
    fn upsert_membership(&mut self, group_id: Uuid, identity: IdentityId, role: GroupRole) {
        let identity_id = *identity.as_uuid();
        let exists = self
            .memberships
            .iter()
            .any(|m| m.group_id == group_id && m.identity_id == identity_id);
        if exists {
            return;
        }
        let record = MembershipRecord {
            group_id,
            identity_id,
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        };
        self.memberships.push(record.clone());
        self.members_by_group.entry(group_id).or_default().push(record);
    }
}

/// Store implementation over process-local maps.
#[derive(Debug, Default)]
pub struct MemoryFixtureStore {
    state: RwLock<MemoryState>,
}

impl MemoryFixtureStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identity rows currently stored.
    pub async fn identity_count(&self) -> usize {
        self.state.read().await.identities_by_email.len()
    }

    /// Whether an identity row exists for `email`.
    pub async fn has_identity(&self, email: &str) -> bool {
        self.state.read().await.identities_by_email.contains_key(email)
    }
}

#[async_trait]
impl FixtureStore for MemoryFixtureStore {
    async fn upsert_identity(&self, identity: &IdentityWrite) -> StoreResult<IdentityId> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.identities_by_email.get(&identity.email) {
            return Ok(IdentityId::from_uuid(existing.id));
        }
        let record = IdentityRecord {
            id: *identity.id.as_uuid(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            created_at: Utc::now(),
        };
        state
            .identities_by_email
            .insert(identity.email.clone(), record);
        Ok(identity.id)
    }

    async fn create_group_with_members(&self, group: &GroupWrite) -> StoreResult<GroupId> {
        let mut state = self.state.write().await;

        let group_id = match state.groups_by_name.get(&group.name) {
            Some(existing) => existing.id,
            None => {
                let record = GroupRecord {
                    id: Uuid::new_v4(),
                    name: group.name.clone(),
                    owner_id: *group.owner.as_uuid(),
                    created_at: Utc::now(),
                };
                let id = record.id;
                state.groups_by_name.insert(group.name.clone(), record);
                id
            }
        };

        state.upsert_membership(group_id, group.owner, GroupRole::Admin);
        for (member, role) in &group.members {
            if *member == group.owner {
                continue;
            }
            state.upsert_membership(group_id, *member, *role);
        }

        Ok(GroupId::from_uuid(group_id))
    }

    async fn find_membership_by_owner(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .find(|m| m.identity_id == *owner.as_uuid())
            .cloned())
    }

    async fn find_membership_as_consumer(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        let state = self.state.read().await;
        Ok(state
            .members_by_group
            .values()
            .flatten()
            .find(|m| m.identity_id == *owner.as_uuid())
            .cloned())
    }

    async fn group_members(&self, group: GroupId) -> StoreResult<Vec<MembershipRecord>> {
        let state = self.state.read().await;
        Ok(state
            .members_by_group
            .get(group.as_uuid())
            .cloned()
            .unwrap_or_default())
    }
}
