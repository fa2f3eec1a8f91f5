//! Storage-client boundary.
//!
//! Coordination logic never talks to the store directly; everything goes
//! through [`FixtureStore`] so the transport (connection pool, in-memory
//! map, command shim) stays swappable and the engine stays testable.

use async_trait::async_trait;

use seedbed_core::{GroupId, GroupRole, IdentityId, TestIdentity};

use crate::error::StoreResult;
use crate::records::MembershipRecord;

/// Input for the idempotent identity upsert.
#[derive(Debug, Clone)]
pub struct IdentityWrite {
    pub id: IdentityId,
    pub email: String,
    pub display_name: String,
}

impl From<&TestIdentity> for IdentityWrite {
    fn from(identity: &TestIdentity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
        }
    }
}

/// Everything needed to realize one group in a single transaction.
#[derive(Debug, Clone)]
pub struct GroupWrite {
    /// Pre-computed run-unique group name.
    pub name: String,
    /// Owner identity; always written with an ADMIN membership.
    pub owner: IdentityId,
    /// Declared members with their roles. An entry naming the owner is
    /// ignored in favor of the owner's ADMIN row.
    pub members: Vec<(IdentityId, GroupRole)>,
}

/// The store capabilities fixture provisioning requires: idempotent
/// upsert by unique key, one multi-row atomic transaction, and point
/// lookups over two independent read paths. Nothing else.
#[async_trait]
pub trait FixtureStore: Send + Sync {
    /// Idempotent upsert keyed by unique email. Re-applying the same
    /// attributes is a no-op; the stored id never changes once created.
    async fn upsert_identity(&self, identity: &IdentityWrite) -> StoreResult<IdentityId>;

    /// Atomically find-or-create the group row by name, then upsert the
    /// owner's ADMIN membership and every declared member row. Either the
    /// whole write lands or none of it does.
    async fn create_group_with_members(&self, group: &GroupWrite) -> StoreResult<GroupId>;

    /// Direct read path used by the writer for precheck and verification:
    /// the membership row (if any) naming `owner`.
    async fn find_membership_by_owner(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>>;

    /// Independently routed read path modeling what real consumers
    /// resolve, used to catch visibility or caching skew the direct path
    /// cannot see.
    async fn find_membership_as_consumer(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>>;

    /// All membership rows of a group.
    async fn group_members(&self, group: GroupId) -> StoreResult<Vec<MembershipRecord>>;
}
