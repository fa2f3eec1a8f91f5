//! Store doubles with failure injection.
//!
//! Each double wraps the in-memory store and perturbs exactly one
//! capability, so a test exercises one failure mode at a time.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use seedbed_core::{GroupId, IdentityId};
use seedbed_store::{
    FixtureStore, GroupWrite, IdentityWrite, MembershipRecord, MemoryFixtureStore, StoreError,
    StoreResult,
};

/// Fails the consumer read path `failures` times before delegating,
/// modeling visibility skew on the route real consumers use.
pub struct FlakyConsumerStore {
    pub inner: MemoryFixtureStore,
    failures: AtomicU32,
}

impl FlakyConsumerStore {
    pub fn new(failures: u32) -> Self {
        Self {
            inner: MemoryFixtureStore::new(),
            failures: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl FixtureStore for FlakyConsumerStore {
    async fn upsert_identity(&self, identity: &IdentityWrite) -> StoreResult<IdentityId> {
        self.inner.upsert_identity(identity).await
    }

    async fn create_group_with_members(&self, group: &GroupWrite) -> StoreResult<GroupId> {
        self.inner.create_group_with_members(group).await
    }

    async fn find_membership_by_owner(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        self.inner.find_membership_by_owner(owner).await
    }

    async fn find_membership_as_consumer(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Ok(None);
        }
        self.inner.find_membership_as_consumer(owner).await
    }

    async fn group_members(&self, group: GroupId) -> StoreResult<Vec<MembershipRecord>> {
        self.inner.group_members(group).await
    }
}

/// Rejects upserts whose email starts with a given prefix with a
/// permanent error. Generated emails start with their base name, so a
/// test picks a doomed base and rejects it here.
pub struct RejectEmailStore {
    pub inner: MemoryFixtureStore,
    reject_prefix: String,
}

impl RejectEmailStore {
    pub fn new(reject_prefix: impl Into<String>) -> Self {
        Self {
            inner: MemoryFixtureStore::new(),
            reject_prefix: reject_prefix.into(),
        }
    }
}

#[async_trait]
impl FixtureStore for RejectEmailStore {
    async fn upsert_identity(&self, identity: &IdentityWrite) -> StoreResult<IdentityId> {
        if identity.email.starts_with(&self.reject_prefix) {
            return Err(StoreError::query("simulated permanent rejection"));
        }
        self.inner.upsert_identity(identity).await
    }

    async fn create_group_with_members(&self, group: &GroupWrite) -> StoreResult<GroupId> {
        self.inner.create_group_with_members(group).await
    }

    async fn find_membership_by_owner(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        self.inner.find_membership_by_owner(owner).await
    }

    async fn find_membership_as_consumer(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        self.inner.find_membership_as_consumer(owner).await
    }

    async fn group_members(&self, group: GroupId) -> StoreResult<Vec<MembershipRecord>> {
        self.inner.group_members(group).await
    }
}

/// Fails the group write with a transient error `failures` times.
pub struct FlakyCreateStore {
    pub inner: MemoryFixtureStore,
    failures: AtomicU32,
}

impl FlakyCreateStore {
    pub fn new(failures: u32) -> Self {
        Self {
            inner: MemoryFixtureStore::new(),
            failures: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl FixtureStore for FlakyCreateStore {
    async fn upsert_identity(&self, identity: &IdentityWrite) -> StoreResult<IdentityId> {
        self.inner.upsert_identity(identity).await
    }

    async fn create_group_with_members(&self, group: &GroupWrite) -> StoreResult<GroupId> {
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(StoreError::unavailable("simulated outage"));
        }
        self.inner.create_group_with_members(group).await
    }

    async fn find_membership_by_owner(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        self.inner.find_membership_by_owner(owner).await
    }

    async fn find_membership_as_consumer(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        self.inner.find_membership_as_consumer(owner).await
    }

    async fn group_members(&self, group: GroupId) -> StoreResult<Vec<MembershipRecord>> {
        self.inner.group_members(group).await
    }
}

/// Tracks how many group writes run concurrently, holding each write
/// open for a fixed duration so overlap would be observable.
pub struct TrackingStore {
    pub inner: MemoryFixtureStore,
    in_create: AtomicU32,
    pub max_concurrent: AtomicU32,
    hold: Duration,
}

impl TrackingStore {
    pub fn new(hold: Duration) -> Self {
        Self {
            inner: MemoryFixtureStore::new(),
            in_create: AtomicU32::new(0),
            max_concurrent: AtomicU32::new(0),
            hold,
        }
    }
}

#[async_trait]
impl FixtureStore for TrackingStore {
    async fn upsert_identity(&self, identity: &IdentityWrite) -> StoreResult<IdentityId> {
        self.inner.upsert_identity(identity).await
    }

    async fn create_group_with_members(&self, group: &GroupWrite) -> StoreResult<GroupId> {
        let now = self.in_create.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        let result = self.inner.create_group_with_members(group).await;
        self.in_create.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn find_membership_by_owner(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        self.inner.find_membership_by_owner(owner).await
    }

    async fn find_membership_as_consumer(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        self.inner.find_membership_as_consumer(owner).await
    }

    async fn group_members(&self, group: GroupId) -> StoreResult<Vec<MembershipRecord>> {
        self.inner.group_members(group).await
    }
}
