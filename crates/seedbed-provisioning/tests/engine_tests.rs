//! Integration tests for the provisioning engine.
//!
//! Tests cover:
//! - End-to-end group creation with role-carrying memberships
//! - Idempotent short-circuit on repeat creation
//! - Mutual exclusion of contenders on one owner
//! - Isolation of disjoint owners
//! - Two-path verification under consumer-route skew
//! - Bounded retries for transient write failures
//! - The best-effort identity batch policy

mod helpers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use seedbed_core::{GroupRole, RegistryError};
use seedbed_provisioning::{GroupOutcome, ProvisionError, ProvisioningSession, VerifyPath};
use seedbed_store::{FixtureStore, MemoryFixtureStore};
use tempfile::TempDir;

use helpers::stores::{FlakyConsumerStore, FlakyCreateStore, RejectEmailStore, TrackingStore};
use helpers::{fast_config, init_tracing, lock_config};

fn session<S: FixtureStore>(store: Arc<S>, dir: &TempDir) -> ProvisioningSession<S> {
    ProvisioningSession::new(store, lock_config(dir), fast_config())
}

/// Owner X plus members Y:MEMBER and Z:ADMIN come out as exactly three
/// membership rows with the declared roles.
#[tokio::test]
async fn test_end_to_end_group_with_roles() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryFixtureStore::new());
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("x", "owner", "Owner X");
    session.define_identity("y", "member", "Member Y");
    session.define_identity("z", "admin", "Admin Z");
    session
        .define_group(
            "team",
            "team",
            "x",
            &[("y", GroupRole::Member), ("z", GroupRole::Admin)],
        )
        .unwrap();

    let report = session.create_identities().await;
    assert_eq!(report.created.len(), 3);
    assert!(report.failed.is_empty());

    let outcome = session.create_group("team").await.unwrap();
    let GroupOutcome::Created { group_id } = outcome else {
        panic!("expected fresh creation, got {outcome:?}");
    };

    let members = store.group_members(group_id).await.unwrap();
    assert_eq!(members.len(), 3);

    let role_of = |key: &str| {
        let id = *session.identity(key).unwrap().id.as_uuid();
        members
            .iter()
            .find(|m| m.identity_id == id)
            .map(|m| m.role.clone())
            .unwrap_or_else(|| panic!("no membership for '{key}'"))
    };
    assert_eq!(role_of("x"), "ADMIN");
    assert_eq!(role_of("y"), "MEMBER");
    assert_eq!(role_of("z"), "ADMIN");
}

/// A second create for the same owner completes via the precheck
/// short-circuit and writes nothing new.
#[tokio::test]
async fn test_second_create_short_circuits() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryFixtureStore::new());
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("x", "owner", "Owner X");
    session.define_group("team", "team", "x", &[]).unwrap();
    session.create_identities().await;

    let first = session.create_group("team").await.unwrap();
    let GroupOutcome::Created { group_id } = first else {
        panic!("expected fresh creation");
    };

    let second = session.create_group("team").await.unwrap();
    assert_eq!(second, GroupOutcome::AlreadyProvisioned);
    assert_eq!(store.group_members(group_id).await.unwrap().len(), 1);
}

/// N contenders on the same owner: exactly one creates, the rest
/// short-circuit, and at most one is ever inside the creating section.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_owner_creates_once() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(TrackingStore::new(Duration::from_millis(50)));
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("x", "owner", "Owner X");
    session.define_group("team", "team", "x", &[]).unwrap();
    session.create_identities().await;
    let session = Arc::new(session);

    let mut tasks = Vec::new();
    for _ in 0..6 {
        let session = Arc::clone(&session);
        tasks.push(tokio::spawn(async move {
            session.create_group("team").await.unwrap()
        }));
    }

    let mut created = 0;
    let mut skipped = 0;
    for task in tasks {
        match task.await.unwrap() {
            GroupOutcome::Created { .. } => created += 1,
            GroupOutcome::AlreadyProvisioned => skipped += 1,
        }
    }

    assert_eq!(created, 1);
    assert_eq!(skipped, 5);
    assert_eq!(
        store
            .max_concurrent
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

/// Disjoint owners provision concurrently: total latency stays near one
/// group's latency, not the sum.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disjoint_owners_provision_concurrently() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let hold = Duration::from_millis(200);
    let store = Arc::new(TrackingStore::new(hold));
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("a", "owner-a", "Owner A");
    session.define_identity("b", "owner-b", "Owner B");
    session.define_group("team-a", "team-a", "a", &[]).unwrap();
    session.define_group("team-b", "team-b", "b", &[]).unwrap();
    session.create_identities().await;

    let start = Instant::now();
    let (a, b) = tokio::join!(session.create_group("team-a"), session.create_group("team-b"));
    let elapsed = start.elapsed();

    assert!(matches!(a.unwrap(), GroupOutcome::Created { .. }));
    assert!(matches!(b.unwrap(), GroupOutcome::Created { .. }));
    assert_eq!(
        store
            .max_concurrent
            .load(std::sync::atomic::Ordering::SeqCst),
        2,
        "disjoint owners must overlap in the creating section"
    );
    assert!(
        elapsed < hold * 2,
        "expected concurrent provisioning, took {elapsed:?}"
    );
}

/// The consumer read path lags for a few attempts, then the write becomes
/// visible: the call succeeds within the retry bound.
#[tokio::test]
async fn test_consumer_skew_retries_then_succeeds() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    // fast_config allows 4 verification attempts; fail the first 3.
    let store = Arc::new(FlakyConsumerStore::new(3));
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("x", "owner", "Owner X");
    session.define_group("team", "team", "x", &[]).unwrap();
    session.create_identities().await;

    let outcome = session.create_group("team").await.unwrap();
    assert!(matches!(outcome, GroupOutcome::Created { .. }));
}

/// The consumer read path never confirms the write: the call raises a
/// verification error naming the consumer path, never a false success,
/// and the lock is free afterwards.
#[tokio::test]
async fn test_consumer_never_visible_fails_verification() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FlakyConsumerStore::new(u32::MAX));
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("x", "owner", "Owner X");
    session.define_group("team", "team", "x", &[]).unwrap();
    session.create_identities().await;

    let err = session.create_group("team").await.unwrap_err();
    match err {
        ProvisionError::Verification { path, attempts, .. } => {
            assert_eq!(path, VerifyPath::Consumer);
            assert_eq!(attempts, 4);
        }
        other => panic!("expected verification failure, got {other}"),
    }

    // The lock was released on the error path: a retry acquires it
    // immediately and short-circuits on the storage-path membership.
    let retry = session.create_group("team").await.unwrap();
    assert_eq!(retry, GroupOutcome::AlreadyProvisioned);
}

/// Transient write failures are absorbed by the bounded retry loop.
#[tokio::test]
async fn test_transient_create_errors_are_retried() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    // fast_config allows 3 attempts; fail the first 2.
    let store = Arc::new(FlakyCreateStore::new(2));
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("x", "owner", "Owner X");
    session.define_group("team", "team", "x", &[]).unwrap();
    session.create_identities().await;

    let outcome = session.create_group("team").await.unwrap();
    assert!(matches!(outcome, GroupOutcome::Created { .. }));
}

/// Exhausting the write retries raises a terminal error naming the group
/// and owner.
#[tokio::test]
async fn test_create_retry_exhaustion_is_terminal() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FlakyCreateStore::new(u32::MAX));
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("x", "owner", "Owner X");
    session.define_group("team", "team", "x", &[]).unwrap();
    session.create_identities().await;

    let err = session.create_group("team").await.unwrap_err();
    match err {
        ProvisionError::GroupCreation {
            group, attempts, ..
        } => {
            assert!(group.starts_with("team-"));
            assert_eq!(attempts, 3);
        }
        other => panic!("expected creation failure, got {other}"),
    }
}

/// One identity failing to provision does not abort the batch; the
/// report names the casualty and the survivors are stored.
#[tokio::test]
async fn test_identity_failure_does_not_abort_batch() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RejectEmailStore::new("doomed"));
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("x", "owner", "Owner X");
    session.define_identity("y", "doomed", "Doomed Y");
    session.define_identity("z", "member", "Member Z");

    let report = session.create_identities().await;

    assert_eq!(report.failed, vec!["y".to_string()]);
    assert_eq!(report.created.len(), 2);
    assert_eq!(store.inner.identity_count().await, 2);
}

/// Identities flagged as arriving via an external flow are skipped by
/// batch creation.
#[tokio::test]
async fn test_external_identity_skipped() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryFixtureStore::new());
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("x", "owner", "Owner X");
    session.define_external_identity("invitee", "invitee", "Invited");

    let report = session.create_identities().await;

    assert_eq!(report.skipped_external, vec!["invitee".to_string()]);
    assert_eq!(store.identity_count().await, 1);
    let invitee_email = session.identity("invitee").unwrap().email.clone();
    assert!(!store.has_identity(&invitee_email).await);
}

/// A dangling owner reference fails at definition time, before anything
/// touches the store.
#[tokio::test]
async fn test_undefined_owner_fails_before_store() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryFixtureStore::new());
    let mut session = session(Arc::clone(&store), &dir);

    let err = session.define_group("team", "team", "ghost", &[]).unwrap_err();
    assert!(matches!(err, RegistryError::UndefinedReference { .. }));
    assert_eq!(store.identity_count().await, 0);
}

/// `create_groups` reports per-key results instead of aborting on the
/// first failure, and a failed group leaves no lock behind.
#[tokio::test]
async fn test_create_groups_isolates_failures() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FlakyConsumerStore::new(u32::MAX));
    let mut session = session(Arc::clone(&store), &dir);

    session.define_identity("a", "owner-a", "Owner A");
    session.define_group("team-a", "team-a", "a", &[]).unwrap();
    session.create_identities().await;

    let results = session.create_groups().await;
    assert_eq!(results.len(), 1);
    assert!(results[0].1.is_err());

    // The failure left no lock behind; a fresh attempt still proceeds.
    let retry = session.create_group("team-a").await.unwrap();
    assert_eq!(retry, GroupOutcome::AlreadyProvisioned);
}
