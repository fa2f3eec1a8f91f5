//! Postgres-backed fixture store.
//!
//! Runtime queries over a shared pool. Identity upsert relies on the
//! unique email index; the group write runs inside one transaction so a
//! worker crashing mid-write leaves no partial group behind.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use seedbed_core::{GroupId, GroupRole, IdentityId};

use crate::error::StoreResult;
use crate::records::MembershipRecord;
use crate::traits::{FixtureStore, GroupWrite, IdentityWrite};

/// Store implementation over a shared Postgres database.
#[derive(Debug, Clone)]
pub struct PgFixtureStore {
    pool: PgPool,
}

impl PgFixtureStore {
    /// Wrap an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the fixture tables if they do not exist yet. Safe to call
    /// from every worker; the DDL is idempotent.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS fixture_identities (
                id UUID PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS fixture_groups (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                owner_id UUID NOT NULL REFERENCES fixture_identities(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS fixture_group_members (
                group_id UUID NOT NULL REFERENCES fixture_groups(id),
                identity_id UUID NOT NULL REFERENCES fixture_identities(id),
                role TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (group_id, identity_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

async fn upsert_membership(
    conn: &mut PgConnection,
    group_id: Uuid,
    identity: IdentityId,
    role: GroupRole,
) -> StoreResult<()> {
    sqlx::query(
        r"
        INSERT INTO fixture_group_members (group_id, identity_id, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (group_id, identity_id) DO NOTHING
        ",
    )
    .bind(group_id)
    .bind(*identity.as_uuid())
    .bind(role.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl FixtureStore for PgFixtureStore {
    async fn upsert_identity(&self, identity: &IdentityWrite) -> StoreResult<IdentityId> {
        let row: (Uuid,) = sqlx::query_as(
            r"
            INSERT INTO fixture_identities (id, email, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET display_name = EXCLUDED.display_name
            RETURNING id
            ",
        )
        .bind(*identity.id.as_uuid())
        .bind(&identity.email)
        .bind(&identity.display_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(IdentityId::from_uuid(row.0))
    }

    async fn create_group_with_members(&self, group: &GroupWrite) -> StoreResult<GroupId> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM fixture_groups WHERE name = $1")
                .bind(&group.name)
                .fetch_optional(&mut *tx)
                .await?;

        let group_id = match existing {
            Some((id,)) => {
                debug!(group = %group.name, group_id = %id, "group row already present");
                id
            }
            None => {
                let row: (Uuid,) = sqlx::query_as(
                    r"
                    INSERT INTO fixture_groups (id, name, owner_id)
                    VALUES ($1, $2, $3)
                    RETURNING id
                    ",
                )
                .bind(Uuid::new_v4())
                .bind(&group.name)
                .bind(*group.owner.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
                row.0
            }
        };

        upsert_membership(&mut tx, group_id, group.owner, GroupRole::Admin).await?;
        for (member, role) in &group.members {
            if *member == group.owner {
                continue;
            }
            upsert_membership(&mut tx, group_id, *member, *role).await?;
        }

        tx.commit().await?;
        Ok(GroupId::from_uuid(group_id))
    }

    async fn find_membership_by_owner(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        let record = sqlx::query_as(
            r"
            SELECT group_id, identity_id, role, created_at
            FROM fixture_group_members
            WHERE identity_id = $1
            ",
        )
        .bind(*owner.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_membership_as_consumer(
        &self,
        owner: IdentityId,
    ) -> StoreResult<Option<MembershipRecord>> {
        // Resolves through the group relation the way consumer queries do,
        // rather than scanning membership rows directly.
        let record = sqlx::query_as(
            r"
            SELECT gm.group_id, gm.identity_id, gm.role, gm.created_at
            FROM fixture_groups g
            JOIN fixture_group_members gm ON gm.group_id = g.id
            WHERE gm.identity_id = $1
            ",
        )
        .bind(*owner.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn group_members(&self, group: GroupId) -> StoreResult<Vec<MembershipRecord>> {
        let records = sqlx::query_as(
            r"
            SELECT group_id, identity_id, role, created_at
            FROM fixture_group_members
            WHERE group_id = $1
            ORDER BY created_at
            ",
        )
        .bind(*group.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
