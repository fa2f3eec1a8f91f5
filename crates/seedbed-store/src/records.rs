//! Durable record shapes for provisioned fixtures.
//!
//! Row-level types shared by every store implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A provisioned account row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// A provisioned group row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A membership row linking an identity to a group with a role.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub group_id: Uuid,
    pub identity_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}
