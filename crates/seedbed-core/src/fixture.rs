//! Fixture entity definitions.
//!
//! These are the pre-creation shapes held by the registry. They carry no
//! timestamps or store bookkeeping; durable record types live at the
//! storage boundary.

use serde::{Deserialize, Serialize};

use crate::ids::IdentityId;

/// Role a member holds inside a provisioned group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupRole {
    Admin,
    Member,
}

impl GroupRole {
    /// Store encoding of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
        }
    }
}

impl std::fmt::Display for GroupRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run-scoped test account.
///
/// Unique per run by email. Created once and never mutated afterwards;
/// re-applying the same attributes is the only permitted write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestIdentity {
    pub id: IdentityId,
    pub email: String,
    pub display_name: String,
    /// The account arrives via an external flow (e.g. an invitation
    /// signup) instead of batch provisioning; batch creation skips it.
    pub external: bool,
}

/// One declared group member with its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub identity: IdentityId,
    pub role: GroupRole,
}

/// A run-scoped organizational group.
///
/// The owner always ends up with an ADMIN membership. A given owner
/// belongs to at most one group within a run; the provisioning engine
/// enforces that with check-then-act, not a store constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestGroup {
    /// Pre-computed run-unique name.
    pub name: String,
    pub owner: IdentityId,
    pub members: Vec<GroupMember>,
}
