//! In-memory fixture definition table.
//!
//! Definitions are pure bookkeeping: nothing here touches the store or the
//! filesystem. Referential consistency is validated eagerly when a group
//! is defined, so a dangling owner or member key fails before any
//! provisioning starts.

use std::collections::HashMap;

use crate::error::{FixtureKind, RegistryError, RegistryResult};
use crate::fixture::{GroupMember, GroupRole, TestGroup, TestIdentity};
use crate::generator::IdentityGenerator;
use crate::ids::IdentityId;

/// Pre-creation definition table mapping logical keys to fixture entities.
#[derive(Debug)]
pub struct FixtureRegistry {
    generator: IdentityGenerator,
    identities: HashMap<String, TestIdentity>,
    groups: HashMap<String, TestGroup>,
}

impl FixtureRegistry {
    /// Create an empty registry around the session's generator.
    #[must_use]
    pub fn new(generator: IdentityGenerator) -> Self {
        Self {
            generator,
            identities: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    /// The generator all definitions derive their names from.
    #[must_use]
    pub fn generator(&self) -> &IdentityGenerator {
        &self.generator
    }

    /// Define an identity under `key`, deriving id and email from the
    /// generator. The last write for a given key wins; callers are
    /// expected not to redefine a key.
    pub fn define_identity(&mut self, key: &str, base: &str, display_name: &str) -> &TestIdentity {
        self.insert_identity(key, base, display_name, false)
    }

    /// Define an identity that will arrive via an external flow. Batch
    /// creation skips it; group definitions may still reference it.
    pub fn define_external_identity(
        &mut self,
        key: &str,
        base: &str,
        display_name: &str,
    ) -> &TestIdentity {
        self.insert_identity(key, base, display_name, true)
    }

    fn insert_identity(
        &mut self,
        key: &str,
        base: &str,
        display_name: &str,
        external: bool,
    ) -> &TestIdentity {
        let identity = TestIdentity {
            id: IdentityId::new(),
            email: self.generator.email(base),
            display_name: display_name.to_string(),
            external,
        };
        self.identities.insert(key.to_string(), identity);
        &self.identities[key]
    }

    /// Define a group under `key` owned by `owner_key` with the declared
    /// members.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UndefinedReference`] if `owner_key` or any
    /// member key was not previously defined.
    pub fn define_group(
        &mut self,
        key: &str,
        base_name: &str,
        owner_key: &str,
        members: &[(&str, GroupRole)],
    ) -> RegistryResult<&TestGroup> {
        let owner = self.resolve_identity(key, owner_key)?;
        let mut resolved = Vec::with_capacity(members.len());
        for (member_key, role) in members {
            let identity = self.resolve_identity(key, member_key)?;
            resolved.push(GroupMember {
                identity,
                role: *role,
            });
        }
        let group = TestGroup {
            name: self.generator.group_name(base_name),
            owner,
            members: resolved,
        };
        self.groups.insert(key.to_string(), group);
        Ok(&self.groups[key])
    }

    fn resolve_identity(&self, group_key: &str, identity_key: &str) -> RegistryResult<IdentityId> {
        self.identities
            .get(identity_key)
            .map(|identity| identity.id)
            .ok_or_else(|| RegistryError::UndefinedReference {
                group_key: group_key.to_string(),
                identity_key: identity_key.to_string(),
            })
    }

    /// Look up a defined identity.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if `key` was never defined.
    pub fn identity(&self, key: &str) -> RegistryResult<&TestIdentity> {
        self.identities.get(key).ok_or_else(|| RegistryError::NotFound {
            kind: FixtureKind::Identity,
            key: key.to_string(),
        })
    }

    /// Look up a defined group.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if `key` was never defined.
    pub fn group(&self, key: &str) -> RegistryResult<&TestGroup> {
        self.groups.get(key).ok_or_else(|| RegistryError::NotFound {
            kind: FixtureKind::Group,
            key: key.to_string(),
        })
    }

    /// Iterate every defined identity with its key.
    pub fn identities(&self) -> impl Iterator<Item = (&str, &TestIdentity)> {
        self.identities.iter().map(|(key, id)| (key.as_str(), id))
    }

    /// Iterate every defined group with its key.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &TestGroup)> {
        self.groups.iter().map(|(key, group)| (key.as_str(), group))
    }
}
