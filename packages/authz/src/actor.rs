use std::collections::BTreeSet;

use crate::lookup::PermissionLookup;

/// The role an actor holds, reduced to what authorization needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorRole {
    pub id: i32,
    pub is_superadmin: bool,
}

/// A user as seen by permission checks.
///
/// `user_id` is `None` for a user that has not been persisted yet; such an
/// actor never satisfies a check, whatever role it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    user_id: Option<i32>,
    role: Option<ActorRole>,
}

impl Actor {
    /// A persisted user with an optional role.
    pub fn new(user_id: i32, role: Option<ActorRole>) -> Self {
        Self {
            user_id: Some(user_id),
            role,
        }
    }

    /// A user that does not exist in storage yet.
    pub fn unsaved(role: Option<ActorRole>) -> Self {
        Self {
            user_id: None,
            role,
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.user_id
    }

    pub fn role(&self) -> Option<&ActorRole> {
        self.role.as_ref()
    }

    pub fn exists(&self) -> bool {
        self.user_id.is_some()
    }

    /// True iff the actor has a role and that role carries the superadmin flag.
    pub fn is_super_admin(&self) -> bool {
        self.role.is_some_and(|role| role.is_superadmin)
    }

    /// Whether the actor satisfies the permission identified by `key`.
    ///
    /// Superadmins pass before any lookup is made. Actors without a role hold
    /// no permissions.
    pub async fn has_permission<L>(&self, lookup: &L, key: &str) -> Result<bool, L::Error>
    where
        L: PermissionLookup + ?Sized,
    {
        if !self.exists() {
            return Ok(false);
        }

        if self.is_super_admin() {
            return Ok(true);
        }

        let Some(role) = self.role else {
            return Ok(false);
        };

        lookup.role_grants(role.id, key).await
    }

    /// Whether the actor satisfies at least one of `keys`.
    ///
    /// An empty requirement fails closed for ordinary actors; superadmins are
    /// let through before the emptiness check.
    pub async fn has_any_permission<L, I, K>(&self, lookup: &L, keys: I) -> Result<bool, L::Error>
    where
        L: PermissionLookup + ?Sized,
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.as_ref().to_owned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        self.has_any_of(lookup, keys).await
    }

    async fn has_any_of<L>(&self, lookup: &L, keys: Vec<String>) -> Result<bool, L::Error>
    where
        L: PermissionLookup + ?Sized,
    {
        if !self.exists() {
            return Ok(false);
        }

        if self.is_super_admin() {
            return Ok(true);
        }

        let Some(role) = self.role else {
            return Ok(false);
        };

        if keys.is_empty() {
            return Ok(false);
        }

        lookup.role_grants_any(role.id, &keys).await
    }
}
