use std::future::Future;

use tracing::{debug, warn};

use crate::actor::Actor;
use crate::lookup::PermissionLookup;

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Forbidden,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GateError<E> {
    #[error("missing permission `{0}`")]
    Forbidden(&'static str),
    #[error("permission lookup failed: {0}")]
    Lookup(E),
}

/// Access check bound to a single required permission key.
#[derive(Debug, Clone, Copy)]
pub struct Gate {
    key: &'static str,
}

impl Gate {
    /// Panics if `key` is empty; gates are declared alongside routes, so this
    /// surfaces at startup.
    pub fn new(key: &'static str) -> Self {
        assert!(!key.is_empty(), "gate permission key must not be empty");
        Self { key }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Evaluate the gate for `actor`. An absent actor is forbidden.
    pub async fn check<L>(&self, lookup: &L, actor: Option<&Actor>) -> Result<Decision, L::Error>
    where
        L: PermissionLookup + ?Sized,
    {
        let Some(actor) = actor else {
            warn!(permission = self.key, "anonymous actor reached a gated action");
            return Ok(Decision::Forbidden);
        };

        if actor.has_permission(lookup, self.key).await? {
            debug!(permission = self.key, user_id = ?actor.user_id(), "gate passed");
            Ok(Decision::Allow)
        } else {
            warn!(permission = self.key, user_id = ?actor.user_id(), "permission denied");
            Ok(Decision::Forbidden)
        }
    }

    /// Run `handler` only when the gate allows `actor`.
    pub async fn guard<L, F, Fut, T>(
        &self,
        lookup: &L,
        actor: Option<&Actor>,
        handler: F,
    ) -> Result<T, GateError<L::Error>>
    where
        L: PermissionLookup + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.check(lookup, actor).await.map_err(GateError::Lookup)? {
            Decision::Allow => Ok(handler().await),
            Decision::Forbidden => Err(GateError::Forbidden(self.key)),
        }
    }
}
