use async_trait::async_trait;

/// Existence queries against the persisted role/permission relation.
///
/// Implementations answer a single yes/no question per call and must not
/// materialize the full permission set of a role to do so.
#[async_trait]
pub trait PermissionLookup: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the role has the permission identified by `key` attached.
    async fn role_grants(&self, role_id: i32, key: &str) -> Result<bool, Self::Error>;

    /// Whether the role has at least one of `keys` attached.
    ///
    /// `keys` is non-empty and free of duplicates.
    async fn role_grants_any(&self, role_id: i32, keys: &[String]) -> Result<bool, Self::Error>;
}
