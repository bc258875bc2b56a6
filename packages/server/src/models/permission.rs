use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::permission;
use crate::models::shared::{Pagination, Validator, clean};

/// Create or replace a permission.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct PermissionRequest {
    /// Display name (required, max 255 chars).
    #[schema(example = "View users")]
    #[serde(default)]
    pub name: Option<String>,
    /// Unique dotted key used by permission checks (required, max 255 chars).
    #[schema(example = "users.view")]
    #[serde(default)]
    pub key: Option<String>,
    /// Free-text grouping label (max 255 chars).
    #[schema(example = "Users")]
    #[serde(default)]
    pub group: Option<String>,
    /// Optional description (max 500 chars).
    #[schema(example = "List and inspect user accounts")]
    #[serde(default)]
    pub description: Option<String>,
}

/// [`PermissionRequest`] after trimming and field validation.
#[derive(Debug)]
pub struct PermissionInput {
    pub name: String,
    pub key: String,
    pub group: Option<String>,
    pub description: Option<String>,
}

impl PermissionRequest {
    /// Shape checks only; uniqueness of `key` needs the database.
    pub fn validate(self, v: &mut Validator) -> Option<PermissionInput> {
        let name = clean(self.name);
        let key = clean(self.key);
        let group = clean(self.group);
        let description = clean(self.description);

        v.required("name", name.as_deref(), 255);
        v.required("key", key.as_deref(), 255);
        v.optional("group", group.as_deref(), 255);
        v.optional("description", description.as_deref(), 500);

        Some(PermissionInput {
            name: name?,
            key: key?,
            group,
            description,
        })
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PermissionResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "View users")]
    pub name: String,
    #[schema(example = "users.view")]
    pub key: String,
    #[schema(example = "Users")]
    pub group: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<permission::Model> for PermissionResponse {
    fn from(m: permission::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            key: m.key,
            group: m.group,
            description: m.description,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PermissionListResponse {
    pub data: Vec<PermissionResponse>,
    pub pagination: Pagination,
}
