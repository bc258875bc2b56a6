use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::role;
use crate::models::permission::PermissionResponse;
use crate::models::shared::{Pagination, Validator, clean, coerce_bool};

/// Create or fully replace a role.
///
/// On update every field is replaced: an absent `description` clears it, an
/// absent `is_superadmin` means `false` and absent `permissions` detaches all.
/// Only `slug` falls back to the stored value.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct RoleRequest {
    /// Display name (required, max 255 chars).
    #[schema(example = "Content Editor")]
    #[serde(default)]
    pub name: Option<String>,
    /// Unique slug (max 255 chars). Derived from `name` on create when blank.
    #[schema(example = "content-editor")]
    #[serde(default)]
    pub slug: Option<String>,
    /// Optional description (max 500 chars).
    #[serde(default)]
    pub description: Option<String>,
    /// Total permission bypass. Accepts `true`/`false`, `1`/`0`, `"1"`/`"0"`,
    /// `"true"`/`"false"`.
    #[schema(value_type = Option<bool>, example = false)]
    #[serde(default)]
    pub is_superadmin: Option<Value>,
    /// IDs of the permissions the role should hold afterwards.
    #[schema(example = json!([1, 2]))]
    #[serde(default)]
    pub permissions: Option<Vec<i32>>,
}

/// [`RoleRequest`] after trimming, coercion and field validation.
#[derive(Debug)]
pub struct RoleInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_superadmin: bool,
    pub permissions: BTreeSet<i32>,
}

impl RoleRequest {
    /// Shape checks only; slug uniqueness and permission existence need the
    /// database.
    pub fn validate(self, v: &mut Validator) -> Option<RoleInput> {
        let name = clean(self.name);
        let slug = clean(self.slug);
        let description = clean(self.description);

        v.required("name", name.as_deref(), 255);
        v.optional("slug", slug.as_deref(), 255);
        v.optional("description", description.as_deref(), 500);

        let is_superadmin = match self.is_superadmin {
            None => Some(false),
            Some(raw) => coerce_bool(&raw),
        };
        if is_superadmin.is_none() {
            v.fail("is_superadmin", "The is_superadmin field must be true or false.");
        }

        Some(RoleInput {
            name: name?,
            slug,
            description,
            is_superadmin: is_superadmin?,
            permissions: self.permissions.unwrap_or_default().into_iter().collect(),
        })
    }
}

/// Compact role reference embedded in user payloads.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RoleSummary {
    #[schema(example = 2)]
    pub id: i32,
    #[schema(example = "Content Editor")]
    pub name: String,
    #[schema(example = "content-editor")]
    pub slug: String,
    #[schema(example = false)]
    pub is_superadmin: bool,
}

impl From<role::Model> for RoleSummary {
    fn from(m: role::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            is_superadmin: m.is_superadmin,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RoleResponse {
    #[schema(example = 2)]
    pub id: i32,
    #[schema(example = "Content Editor")]
    pub name: String,
    #[schema(example = "content-editor")]
    pub slug: String,
    pub description: Option<String>,
    #[schema(example = false)]
    pub is_superadmin: bool,
    pub permissions: Vec<PermissionResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleResponse {
    pub fn new(m: role::Model, permissions: Vec<PermissionResponse>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            description: m.description,
            is_superadmin: m.is_superadmin,
            permissions,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A page of roles plus every permission, for assignment screens.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RoleListResponse {
    pub data: Vec<RoleResponse>,
    pub pagination: Pagination,
    pub permissions: Vec<PermissionResponse>,
}
