//! Navigation menu filtering.
//!
//! The menu is declared once in configuration as ordered sections of ordered
//! items. On every render the tree is pruned down to what the current actor may
//! see; sections that end up empty are dropped.

use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::lookup::PermissionLookup;

/// What a navigation item requires from the viewer.
///
/// Serialized as the item's optional `permission` key: absent or `null` means
/// any authenticated actor may see it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Access {
    #[default]
    Authenticated,
    Permission(String),
}

impl From<Option<String>> for Access {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(key) => Access::Permission(key),
            None => Access::Authenticated,
        }
    }
}

impl From<Access> for Option<String> {
    fn from(access: Access) -> Self {
        match access {
            Access::Authenticated => None,
            Access::Permission(key) => Some(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NavItem {
    #[schema(example = "Users")]
    pub label: String,
    #[schema(example = "/admin/users")]
    pub href: String,
    #[serde(default)]
    #[schema(example = "pi pi-users")]
    pub icon: Option<String>,
    /// Permission key required to see the item; `null` for any signed-in user.
    #[serde(default, rename = "permission")]
    #[schema(value_type = Option<String>, example = "users.view")]
    pub access: Access,
}

impl NavItem {
    pub fn new(label: &str, href: &str, icon: &str, access: Access) -> Self {
        Self {
            label: label.to_string(),
            href: href.to_string(),
            icon: Some(icon.to_string()),
            access,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NavSection {
    #[schema(example = "Administration")]
    pub label: String,
    #[serde(default)]
    pub items: Vec<NavItem>,
}

/// Prune `tree` to the items `actor` may see, preserving declared order.
///
/// Every keyed item is checked through [`Actor::has_permission`]; nothing is
/// preloaded, so the result always reflects the current grants.
pub async fn build<L>(
    tree: &[NavSection],
    actor: Option<&Actor>,
    lookup: &L,
) -> Result<Vec<NavSection>, L::Error>
where
    L: PermissionLookup + ?Sized,
{
    let Some(actor) = actor else {
        return Ok(Vec::new());
    };

    let mut visible = Vec::with_capacity(tree.len());
    for section in tree {
        let mut items = Vec::new();
        for item in &section.items {
            let allowed = match &item.access {
                Access::Authenticated => true,
                Access::Permission(key) => actor.has_permission(lookup, key).await?,
            };
            if allowed {
                items.push(item.clone());
            }
        }

        if !items.is_empty() {
            visible.push(NavSection {
                label: section.label.clone(),
                items,
            });
        }
    }

    Ok(visible)
}
