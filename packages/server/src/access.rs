//! Database-backed answers to the authorization core's questions.

use std::collections::BTreeSet;

use async_trait::async_trait;
use authz::{Actor, ActorRole, PermissionLookup};
use sea_orm::sea_query::{OnConflict, Query as SeaQuery};
use sea_orm::*;

use crate::entity::{permission, role, role_has_permission, user};

/// [`PermissionLookup`] over the `role_has_permission` join table.
///
/// Every call is a single `SELECT ... LIMIT 1` existence query; the role's
/// permission list is never loaded.
pub struct DbPermissions<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DbPermissions<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PermissionLookup for DbPermissions<'_> {
    type Error = DbErr;

    async fn role_grants(&self, role_id: i32, key: &str) -> Result<bool, DbErr> {
        self.role_grants_any(role_id, &[key.to_owned()]).await
    }

    async fn role_grants_any(&self, role_id: i32, keys: &[String]) -> Result<bool, DbErr> {
        let hit = role_has_permission::Entity::find()
            .select_only()
            .column(role_has_permission::Column::PermissionId)
            .filter(role_has_permission::Column::RoleId.eq(role_id))
            .filter(
                role_has_permission::Column::PermissionId.in_subquery(
                    SeaQuery::select()
                        .column(permission::Column::Id)
                        .from(permission::Entity)
                        .and_where(permission::Column::Key.is_in(keys.iter().cloned()))
                        .to_owned(),
                ),
            )
            .into_tuple::<i32>()
            .one(self.db)
            .await?;

        Ok(hit.is_some())
    }
}

/// Reduce a stored role to what permission checks need.
pub fn actor_role(role: &role::Model) -> ActorRole {
    ActorRole {
        id: role.id,
        is_superadmin: role.is_superadmin,
    }
}

/// Load a user with its role and build the matching [`Actor`].
///
/// Returns `None` when the user no longer exists.
pub async fn load_actor(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<(user::Model, Option<role::Model>, Actor)>, DbErr> {
    let Some((user, role)) = user::Entity::find_by_id(user_id)
        .find_also_related(role::Entity)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let actor = Actor::new(user.id, role.as_ref().map(actor_role));
    Ok(Some((user, role, actor)))
}

/// What a permission sync changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub attached: Vec<i32>,
    pub detached: Vec<i32>,
}

/// Make the role's permission set exactly `target`.
///
/// Only the difference is written. Run it inside the transaction that
/// updates the role so readers never see a half-synced set.
pub async fn sync_role_permissions<C: ConnectionTrait>(
    conn: &C,
    role_id: i32,
    target: &BTreeSet<i32>,
) -> Result<SyncReport, DbErr> {
    let current: BTreeSet<i32> = role_has_permission::Entity::find()
        .select_only()
        .column(role_has_permission::Column::PermissionId)
        .filter(role_has_permission::Column::RoleId.eq(role_id))
        .into_tuple::<i32>()
        .all(conn)
        .await?
        .into_iter()
        .collect();

    let detached: Vec<i32> = current.difference(target).copied().collect();
    if !detached.is_empty() {
        role_has_permission::Entity::delete_many()
            .filter(role_has_permission::Column::RoleId.eq(role_id))
            .filter(role_has_permission::Column::PermissionId.is_in(detached.clone()))
            .exec(conn)
            .await?;
    }

    let attached: Vec<i32> = target.difference(&current).copied().collect();
    attach_role_permissions(conn, role_id, &attached).await?;

    Ok(SyncReport { attached, detached })
}

/// Attach permissions to a role, leaving rows that already exist untouched.
pub async fn attach_role_permissions<C: ConnectionTrait>(
    conn: &C,
    role_id: i32,
    permission_ids: &[i32],
) -> Result<(), DbErr> {
    if permission_ids.is_empty() {
        return Ok(());
    }

    let rows = permission_ids
        .iter()
        .map(|&permission_id| role_has_permission::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
            ..Default::default()
        });

    let result = role_has_permission::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                role_has_permission::Column::RoleId,
                role_has_permission::Column::PermissionId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}
