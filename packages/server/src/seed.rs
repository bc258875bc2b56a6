use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::info;

use crate::access::attach_role_permissions;
use crate::config::SeedConfig;
use crate::entity::{permission, role, user};
use crate::utils::hash;

/// Base permissions seeded on startup: `(key, name, group)`.
pub const BASE_PERMISSIONS: &[(&str, &str, &str)] = &[
    ("dashboard.view", "View dashboard", "General"),
    ("users.view", "View users", "Users"),
    ("users.create", "Create users", "Users"),
    ("users.update", "Edit users", "Users"),
    ("users.delete", "Delete users", "Users"),
    ("roles.view", "View roles", "Roles"),
    ("roles.create", "Create roles", "Roles"),
    ("roles.update", "Edit roles", "Roles"),
    ("roles.delete", "Delete roles", "Roles"),
    ("permissions.view", "View permissions", "Permissions"),
    ("permissions.create", "Create permissions", "Permissions"),
    ("permissions.update", "Edit permissions", "Permissions"),
    ("permissions.delete", "Delete permissions", "Permissions"),
];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error("failed to hash superadmin password: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Idempotent startup seed: base permissions, the superadmin role holding all
/// of them, and the superadmin account when a password is configured.
///
/// Existing rows are never overwritten and existing role grants are kept.
pub async fn run(db: &DatabaseConnection, config: &SeedConfig) -> Result<(), SeedError> {
    let permission_ids = seed_permissions(db).await?;
    let superadmin = seed_superadmin_role(db).await?;
    attach_role_permissions(db, superadmin.id, &permission_ids).await?;

    match &config.superadmin_password {
        Some(password) => seed_superadmin_user(db, config, password, &superadmin).await?,
        None => info!("No superadmin password configured; skipping superadmin account"),
    }

    Ok(())
}

/// Insert missing base permissions and return the ids of all of them.
async fn seed_permissions(db: &DatabaseConnection) -> Result<Vec<i32>, DbErr> {
    let now = Utc::now();
    let mut inserted = 0u32;

    for &(key, name, group) in BASE_PERMISSIONS {
        let model = permission::ActiveModel {
            name: Set(name.to_string()),
            key: Set(key.to_string()),
            group: Set(Some(group.to_string())),
            description: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = permission::Entity::insert(model)
            .on_conflict(
                OnConflict::column(permission::Column::Key)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => {}
            Ok(_) => inserted += 1,
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new permissions", inserted);
    }

    permission::Entity::find()
        .select_only()
        .column(permission::Column::Id)
        .filter(permission::Column::Key.is_in(BASE_PERMISSIONS.iter().map(|&(key, _, _)| key)))
        .into_tuple::<i32>()
        .all(db)
        .await
}

async fn seed_superadmin_role(db: &DatabaseConnection) -> Result<role::Model, DbErr> {
    if let Some(existing) = role::Entity::find()
        .filter(role::Column::Slug.eq(role::SUPERADMIN_SLUG))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let now = Utc::now();
    let model = role::ActiveModel {
        name: Set("Superadministrator".to_string()),
        slug: Set(role::SUPERADMIN_SLUG.to_string()),
        description: Set(Some("Full access to the whole system.".to_string())),
        is_superadmin: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(role_id = model.id, "Seeded superadmin role");
    Ok(model)
}

async fn seed_superadmin_user(
    db: &DatabaseConnection,
    config: &SeedConfig,
    password: &str,
    superadmin: &role::Model,
) -> Result<(), SeedError> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(config.superadmin_email.as_str()))
        .one(db)
        .await?;

    match existing {
        Some(account) if account.role_id.is_some() => {}
        Some(account) => {
            let mut active: user::ActiveModel = account.into();
            active.role_id = Set(Some(superadmin.id));
            active.updated_at = Set(Utc::now());
            active.update(db).await?;
            info!(email = %config.superadmin_email, "Assigned superadmin role to existing account");
        }
        None => {
            let now = Utc::now();
            user::ActiveModel {
                name: Set(config.superadmin_name.clone()),
                email: Set(config.superadmin_email.clone()),
                password_hash: Set(hash::hash_password(password).map_err(SeedError::Hash)?),
                role_id: Set(Some(superadmin.id)),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
            info!(email = %config.superadmin_email, "Seeded superadmin account");
        }
    }

    Ok(())
}
