use std::collections::{BTreeSet, HashMap};

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::access::{attach_role_permissions, sync_role_permissions};
use crate::entity::{permission, role, role_has_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::permission::PermissionResponse;
use crate::models::role::*;
use crate::models::shared::{ListQuery, Pagination, Validator};
use crate::state::AppState;
use crate::utils::slug::slugify;

const PER_PAGE: u64 = 10;

#[utoipa::path(
    get,
    path = "/",
    tag = "Roles",
    operation_id = "listRoles",
    summary = "List roles with their permissions",
    description = "Returns roles ordered by name, 10 per page by default, each with its permissions. Also returns every permission ordered by group and name. Requires `roles.view`.",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of roles", body = RoleListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state))]
pub async fn list_roles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RoleListResponse>, AppError> {
    let (page, per_page) = query.window(PER_PAGE);

    let select = role::Entity::find();
    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let roles = select
        .order_by_asc(role::Column::Name)
        .offset(Some(ListQuery::offset(page, per_page)))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let role_ids: Vec<i32> = roles.iter().map(|r| r.id).collect();
    let mut held = permissions_by_role(&state.db, &role_ids).await?;

    let data = roles
        .into_iter()
        .map(|r| {
            let permissions = held.remove(&r.id).unwrap_or_default();
            RoleResponse::new(r, permissions)
        })
        .collect();

    let permissions = permission::Entity::find()
        .order_by_asc(permission::Column::Group)
        .order_by_asc(permission::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(RoleListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
        permissions,
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Roles",
    operation_id = "createRole",
    summary = "Create a role",
    description = "Creates a role and attaches the given permissions. The slug defaults to the slugified name. Requires `roles.create`.",
    request_body = RoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload))]
pub async fn create_role(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (input, slug) = validated(&state.db, payload, None).await?;

    let txn = state.db.begin().await?;

    let now = chrono::Utc::now();
    let model = role::ActiveModel {
        name: Set(input.name),
        slug: Set(slug),
        description: Set(input.description),
        is_superadmin: Set(input.is_superadmin),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(slug_conflict)?;

    let ids: Vec<i32> = input.permissions.into_iter().collect();
    attach_role_permissions(&txn, model.id, &ids).await?;

    txn.commit().await?;

    tracing::info!(
        role_id = model.id,
        slug = %model.slug,
        is_superadmin = model.is_superadmin,
        permissions = ids.len(),
        "Role created"
    );

    let response = role_response(&state.db, model).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Roles",
    operation_id = "updateRole",
    summary = "Replace a role",
    description = "Replaces the role's fields and makes its permission set exactly the given list, in one transaction. An absent slug keeps the stored one; an absent description, flag or permission list resets it. Requires `roles.update`.",
    params(("id" = i32, Path, description = "Role ID")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Role not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload))]
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<RoleRequest>,
) -> Result<Json<RoleResponse>, AppError> {
    let existing = find_role(&state.db, id).await?;
    let (input, slug) = validated(&state.db, payload, Some(&existing)).await?;

    let txn = state.db.begin().await?;
    let locked = role::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".into()))?;

    let mut active: role::ActiveModel = locked.into();
    active.name = Set(input.name);
    active.slug = Set(slug);
    active.description = Set(input.description);
    active.is_superadmin = Set(input.is_superadmin);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&txn).await.map_err(slug_conflict)?;

    let report = sync_role_permissions(&txn, id, &input.permissions).await?;

    txn.commit().await?;

    tracing::info!(
        role_id = id,
        attached = ?report.attached,
        detached = ?report.detached,
        "Role updated"
    );

    Ok(Json(role_response(&state.db, model).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Roles",
    operation_id = "deleteRole",
    summary = "Delete a role",
    description = "Deletes a role. Its users are left without a role and lose every permission. Requires `roles.delete`.",
    params(("id" = i32, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Role not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state))]
pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = role::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".into()))?;

    let orphaned = user::Entity::update_many()
        .col_expr(user::Column::RoleId, Expr::value(Option::<i32>::None))
        .filter(user::Column::RoleId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;
    role_has_permission::Entity::delete_many()
        .filter(role_has_permission::Column::RoleId.eq(id))
        .exec(&txn)
        .await?;
    role::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(slug = %existing.slug, users = orphaned, "Role deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_role<C: ConnectionTrait>(db: &C, id: i32) -> Result<role::Model, AppError> {
    role::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".into()))
}

/// Permissions held by each of `role_ids`, ordered by group then name.
async fn permissions_by_role<C: ConnectionTrait>(
    db: &C,
    role_ids: &[i32],
) -> Result<HashMap<i32, Vec<PermissionResponse>>, DbErr> {
    let mut held: HashMap<i32, Vec<PermissionResponse>> = HashMap::new();
    if role_ids.is_empty() {
        return Ok(held);
    }

    let rows = role_has_permission::Entity::find()
        .filter(role_has_permission::Column::RoleId.is_in(role_ids.iter().copied()))
        .find_also_related(permission::Entity)
        .order_by_asc(permission::Column::Group)
        .order_by_asc(permission::Column::Name)
        .all(db)
        .await?;

    for (link, permission) in rows {
        if let Some(permission) = permission {
            held.entry(link.role_id)
                .or_default()
                .push(PermissionResponse::from(permission));
        }
    }
    Ok(held)
}

async fn role_response<C: ConnectionTrait>(
    db: &C,
    model: role::Model,
) -> Result<RoleResponse, AppError> {
    let permissions = permissions_by_role(db, &[model.id])
        .await?
        .remove(&model.id)
        .unwrap_or_default();
    Ok(RoleResponse::new(model, permissions))
}

/// Field validation plus the database checks: slug uniqueness (ignoring
/// `current`) and existence of every permission id. Returns the input with
/// its resolved slug.
async fn validated(
    db: &DatabaseConnection,
    payload: RoleRequest,
    current: Option<&role::Model>,
) -> Result<(RoleInput, String), AppError> {
    let mut v = Validator::new();

    let requested: BTreeSet<i32> = payload.permissions.iter().flatten().copied().collect();
    if let Some(missing) = missing_permissions(db, &requested).await?.first() {
        v.fail("permissions", format!("The selected permission {missing} is invalid."));
    }

    let Some(input) = payload.validate(&mut v) else {
        v.finish()?;
        return Err(AppError::Validation("The given data was invalid".into()));
    };

    let slug = match (&input.slug, current) {
        (Some(slug), _) => slug.clone(),
        (None, Some(existing)) => existing.slug.clone(),
        (None, None) => slugify(&input.name),
    };

    v.optional("slug", Some(slug.as_str()), 255);
    if slug.is_empty() {
        v.fail("slug", "The slug field is required.");
    } else if !v.has("slug") {
        let mut taken = role::Entity::find().filter(role::Column::Slug.eq(slug.as_str()));
        if let Some(existing) = current {
            taken = taken.filter(role::Column::Id.ne(existing.id));
        }
        if taken.count(db).await? > 0 {
            v.fail("slug", "The slug has already been taken.");
        }
    }

    v.finish()?;
    Ok((input, slug))
}

async fn missing_permissions(
    db: &DatabaseConnection,
    ids: &BTreeSet<i32>,
) -> Result<Vec<i32>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let found: BTreeSet<i32> = permission::Entity::find()
        .select_only()
        .column(permission::Column::Id)
        .filter(permission::Column::Id.is_in(ids.iter().copied()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(ids.difference(&found).copied().collect())
}

/// Lost race on the unique `slug` index.
fn slug_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Role slug race: unique constraint caught on write");
            AppError::field("slug", "The slug has already been taken.")
        }
        _ => AppError::from(e),
    }
}
