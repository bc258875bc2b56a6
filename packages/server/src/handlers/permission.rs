use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{permission, role_has_permission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::permission::*;
use crate::models::shared::{ListQuery, Pagination, Validator};
use crate::state::AppState;

const PER_PAGE: u64 = 15;

#[utoipa::path(
    get,
    path = "/",
    tag = "Permissions",
    operation_id = "listPermissions",
    summary = "List permissions",
    description = "Returns permissions ordered by group then name, 15 per page by default. Requires `permissions.view`.",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of permissions", body = PermissionListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state))]
pub async fn list_permissions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PermissionListResponse>, AppError> {
    let (page, per_page) = query.window(PER_PAGE);

    let select = permission::Entity::find();
    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .order_by_asc(permission::Column::Group)
        .order_by_asc(permission::Column::Name)
        .offset(Some(ListQuery::offset(page, per_page)))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(PermissionListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Permissions",
    operation_id = "createPermission",
    summary = "Create a permission",
    description = "Creates a permission with a unique key. Requires `permissions.create`.",
    request_body = PermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = PermissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload))]
pub async fn create_permission(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PermissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = validated(&state.db, payload, None).await?;

    let now = chrono::Utc::now();
    let model = permission::ActiveModel {
        name: Set(input.name),
        key: Set(input.key),
        group: Set(input.group),
        description: Set(input.description),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(key_conflict)?;

    tracing::info!(permission_id = model.id, key = %model.key, "Permission created");

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(model))))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Permissions",
    operation_id = "updatePermission",
    summary = "Replace a permission",
    description = "Replaces every field of a permission. The key must stay unique. Requires `permissions.update`.",
    params(("id" = i32, Path, description = "Permission ID")),
    request_body = PermissionRequest,
    responses(
        (status = 200, description = "Permission updated", body = PermissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Permission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload))]
pub async fn update_permission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<PermissionRequest>,
) -> Result<Json<PermissionResponse>, AppError> {
    let existing = find_permission(&state.db, id).await?;
    let input = validated(&state.db, payload, Some(id)).await?;

    let mut active: permission::ActiveModel = existing.into();
    active.name = Set(input.name);
    active.key = Set(input.key);
    active.group = Set(input.group);
    active.description = Set(input.description);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await.map_err(key_conflict)?;

    Ok(Json(PermissionResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Permissions",
    operation_id = "deletePermission",
    summary = "Delete a permission",
    description = "Deletes a permission and detaches it from every role. Roles that relied on it lose that access. Requires `permissions.delete`.",
    params(("id" = i32, Path, description = "Permission ID")),
    responses(
        (status = 204, description = "Permission deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Permission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state))]
pub async fn delete_permission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_permission(&txn, id).await?;

    let detached = role_has_permission::Entity::delete_many()
        .filter(role_has_permission::Column::PermissionId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;
    permission::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(key = %existing.key, roles = detached, "Permission deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_permission<C: ConnectionTrait>(db: &C, id: i32) -> Result<permission::Model, AppError> {
    permission::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Permission not found".into()))
}

/// Field validation plus the `key` uniqueness check, ignoring `current`.
async fn validated(
    db: &DatabaseConnection,
    payload: PermissionRequest,
    current: Option<i32>,
) -> Result<PermissionInput, AppError> {
    let mut v = Validator::new();
    let input = payload.validate(&mut v);

    if let Some(input) = &input {
        let mut taken = permission::Entity::find().filter(permission::Column::Key.eq(input.key.as_str()));
        if let Some(id) = current {
            taken = taken.filter(permission::Column::Id.ne(id));
        }
        if taken.count(db).await? > 0 {
            v.fail("key", "The key has already been taken.");
        }
    }

    v.finish()?;
    input.ok_or_else(|| AppError::Validation("The given data was invalid".into()))
}

/// Lost race on the unique `key` index.
fn key_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Permission key race: unique constraint caught on write");
            AppError::field("key", "The key has already been taken.")
        }
        _ => AppError::from(e),
    }
}
