use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{role, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::role::RoleSummary;
use crate::models::shared::{ListQuery, Pagination, Validator};
use crate::models::user::*;
use crate::state::AppState;
use crate::utils::hash;

const PER_PAGE: u64 = 15;

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users with their roles",
    description = "Returns users ordered by name, 15 per page by default, each with its role. Also returns every role ordered by name. Requires `users.view`.",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of users", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    let (page, per_page) = query.window(PER_PAGE);

    let total = user::Entity::find().count(&state.db).await?;

    let data = user::Entity::find()
        .find_also_related(role::Entity)
        .order_by_asc(user::Column::Name)
        .offset(Some(ListQuery::offset(page, per_page)))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(u, r)| UserResponse::new(u, r))
        .collect();

    let roles = role::Entity::find()
        .order_by_asc(role::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(RoleSummary::from)
        .collect();

    Ok(Json(UserListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
        roles,
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user",
    description = "Creates a user with a hashed password and an optional role. Requires `users.create`.",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (input, role) = validated(&state.db, payload, None).await?;

    let password = input
        .password
        .ok_or_else(|| AppError::field("password", "The password field is required."))?;
    let password_hash = hash::hash_password(&password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let now = chrono::Utc::now();
    let model = user::ActiveModel {
        name: Set(input.name),
        email: Set(input.email),
        password_hash: Set(password_hash),
        role_id: Set(input.role_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(email_conflict)?;

    tracing::info!(user_id = model.id, role_id = ?model.role_id, "User created");

    Ok((StatusCode::CREATED, Json(UserResponse::new(model, role))))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Replace a user",
    description = "Replaces name, email and role. The password is only changed when a non-empty one is sent. An absent or null `role_id` removes the role. Requires `users.update`.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let existing = find_user(&state.db, id).await?;
    let (input, role) = validated(&state.db, payload, Some(id)).await?;

    let mut active: user::ActiveModel = existing.into();
    active.name = Set(input.name);
    active.email = Set(input.email);
    active.role_id = Set(input.role_id);
    if let Some(password) = input.password {
        let password_hash = hash::hash_password(&password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
        active.password_hash = Set(password_hash);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await.map_err(email_conflict)?;

    Ok(Json(UserResponse::new(model, role)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user",
    description = "Permanently deletes a user. Requires `users.delete`.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(by = auth_user.user.id))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let result = user::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    tracing::info!(user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Field validation plus email uniqueness (ignoring `current`) and role
/// existence. Returns the input with the resolved role.
async fn validated(
    db: &DatabaseConnection,
    payload: UserRequest,
    current: Option<i32>,
) -> Result<(UserInput, Option<role::Model>), AppError> {
    let mut v = Validator::new();

    let role = match payload.role_id {
        Some(role_id) => {
            let role = role::Entity::find_by_id(role_id).one(db).await?;
            if role.is_none() {
                v.fail("role_id", "The selected role is invalid.");
            }
            role
        }
        None => None,
    };

    let Some(input) = payload.validate(&mut v, current.is_none()) else {
        v.finish()?;
        return Err(AppError::Validation("The given data was invalid".into()));
    };

    if !v.has("email") {
        let mut taken = user::Entity::find().filter(user::Column::Email.eq(input.email.as_str()));
        if let Some(id) = current {
            taken = taken.filter(user::Column::Id.ne(id));
        }
        if taken.count(db).await? > 0 {
            v.fail("email", "The email has already been taken.");
        }
    }

    v.finish()?;
    Ok((input, role))
}

/// Lost race on the unique `email` index.
fn email_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("User email race: unique constraint caught on write");
            AppError::field("email", "The email has already been taken.")
        }
        _ => AppError::from(e),
    }
}
