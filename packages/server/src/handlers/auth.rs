use axum::{Json, extract::State};
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{permission, role, role_has_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{LoginRequest, LoginResponse, MeResponse};
use crate::models::shared::Validator;
use crate::models::user::UserResponse;
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Exchange credentials for a bearer token",
    description = "Verifies the email and password and returns a JWT that identifies the user. The token carries no permissions; every request re-reads them.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let mut v = Validator::new();
    let credentials = payload.validate(&mut v);
    v.finish()?;
    let Some((email, password)) = credentials else {
        return Err(AppError::Validation("Email and password are required".into()));
    };

    let Some((user, role)) = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .find_also_related(role::Entity)
        .one(&state.db)
        .await?
    else {
        tracing::debug!("Login for unknown email");
        return Err(AppError::InvalidCredentials);
    };

    let is_valid = hash::verify_password(&password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(
        user.id,
        &user.email,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::new(user, role),
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Get the current user",
    description = "Returns the authenticated user, their role, the superadmin flag and the keys attached to their role.",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user.id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let permissions = match &auth_user.role {
        Some(role) => {
            permission::Entity::find()
                .select_only()
                .column(permission::Column::Key)
                .filter(
                    permission::Column::Id.in_subquery(
                        SeaQuery::select()
                            .column(role_has_permission::Column::PermissionId)
                            .from(role_has_permission::Entity)
                            .and_where(role_has_permission::Column::RoleId.eq(role.id))
                            .to_owned(),
                    ),
                )
                .order_by_asc(permission::Column::Key)
                .into_tuple::<String>()
                .all(&state.db)
                .await?
        }
        None => Vec::new(),
    };

    Ok(Json(MeResponse {
        is_superadmin: auth_user.actor.is_super_admin(),
        user: UserResponse::new(auth_user.user, auth_user.role),
        permissions,
    }))
}
