use authz::Actor;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::access;
use crate::entity::{role, user};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Signed-in user resolved from the `Authorization: Bearer <token>` header.
///
/// The token only proves identity. The user row and its role are re-read from
/// the database on every request, so role changes apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: user::Model,
    pub role: Option<role::Model>,
    pub actor: Actor,
}

impl AuthUser {
    /// Verify `token` and load the user it names.
    pub async fn resolve(state: &AppState, token: &str) -> Result<Self, AppError> {
        let claims =
            jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        let (user, role, actor) = access::load_actor(&state.db, claims.uid)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        Ok(AuthUser { user, role, actor })
    }
}

/// `Ok(None)` when no `Authorization` header is sent at all.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or(AppError::TokenInvalid)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by the `authenticate` layer.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = bearer_token(&parts.headers)?.ok_or(AppError::TokenMissing)?;
        let user = AuthUser::resolve(state, token).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Anonymous when no token is sent; a bad token is still rejected.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::TokenMissing) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
