//! Request layers: bearer authentication and per-route permission gates.

use std::future::Future;
use std::pin::Pin;

use authz::{Actor, Gate};
use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};

use crate::access::DbPermissions;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::state::AppState;

/// Require a valid bearer token and expose the caller's [`Actor`] to the
/// layers and handlers below.
///
/// Missing token ⇒ 401 `TOKEN_MISSING`; bad token or vanished user ⇒ 401
/// `TOKEN_INVALID`.
pub async fn authenticate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();
    let user =
        <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state).await?;
    parts.extensions.insert(user.actor);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

type GateFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// Gate a route group behind one permission key.
///
/// ```ignore
/// router.route_layer(middleware::from_fn_with_state(state.clone(), require_permission("users.view")))
/// ```
///
/// Reads the [`Actor`] left by [`authenticate`]; a request without one is
/// forbidden. The check runs on every request and the handler is never
/// reached on denial.
pub fn require_permission(
    key: &'static str,
) -> impl Fn(State<AppState>, Request, Next) -> GateFuture + Clone {
    let gate = Gate::new(key);

    move |State(state): State<AppState>, request: Request, next: Next| {
        Box::pin(async move {
            let actor = request.extensions().get::<Actor>().cloned();
            let lookup = DbPermissions::new(&state.db);

            let response = gate
                .guard(&lookup, actor.as_ref(), || next.run(request))
                .await?;
            Ok(response)
        })
    }
}
