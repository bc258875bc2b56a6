use authz::NavSection;
use axum::{Json, extract::State};
use tracing::instrument;

use crate::access::DbPermissions;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/navigation",
    tag = "Navigation",
    operation_id = "getNavigation",
    summary = "Menu for the current viewer",
    description = "Returns the configured menu pruned to what the caller may see. Items without a permission need only a signed-in user; sections left empty are dropped. Anonymous callers get an empty list.",
    responses(
        (status = 200, description = "Filtered menu", body = Vec<NavSection>),
        (status = 401, description = "Bad token (TOKEN_INVALID)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip_all, fields(user_id = auth_user.as_ref().map(|u| u.user.id)))]
pub async fn navigation(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<Vec<NavSection>>, AppError> {
    let actor = auth_user.as_ref().map(|u| &u.actor);
    let lookup = DbPermissions::new(&state.db);

    let menu = authz::navigation::build(&state.config.navigation, actor, &lookup).await?;

    Ok(Json(menu))
}
