use axum::middleware;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::middleware::{authenticate, require_permission};
use crate::state::AppState;

pub fn routes(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .routes(routes!(handlers::navigation::navigation))
        .nest("/admin", admin_routes(state))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

/// Every admin route needs a signed-in user; each group below then needs its
/// own permission key.
fn admin_routes(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/permissions", permission_routes(state))
        .nest("/roles", role_routes(state))
        .nest("/users", user_routes(state))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

fn gated(
    state: &AppState,
    key: &'static str,
    router: OpenApiRouter<AppState>,
) -> OpenApiRouter<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_permission(key),
    ))
}

fn permission_routes(state: &AppState) -> OpenApiRouter<AppState> {
    use handlers::permission::*;

    let view = OpenApiRouter::new().routes(routes!(list_permissions));
    let create = OpenApiRouter::new().routes(routes!(create_permission));
    let update = OpenApiRouter::new().routes(routes!(update_permission));
    let delete = OpenApiRouter::new().routes(routes!(delete_permission));

    gated(state, "permissions.view", view)
        .merge(gated(state, "permissions.create", create))
        .merge(gated(state, "permissions.update", update))
        .merge(gated(state, "permissions.delete", delete))
}

fn role_routes(state: &AppState) -> OpenApiRouter<AppState> {
    use handlers::role::*;

    let view = OpenApiRouter::new().routes(routes!(list_roles));
    let create = OpenApiRouter::new().routes(routes!(create_role));
    let update = OpenApiRouter::new().routes(routes!(update_role));
    let delete = OpenApiRouter::new().routes(routes!(delete_role));

    gated(state, "roles.view", view)
        .merge(gated(state, "roles.create", create))
        .merge(gated(state, "roles.update", update))
        .merge(gated(state, "roles.delete", delete))
}

fn user_routes(state: &AppState) -> OpenApiRouter<AppState> {
    use handlers::user::*;

    let view = OpenApiRouter::new().routes(routes!(list_users));
    let create = OpenApiRouter::new().routes(routes!(create_user));
    let update = OpenApiRouter::new().routes(routes!(update_user));
    let delete = OpenApiRouter::new().routes(routes!(delete_user));

    gated(state, "users.view", view)
        .merge(gated(state, "users.create", create))
        .merge(gated(state, "users.update", update))
        .merge(gated(state, "users.delete", delete))
}
