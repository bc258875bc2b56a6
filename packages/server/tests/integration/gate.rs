use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{Router, middleware, routing::get};

use server::middleware::{authenticate, require_permission};

use crate::common::TestApp;

/// A single `/guarded` route behind `users.view` that counts its invocations.
fn counting_router(
    hits: Arc<AtomicUsize>,
    with_auth: bool,
) -> impl FnOnce(server::state::AppState) -> Router {
    move |state| {
        let router = Router::new()
            .route(
                "/guarded",
                get(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "ok"
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_permission("users.view"),
            ));

        let router = if with_auth {
            router.route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
        } else {
            router
        };

        router.with_state(state)
    }
}

#[tokio::test]
async fn request_without_actor_is_forbidden_and_handler_never_runs() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = TestApp::spawn_with(counting_router(hits.clone(), false)).await;

    let res = app.get_without_token("/guarded").await;

    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn user_with_exactly_the_key_reaches_handler_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = TestApp::spawn_with(counting_router(hits.clone(), true)).await;
    let token = app.token_with("viewer@example.com", &["users.view"]).await;

    let res = app.get_with_token("/guarded", &token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.text, "ok");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn user_without_the_key_is_forbidden() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = TestApp::spawn_with(counting_router(hits.clone(), true)).await;
    let token = app.token_with("other@example.com", &["roles.view"]).await;

    let res = app.get_with_token("/guarded", &token).await;

    assert_eq!(res.status, 403);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_token_is_unauthenticated_not_forbidden() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = TestApp::spawn_with(counting_router(hits.clone(), true)).await;

    let res = app.get_without_token("/guarded").await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn grants_are_rechecked_on_every_request() {
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    use server::entity::role_has_permission;

    let hits = Arc::new(AtomicUsize::new(0));
    let app = TestApp::spawn_with(counting_router(hits.clone(), true)).await;
    let token = app.token_with("viewer@example.com", &["users.view"]).await;

    assert_eq!(app.get_with_token("/guarded", &token).await.status, 200);

    let key_id = app.permission_id("users.view").await;
    role_has_permission::Entity::delete_many()
        .filter(role_has_permission::Column::PermissionId.eq(key_id))
        .exec(&app.db)
        .await
        .unwrap();

    let res = app.get_with_token("/guarded", &token).await;
    assert_eq!(res.status, 403);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn superadmin_passes_without_explicit_grants() {
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    use server::entity::role_has_permission;

    let hits = Arc::new(AtomicUsize::new(0));
    let app = TestApp::spawn_with(counting_router(hits.clone(), true)).await;
    let root_role = app.superadmin_role_id().await;
    role_has_permission::Entity::delete_many()
        .filter(role_has_permission::Column::RoleId.eq(root_role))
        .exec(&app.db)
        .await
        .unwrap();
    let token = app.superadmin_token().await;

    let res = app.get_with_token("/guarded", &token).await;

    assert_eq!(res.status, 200);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
