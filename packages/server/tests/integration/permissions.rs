use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn list_is_ordered_by_group_then_name_and_paginated() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;

    let res = app.get_with_token(routes::PERMISSIONS, &token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["per_page"], 15);
    assert_eq!(res.body["pagination"]["total"], 13);
    let data = res.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 13);
    let groups: Vec<&str> = data.iter().map(|p| p["group"].as_str().unwrap()).collect();
    let mut sorted = groups.clone();
    sorted.sort();
    assert_eq!(groups, sorted);

    let page2 = app
        .get_with_token(&format!("{}?page=2&per_page=10", routes::PERMISSIONS), &token)
        .await;
    assert_eq!(page2.body["data"].as_array().unwrap().len(), 3);
    assert_eq!(page2.body["pagination"]["total_pages"], 2);
}

#[tokio::test]
async fn page_far_past_the_end_is_empty() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;

    for path in [routes::PERMISSIONS, routes::ROLES, routes::USERS] {
        let res = app
            .get_with_token(&format!("{path}?page={}", u64::MAX), &token)
            .await;

        assert_eq!(res.status, 200, "{path}: {}", res.text);
        assert_eq!(res.body["data"], json!([]), "{path}");
        assert_eq!(res.body["pagination"]["page"], u64::MAX, "{path}");
    }
}

#[tokio::test]
async fn create_then_update_then_delete() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;

    let created = app
        .post_with_token(
            routes::PERMISSIONS,
            &json!({"name": "Export reports", "key": "reports.export", "group": "Reports"}),
            &token,
        )
        .await;
    assert_eq!(created.status, 201, "{}", created.text);
    assert_eq!(created.body["key"], "reports.export");
    let id = created.id();

    let updated = app
        .put_with_token(
            &routes::permission(id),
            &json!({"name": "Export all reports", "key": "reports.export", "description": "CSV"}),
            &token,
        )
        .await;
    assert_eq!(updated.status, 200, "{}", updated.text);
    assert_eq!(updated.body["name"], "Export all reports");
    assert_eq!(updated.body["group"], serde_json::Value::Null);
    assert_eq!(updated.body["description"], "CSV");

    let deleted = app.delete_with_token(&routes::permission(id), &token).await;
    assert_eq!(deleted.status, 204);

    let again = app.delete_with_token(&routes::permission(id), &token).await;
    assert_eq!(again.status, 404);
    assert_eq!(again.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn duplicate_key_is_a_field_error() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;

    let res = app
        .post_with_token(
            routes::PERMISSIONS,
            &json!({"name": "Dup", "key": "users.view"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["fields"]["key"].is_string());
}

#[tokio::test]
async fn update_may_keep_its_own_key_but_not_take_another() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;
    let id = app.permission_id("users.view").await;

    let same = app
        .put_with_token(
            &routes::permission(id),
            &json!({"name": "See users", "key": "users.view", "group": "Users"}),
            &token,
        )
        .await;
    assert_eq!(same.status, 200, "{}", same.text);

    let taken = app
        .put_with_token(
            &routes::permission(id),
            &json!({"name": "See users", "key": "users.delete"}),
            &token,
        )
        .await;
    assert_eq!(taken.status, 400);
    assert!(taken.body["fields"]["key"].is_string());
}

#[tokio::test]
async fn invalid_fields_are_all_reported_and_nothing_is_written() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;

    let res = app
        .post_with_token(
            routes::PERMISSIONS,
            &json!({"name": "", "key": "k".repeat(256), "description": "d".repeat(501)}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    let fields = res.body["fields"].as_object().unwrap();
    assert!(fields.contains_key("name"));
    assert!(fields.contains_key("key"));
    assert!(fields.contains_key("description"));

    let list = app.get_with_token(routes::PERMISSIONS, &token).await;
    assert_eq!(list.body["pagination"]["total"], 13);
}

#[tokio::test]
async fn deleting_a_permission_revokes_it_from_roles() {
    let app = TestApp::spawn().await;
    let admin = app.superadmin_token().await;
    let viewer = app.token_with("viewer@example.com", &["users.view"]).await;

    assert_eq!(app.get_with_token(routes::USERS, &viewer).await.status, 200);

    let id = app.permission_id("users.view").await;
    let res = app.delete_with_token(&routes::permission(id), &admin).await;
    assert_eq!(res.status, 204);

    let res = app.get_with_token(routes::USERS, &viewer).await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn each_action_needs_its_own_key() {
    let app = TestApp::spawn().await;
    let token = app.token_with("viewer@example.com", &["permissions.view"]).await;

    assert_eq!(app.get_with_token(routes::PERMISSIONS, &token).await.status, 200);

    let create = app
        .post_with_token(
            routes::PERMISSIONS,
            &json!({"name": "X", "key": "x.view"}),
            &token,
        )
        .await;
    assert_eq!(create.status, 403);
    assert_eq!(create.body["code"], "PERMISSION_DENIED");

    let id = app.permission_id("users.view").await;
    assert_eq!(
        app.delete_with_token(&routes::permission(id), &token)
            .await
            .status,
        403
    );
}

#[tokio::test]
async fn admin_routes_need_a_token() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::PERMISSIONS).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");
}
