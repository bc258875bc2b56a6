use serde_json::{Value, json};

use crate::common::{TestApp, routes};

#[tokio::test]
async fn create_hashes_password_and_allows_login() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;
    let role_id = app.create_role("editor", &["roles.view"]).await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "name": "Ana Torres",
                "email": "ana@example.com",
                "password": "s3cure_P@ss!",
                "role_id": role_id,
            }),
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["role"]["slug"], "editor");
    assert!(res.body.get("password_hash").is_none());
    assert!(!res.text.contains("s3cure_P@ss!"));

    let login = app
        .post_without_token(
            routes::LOGIN,
            &json!({"email": "ana@example.com", "password": "s3cure_P@ss!"}),
        )
        .await;
    assert_eq!(login.status, 200, "{}", login.text);
}

#[tokio::test]
async fn create_validates_every_field() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({"email": "not-an-email", "password": "short", "role_id": 999}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    let fields = res.body["fields"].as_object().unwrap();
    for field in ["name", "email", "password", "role_id"] {
        assert!(fields.contains_key(field), "missing {field}: {}", res.text);
    }
}

#[tokio::test]
async fn duplicate_email_is_a_field_error() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({"name": "Clone", "email": "root@example.com", "password": "password123"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert!(res.body["fields"]["email"].is_string());
}

#[tokio::test]
async fn update_without_password_keeps_it_and_clears_role() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;
    let role_id = app.create_role("editor", &["roles.view"]).await;
    let id = app.create_user("ana@example.com", Some(role_id)).await;

    let res = app
        .put_with_token(
            &routes::user(id),
            &json!({"name": "Ana T.", "email": "ana@example.com", "password": ""}),
            &token,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "Ana T.");
    assert_eq!(res.body["role"], Value::Null);

    app.login("ana@example.com").await;
}

#[tokio::test]
async fn update_with_password_rehashes() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;
    let id = app.create_user("ana@example.com", None).await;

    let res = app
        .put_with_token(
            &routes::user(id),
            &json!({"name": "Ana", "email": "ana@example.com", "password": "brand-new-pass"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let login = app
        .post_without_token(
            routes::LOGIN,
            &json!({"email": "ana@example.com", "password": "brand-new-pass"}),
        )
        .await;
    assert_eq!(login.status, 200);
}

#[tokio::test]
async fn update_may_keep_own_email() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;
    let id = app.create_user("ana@example.com", None).await;
    app.create_user("bea@example.com", None).await;

    let same = app
        .put_with_token(
            &routes::user(id),
            &json!({"name": "Ana", "email": "ana@example.com"}),
            &token,
        )
        .await;
    assert_eq!(same.status, 200, "{}", same.text);

    let taken = app
        .put_with_token(
            &routes::user(id),
            &json!({"name": "Ana", "email": "bea@example.com"}),
            &token,
        )
        .await;
    assert_eq!(taken.status, 400);
    assert!(taken.body["fields"]["email"].is_string());
}

#[tokio::test]
async fn list_carries_roles_and_is_ordered_by_name() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;
    app.create_user("zoe@example.com", None).await;
    app.create_user("adam@example.com", None).await;

    let res = app.get_with_token(routes::USERS, &token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["per_page"], 15);
    let names: Vec<&str> = res.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["adam", "root", "zoe"]);
    assert_eq!(res.body["roles"][0]["slug"], "superadmin");
}

#[tokio::test]
async fn delete_unknown_user_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;

    let res = app.delete_with_token(&routes::user(31337), &token).await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn user_without_role_is_forbidden_everywhere() {
    let app = TestApp::spawn().await;
    app.create_user("nobody@example.com", None).await;
    let token = app.login("nobody@example.com").await;

    for path in [routes::USERS, routes::ROLES, routes::PERMISSIONS] {
        let res = app.get_with_token(path, &token).await;
        assert_eq!(res.status, 403, "{path}");
    }
}
