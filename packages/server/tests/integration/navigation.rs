use serde_json::{Value, json};

use crate::common::{TestApp, routes};

fn labels(menu: &Value) -> Vec<(String, Vec<String>)> {
    menu.as_array()
        .unwrap()
        .iter()
        .map(|section| {
            let items = section["items"]
                .as_array()
                .unwrap()
                .iter()
                .map(|item| item["label"].as_str().unwrap().to_string())
                .collect();
            (section["label"].as_str().unwrap().to_string(), items)
        })
        .collect()
}

#[tokio::test]
async fn anonymous_viewer_gets_nothing() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::NAVIGATION).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn user_without_role_sees_only_keyless_items() {
    let app = TestApp::spawn().await;
    app.create_user("nobody@example.com", None).await;
    let token = app.login("nobody@example.com").await;

    let res = app.get_with_token(routes::NAVIGATION, &token).await;

    assert_eq!(res.status, 200);
    assert_eq!(
        labels(&res.body),
        vec![(
            "Settings".to_string(),
            vec!["Profile".to_string(), "Appearance".to_string()]
        )]
    );
}

#[tokio::test]
async fn keyed_items_follow_grants_in_declared_order() {
    let app = TestApp::spawn().await;
    let token = app
        .token_with("editor@example.com", &["permissions.view", "users.view"])
        .await;

    let res = app.get_with_token(routes::NAVIGATION, &token).await;

    assert_eq!(res.status, 200);
    let menu = labels(&res.body);
    assert_eq!(menu.len(), 2);
    assert_eq!(menu[0].0, "Administration");
    assert_eq!(menu[0].1, vec!["Users", "Permissions"]);
    assert_eq!(menu[1].0, "Settings");

    let users = &res.body[0]["items"][0];
    assert_eq!(users["href"], "/admin/users");
    assert_eq!(users["permission"], "users.view");
}

#[tokio::test]
async fn superadmin_sees_everything() {
    let app = TestApp::spawn().await;
    let token = app.superadmin_token().await;

    let res = app.get_with_token(routes::NAVIGATION, &token).await;

    let menu = labels(&res.body);
    let sections: Vec<&str> = menu.iter().map(|(label, _)| label.as_str()).collect();
    assert_eq!(sections, vec!["General", "Administration", "Settings"]);
    assert_eq!(menu[1].1.len(), 3);
}

#[tokio::test]
async fn bad_token_is_rejected_rather_than_treated_as_anonymous() {
    let app = TestApp::spawn().await;

    let res = app.get_with_token(routes::NAVIGATION, "garbage").await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_INVALID");
}
