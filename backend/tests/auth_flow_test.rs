//! End-to-end token lifecycle tests against in-memory stores

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_login_logout_lifecycle() {
    let app = common::TestApp::in_memory();

    let token = app.register_and_login("alice", "secret1").await;

    // Identity resolves while the token is live
    let (status, body) = app.get_auth("/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["username"], "alice");

    // Logout revokes it
    let (status, body) = app.post_auth("/logout", &token).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "success");

    // The interceptor now rejects it before any handler runs
    let (status, body) = app.get_auth("/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("TOKEN_REVOKED"));
}

#[tokio::test]
async fn test_logout_is_idempotent_at_service_level() {
    let app = common::TestApp::in_memory();
    let token = app.register_and_login("alice", "secret1").await;

    app.state.auth().logout(&token).await.unwrap();
    app.state.auth().logout(&token).await.unwrap();

    assert!(app.state.auth().is_revoked(&token).await.unwrap());
}

#[tokio::test]
async fn test_second_registration_fails() {
    let app = common::TestApp::in_memory();
    let body = json!({ "username": "alice", "password": "secret1" }).to_string();

    let (status, _) = app.post("/register", &body).await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = app.post("/register", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("DUPLICATE_USER"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_registration_admits_one() {
    let app = common::TestApp::in_memory();
    let body = json!({ "username": "bob", "password": "secret1" }).to_string();

    let (first, second) = tokio::join!(app.post("/register", &body), app.post("/register", &body));
    let mut statuses = [first.0, second.0];
    statuses.sort_by_key(|status| status.as_u16());

    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);
}

#[tokio::test]
async fn test_login_error_does_not_reveal_username() {
    let app = common::TestApp::in_memory();
    app.register_and_login("alice", "secret1").await;

    let wrong_password = app
        .post("/login", &json!({ "username": "alice", "password": "bad" }).to_string())
        .await;
    let unknown_user = app
        .post("/login", &json!({ "username": "zed", "password": "bad" }).to_string())
        .await;

    assert_eq!(wrong_password, unknown_user);
    assert!(!wrong_password.1.contains("bad"));
}
