mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn register_login_and_me() {
    let app = common::spawn_app().await;
    let username = common::unique("alice");

    // Register
    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": username,
            "password": "password_123",
            "name": "Alice Liddell",
            "department": "Finance"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert!(body["success"].as_bool().unwrap());
    assert_eq!(body["data"]["user"]["role"], "END_USER");
    assert!(body["data"]["token"].as_str().is_some());

    // Login
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "username": username, "password": "password_123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["user"]["name"], "Alice Liddell");

    // Current user
    let (status, body) = app.get("/auth/me", &token).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["username"], username.as_str());
    assert_eq!(body["data"]["department"], "Finance");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    let app = common::spawn_app().await;
    let username = common::unique("bob");
    let payload = json!({
        "username": username,
        "password": "password_123",
        "name": "Bob",
        "department": "Sales"
    });

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn register_reports_every_invalid_field() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": "ab",
            "password": "short",
            "name": "Carol",
            "department": "IT"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn wrong_password_is_unauthenticated() {
    let app = common::spawn_app().await;
    let user = common::create_end_user(&app).await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "username": user.username, "password": "not_the_password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "username": user.username, "password": common::TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/tickets")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let (status, body) = app.get("/tickets", "garbage.token.value").await;
    assert_eq!(status, 401);
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn token_of_deleted_user_stops_working() {
    let app = common::spawn_app().await;
    let admin = common::create_admin(&app).await;
    let user = common::create_end_user(&app).await;

    let (status, _) = app.get("/auth/me", &user.token).await;
    assert_eq!(status, 200);

    let (status, _) = app.delete(&format!("/users/{}", user.id), &admin.token).await;
    assert_eq!(status, 200);

    let (status, _) = app.get("/auth/me", &user.token).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn end_users_cannot_reach_staff_routes() {
    let app = common::spawn_app().await;
    let user = common::create_end_user(&app).await;

    let (status, body) = app.get("/users", &user.token).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app.get("/stats/reports", &user.token).await;
    assert_eq!(status, 403);

    let agent = common::create_agent(&app).await;
    let (status, _) = app.get("/stats", &agent.token).await;
    assert_eq!(status, 403);
}
