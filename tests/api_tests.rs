use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use taskd::config::Config;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = taskd::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    taskd::api::router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": password })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_and_duplicate_email() {
    let app = spawn_app().await;

    let token = register(&app, "alice", "alice@x.com", "pw123").await;
    assert_eq!(token.split('.').count(), 3);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "alice", "email": "alice@x.com", "password": "pw123" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_register_validation() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "", "email": "alice@x.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "alice", "email": "nope", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_wrong_and_right_password() {
    let app = spawn_app().await;
    let t1 = register(&app, "alice", "alice@x.com", "pw123").await;

    let (status, wrong) = login(&app, "alice@x.com", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = login(&app, "bob@x.com", "pw123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["error"], unknown["error"]);

    let (status, body) = login(&app, "alice@x.com", "pw123").await;
    assert_eq!(status, StatusCode::OK);
    let t2 = body["data"]["token"].as_str().unwrap();
    assert_ne!(t1, t2);
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/todos", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    for header in ["Basic abc", "Bearer", "Bearer ", "token-without-scheme"] {
        let request = Request::builder()
            .uri("/api/todos")
            .header("Authorization", header)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header {header:?}");
    }

    let (status, body) = send(&app, "GET", "/api/todos", Some("not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");

    let (status, _) = send(&app, "GET", "/api/metrics", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_profile() {
    let app = spawn_app().await;
    let token = register(&app, "alice", "Alice@X.com", "pw123").await;

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@x.com");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_todo_crud_and_ownership() {
    let app = spawn_app().await;
    let alice = register(&app, "alice", "alice@x.com", "pw123").await;
    let bob = register(&app, "bob", "bob@x.com", "pw456").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/todos",
        Some(&alice),
        Some(json!({ "title": "Buy milk", "description": "2L" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["completed"], false);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/todos/{id}");

    let (status, body) = send(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Buy milk");

    // Bob can neither see nor touch it
    let (status, body) = send(&app, "GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Todo not found");

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&bob),
        Some(json!({ "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", "/api/todos", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Owner update: empty title is "unchanged"
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&alice),
        Some(json!({ "title": "", "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Buy milk");
    assert_eq!(body["data"]["completed"], true);

    let (status, body) = send(&app, "GET", "/api/todos", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_todo_validation() {
    let app = spawn_app().await;
    let token = register(&app, "alice", "alice@x.com", "pw123").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/todos",
        Some(&token),
        Some(json!({ "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/todos/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    raw: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = builder.body(Body::from(raw.to_string())).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).expect("error body should be JSON");

    (status, json)
}

#[tokio::test]
async fn test_undecodable_bodies_use_error_envelope() {
    let app = spawn_app().await;

    let cases = [
        r#"{"username":"#,
        r#"{"username":"alice","email":"alice@x.com"}"#,
        r#"{"username":1,"email":"alice@x.com","password":"pw123"}"#,
    ];
    for raw in cases {
        let (status, body) = send_raw(&app, "POST", "/api/auth/register", None, raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {raw}");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid request payload");
    }

    let (status, body) = send_raw(&app, "POST", "/api/auth/login", None, "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let token = register(&app, "alice", "alice@x.com", "pw123").await;

    let (status, body) = send_raw(&app, "POST", "/api/todos", Some(&token), r#"{"title":"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, created) = send(
        &app,
        "POST",
        "/api/todos",
        Some(&token),
        Some(json!({ "title": "Buy milk" })),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap();

    let (status, body) = send_raw(
        &app,
        "PUT",
        &format!("/api/todos/{id}"),
        Some(&token),
        r#"{"completed":"yes"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_logout_revokes_only_that_token() {
    let app = spawn_app().await;
    let t1 = register(&app, "alice", "alice@x.com", "pw123").await;
    let (_, body) = login(&app, "alice@x.com", "pw123").await;
    let t2 = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", "/api/auth/logout", Some(&t2), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["message"].is_string());

    let (status, _) = send(&app, "GET", "/api/todos", Some(&t2), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&t2), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/todos", Some(&t1), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = login(&app, "alice@x.com", "pw123").await;
    assert_eq!(status, StatusCode::OK);
    let t3 = body["data"]["token"].as_str().unwrap();

    let (status, _) = send(&app, "GET", "/api/todos", Some(t3), None).await;
    assert_eq!(status, StatusCode::OK);
}
