use std::sync::Arc;

use abroad::app::build_app;
use abroad::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

// ─── Test helpers ───────────────────────────────────────────────────────

fn test_app() -> Router {
    build_app(AppState::in_memory())
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
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

struct Account {
    id: String,
    access: String,
    refresh: String,
}

impl Account {
    fn from_body(body: &Value) -> Self {
        Self {
            id: body["data"]["user"]["id"].as_str().unwrap().to_string(),
            access: body["data"]["accessToken"].as_str().unwrap().to_string(),
            refresh: body["data"]["refreshToken"].as_str().unwrap().to_string(),
        }
    }
}

async fn register(app: &Router, name: &str, email: &str, password: &str) -> Account {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    Account::from_body(&body)
}

// ─── Tests ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn register_save_and_unsave_flow() {
    let app = test_app();
    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;

    let (status, me) = send(&app, "GET", "/api/auth/me", Some(&alice.access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], "alice@example.com");
    assert!(me["data"].get("passwordHash").is_none());

    let universities = format!("/api/user/{}/universities", alice.id);
    let mit = json!({ "name": "MIT", "country": "USA", "ranking": 1, "tuition": "$57,986" });

    let (status, first) = send(&app, "POST", &universities, Some(&alice.access), Some(mit.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["data"]["name"], "MIT");
    assert_eq!(first["data"]["kind"], "university");

    let (status, again) = send(&app, "POST", &universities, Some(&alice.access), Some(mit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["data"]["id"], first["data"]["id"]);

    let (status, list) = send(&app, "GET", &universities, Some(&alice.access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let status_uri = format!(
        "/api/user/{}/saved-status?kind=university&name=MIT",
        alice.id
    );
    let (_, saved) = send(&app, "GET", &status_uri, Some(&alice.access), None).await;
    assert_eq!(saved["data"]["saved"], true);

    let remove_uri = format!("{universities}?name=MIT");
    let (status, _) = send(&app, "DELETE", &remove_uri, Some(&alice.access), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &remove_uri, Some(&alice.access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, saved) = send(&app, "GET", &status_uri, Some(&alice.access), None).await;
    assert_eq!(saved["data"]["saved"], false);
    let (_, list) = send(&app, "GET", &universities, Some(&alice.access), None).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn login_then_save_and_unsave_a_university() {
    let app = test_app();
    register(&app, "Alice", "alice@example.com", "secret1").await;

    let (status, login) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let alice = Account::from_body(&login);
    let universities = format!("/api/user/{}/universities", alice.id);

    let (status, _) = send(
        &app,
        "POST",
        &universities,
        Some(&alice.access),
        Some(json!({ "name": "Stanford University", "country": "USA" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = send(&app, "GET", &universities, Some(&alice.access), None).await;
    let items = list["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Stanford University");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("{universities}?name=Stanford%20University"),
        Some(&alice.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = send(&app, "GET", &universities, Some(&alice.access), None).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let mut state = AppState::in_memory();
    let mut config = (*state.config).clone();
    config.jwt.refresh_ttl_minutes = 0;
    state.config = Arc::new(config);
    let app = build_app(state);

    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;

    // The access token is still valid; the session behind it is not.
    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&alice.access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn scholarships_are_a_separate_ledger() {
    let app = test_app();
    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;
    let scholarships = format!("/api/user/{}/scholarships", alice.id);

    let (status, saved) = send(
        &app,
        "POST",
        &scholarships,
        Some(&alice.access),
        Some(json!({
            "name": "Chevening Scholarships",
            "country": "UK",
            "amount": "Full tuition + living costs",
            "deadline": "November 2025"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["data"]["amount"], "Full tuition + living costs");

    let (_, universities) = send(
        &app,
        "GET",
        &format!("/api/user/{}/universities", alice.id),
        Some(&alice.access),
        None,
    )
    .await;
    assert!(universities["data"].as_array().unwrap().is_empty());

    let item_id = saved["data"]["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("{scholarships}/{item_id}"),
        Some(&alice.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = send(&app, "GET", &scholarships, Some(&alice.access), None).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
    let app = test_app();
    register(&app, "Bob Smith", "bob@example.com", "secret1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Bobby", "email": "BOB@Example.com", "password": "other12" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "An account with this email already exists");

    // The original password still works; the rejected attempt changed nothing.
    let (status, login) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "bob@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["data"]["user"]["name"], "Bob Smith");
}

#[tokio::test]
async fn registration_validates_input() {
    let app = test_app();
    let cases = [
        json!({ "name": "", "email": "", "password": "" }),
        json!({ "name": "A", "email": "a@example.com", "password": "secret1" }),
        json!({ "name": "Alice", "email": "not-an-email", "password": "secret1" }),
        json!({ "name": "Alice", "email": "a@example.com", "password": "12345" }),
    ];
    for case in cases {
        let (status, body) = send(&app, "POST", "/api/auth/register", None, Some(case)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn login_failures_look_identical() {
    let app = test_app();
    register(&app, "Alice", "alice@example.com", "secret1").await;

    let (unknown_status, unknown) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "secret1" })),
    )
    .await;
    let (wrong_status, wrong) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = test_app();
    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;

    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&alice.access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&alice.access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": alice.refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logging out twice, or with no token at all, is harmless.
    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&alice.access), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/api/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_keeps_the_session_alive() {
    let app = test_app();
    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;

    let (status, refreshed) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": alice.refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let renewed = Account::from_body(&refreshed);
    assert_eq!(renewed.id, alice.id);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&renewed.access), None).await;
    assert_eq!(status, StatusCode::OK);

    // An access token is not accepted where a refresh token is expected.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": alice.access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn requests_need_a_valid_token() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn other_accounts_are_off_limits() {
    let app = test_app();
    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;
    let bob = register(&app, "Bob Smith", "bob@example.com", "secret1").await;

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/user/{}", bob.id),
        Some(&alice.access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/user/{}/universities", bob.id),
        Some(&alice.access),
        Some(json!({ "name": "MIT" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, list) = send(
        &app,
        "GET",
        &format!("/api/user/{}/universities", bob.id),
        Some(&bob.access),
        None,
    )
    .await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn profile_update_only_touches_present_keys() {
    let app = test_app();
    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;
    let profile = format!("/api/user/{}", alice.id);

    let (status, _) = send(
        &app,
        "PUT",
        &profile,
        Some(&alice.access),
        Some(json!({ "country": "Germany", "targetDegree": "Masters" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, updated) = send(
        &app,
        "PUT",
        &profile,
        Some(&alice.access),
        Some(json!({ "phone": "123", "email": "evil@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["phone"], "123");
    assert_eq!(updated["data"]["country"], "Germany");
    assert_eq!(updated["data"]["targetDegree"], "Masters");
    assert_eq!(updated["data"]["name"], "Alice");
    assert_eq!(updated["data"]["email"], "alice@example.com");

    let (status, fetched) = send(&app, "GET", &profile, Some(&alice.access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], updated["data"]);
}
