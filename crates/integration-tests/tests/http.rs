//! Integration tests for the HTTP router.
//!
//! Requests are sent in-process with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::Duration;
use serde_json::{Value, json};
use tower::ServiceExt;

use enlist_integration_tests::TestContext;

async fn send(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post_json(ctx: &TestContext, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/registration")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, text) = send(ctx.router(), request).await;
    (status, serde_json::from_str(&text).unwrap())
}

async fn get(ctx: &TestContext, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(ctx.router(), request).await
}

fn ann() -> Value {
    json!({
        "first_name": "Ann",
        "last_name": "Lee",
        "email": "ann@x.com",
        "password": "secret",
    })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();

    let (status, body) = get(&ctx, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

// =============================================================================
// Signup
// =============================================================================

#[tokio::test]
async fn test_signup_returns_created_with_token() {
    let ctx = TestContext::new();

    let (status, body) = post_json(&ctx, &ann()).await;

    assert_eq!(status, StatusCode::CREATED);
    let token = body["token"].as_str().unwrap();
    assert_eq!(ctx.tokens.all()[0].token.as_str(), token);
}

#[tokio::test]
async fn test_repeat_signup_returns_accepted() {
    let ctx = TestContext::new();

    let (_, first) = post_json(&ctx, &ann()).await;
    let (status, second) = post_json(&ctx, &ann()).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_ne!(first["token"], second["token"]);
    assert!(second["message"].is_string());
}

#[tokio::test]
async fn test_signup_for_taken_email_returns_conflict() {
    let ctx = TestContext::new();
    post_json(&ctx, &ann()).await;

    let mut other = ann();
    other["password"] = json!("different");
    let (status, body) = post_json(&ctx, &other).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "email_taken");
}

#[tokio::test]
async fn test_signup_with_invalid_email_returns_bad_request() {
    let ctx = TestContext::new();

    let mut request = ann();
    request["email"] = json!("no-at-sign");
    let (status, body) = post_json(&ctx, &request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_email");
    assert!(ctx.users.all().is_empty());
}

#[tokio::test]
async fn test_signup_with_missing_field_returns_bad_request() {
    let ctx = TestContext::new();

    let (status, body) = post_json(&ctx, &json!({ "email": "ann@x.com" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_signup_with_malformed_json_returns_bad_request() {
    let ctx = TestContext::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/registration")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _) = send(ctx.router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Confirmation
// =============================================================================

#[tokio::test]
async fn test_confirm_renders_page_and_enables_user() {
    let ctx = TestContext::new();
    let (_, body) = post_json(&ctx, &ann()).await;
    let token = body["token"].as_str().unwrap();

    let (status, html) = get(&ctx, &format!("/registration/confirm?token={token}")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Email confirmed"));
    assert!(html.contains("ann@x.com"));
    assert!(ctx.users.get("ann@x.com").unwrap().enabled);
}

#[tokio::test]
async fn test_confirm_status_codes() {
    let ctx = TestContext::new();
    let (_, body) = post_json(&ctx, &ann()).await;
    let uri = format!(
        "/registration/confirm?token={}",
        body["token"].as_str().unwrap()
    );

    let (status, _) = get(&ctx, "/registration/confirm?token=unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&ctx, "/registration/confirm").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&ctx, &uri).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&ctx, &uri).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_confirm_expired_token_returns_gone() {
    let ctx = TestContext::new();
    let (_, body) = post_json(&ctx, &ann()).await;
    let token = body["token"].as_str().unwrap();

    ctx.clock.advance(Duration::minutes(16));
    let (status, _) = get(&ctx, &format!("/registration/confirm?token={token}")).await;

    assert_eq!(status, StatusCode::GONE);
    assert!(!ctx.users.get("ann@x.com").unwrap().enabled);
}
