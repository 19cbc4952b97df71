use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use justifier::config::Config;
use justifier::handlers::AppState;
use justifier::server::build_router;

fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        justify_width: 20,
        token_ttl_secs: 86_400,
        max_tokens_per_identity: 5,
        daily_word_limit: 50,
        window_secs: 86_400,
        registry_sweep_secs: 3_600,
        limiter_sweep_secs: 14_400,
        token_issuer_tag: "test".to_string(),
        log_level: "error".to_string(),
    }
}

fn test_app() -> Router {
    build_router(Arc::new(AppState::new(test_config())))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn obtain_token(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"email":"{email}"}}"#)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    json["token"].as_str().unwrap().to_string()
}

async fn justify_request(
    app: &Router,
    token: Option<&str>,
    text: &str,
) -> axum::response::Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/justify")
        .header(header::CONTENT_TYPE, "text/plain");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    app.clone()
        .oneshot(builder.body(Body::from(text.to_string())).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_token_issuance() {
    let app = test_app();
    let token = obtain_token(&app, "a@b.com").await;
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

    let second = obtain_token(&app, "a@b.com").await;
    assert_ne!(token, second);
}

#[tokio::test]
async fn test_token_rejects_bad_email() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"not-an-email"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("validation_error"));
}

#[tokio::test]
async fn test_justify_happy_path() {
    let app = test_app();
    let token = obtain_token(&app, "a@b.com").await;

    let response = justify_request(&app, Some(&token), "Hello world").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["X-RateLimit-Remaining"],
        "48" // 50 - 2 words
    );

    let body = body_string(response).await;
    assert_eq!(body, format!("Hello{}world", " ".repeat(10)));
}

#[tokio::test]
async fn test_justify_without_token() {
    let app = test_app();
    let response = justify_request(&app, None, "Hello world").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("missing bearer token"));
}

#[tokio::test]
async fn test_justify_with_malformed_token() {
    let app = test_app();
    let response = justify_request(&app, Some("not-a-token"), "Hello world").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("malformed token"));
}

#[tokio::test]
async fn test_justify_with_unknown_token() {
    let app = test_app();
    let fabricated = "A".repeat(64);
    let response = justify_request(&app, Some(&fabricated), "Hello world").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("unknown token"));
}

#[tokio::test]
async fn test_justify_rejects_empty_body() {
    let app = test_app();
    let token = obtain_token(&app, "a@b.com").await;
    let response = justify_request(&app, Some(&token), "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quota_exhaustion_returns_402() {
    let app = test_app();
    let token = obtain_token(&app, "a@b.com").await;

    // 50-word budget: burn 48, then a 3-word request must be refused.
    let bulk = (0..48)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ");
    let response = justify_request(&app, Some(&token), &bulk).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = justify_request(&app, Some(&token), "one two three").await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_string(response).await;
    assert!(body.contains("quota_exceeded"));
    assert!(body.contains("\"limit\":50"));
    assert!(body.contains("current_usage"));

    // A smaller request still fits the remaining budget.
    let response = justify_request(&app, Some(&token), "one two").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sixth_token_evicts_oldest() {
    let app = test_app();
    let first = obtain_token(&app, "a@b.com").await;
    for _ in 0..5 {
        obtain_token(&app, "a@b.com").await;
    }

    let response = justify_request(&app, Some(&first), "Hello world").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("token revoked"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["tokens"]["active_tokens"].is_u64());
}

#[tokio::test]
async fn test_stats_reflect_activity() {
    let app = test_app();
    let token = obtain_token(&app, "a@b.com").await;
    obtain_token(&app, "c@d.com").await;
    let response = justify_request(&app, Some(&token), "some words to count here").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["tokens"]["active_tokens"], 2);
    assert_eq!(json["tokens"]["active_identities"], 2);
    assert_eq!(json["usage"]["words_in_window"], 5);
}
