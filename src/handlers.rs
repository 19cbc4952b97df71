use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{ApiError, AuthErrorKind, Result};
use crate::health::HealthChecker;
use crate::justify::{justify, word_count};
use crate::rate_limiter::RateLimiter;
use crate::registry::TokenRegistry;
use crate::response::TokenResponse;
use crate::token::TokenIssuer;
use crate::validation::RequestValidator;

/// Shared application state
pub type SharedState = Arc<AppState>;

/// Explicitly constructed service objects; handlers receive them through
/// the axum state extractor rather than module-level singletons.
pub struct AppState {
    pub config: Config,
    pub issuer: TokenIssuer,
    pub registry: TokenRegistry,
    pub limiter: RateLimiter,
    pub health: HealthChecker,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let issuer = TokenIssuer::new(config.token_issuer_tag.clone());
        let registry = TokenRegistry::new(config.token_ttl_secs, config.max_tokens_per_identity);
        let limiter = RateLimiter::new(config.window_secs, config.daily_word_limit);
        let health = HealthChecker::new(registry.clone(), limiter.clone());
        Self {
            config,
            issuer,
            registry,
            limiter,
            health,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
}

/// Issue a bearer token for an email identity.
pub async fn issue_token(
    State(state): State<SharedState>,
    Json(payload): Json<TokenRequest>,
) -> Result<impl IntoResponse> {
    let email = payload.email.trim().to_string();
    RequestValidator::validate_email(&email)?;

    let token = state.issuer.issue(&email);
    state.registry.store(&token, &email)?;

    tracing::info!(target: "justifier::handlers", identity = %email, "issued token");
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// Justify a plain-text body against the caller's word quota.
pub async fn justify_text(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse> {
    let token = bearer_token(&headers)?;
    RequestValidator::validate_token_format(token)?;
    let identity = state.registry.retrieve(token)?;

    RequestValidator::validate_text(&body)?;
    let words = word_count(&body);

    let decision = state.limiter.consume_words(token, words)?;
    if !decision.allowed {
        tracing::warn!(
            target: "justifier::handlers",
            identity = %identity,
            words = words,
            current_usage = decision.current_usage,
            "word quota exceeded"
        );
        return Err(ApiError::QuotaExceeded {
            current_usage: decision.current_usage,
            limit: state.limiter.daily_limit(),
            reset_at: decision.reset_at,
        });
    }

    let justified = justify(&body, state.config.justify_width)?;

    let headers = [
        ("Content-Type", "text/plain; charset=utf-8".to_string()),
        ("X-RateLimit-Limit", state.limiter.daily_limit().to_string()),
        ("X-RateLimit-Remaining", decision.remaining_words.to_string()),
        ("X-RateLimit-Reset", decision.reset_at.to_string()),
    ];
    Ok((StatusCode::OK, headers, justified))
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    Ok(Json(state.health.check_health()?))
}

/// Aggregate counters for the registry and the limiter; read-only.
pub async fn service_stats(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    Ok(Json(state.health.stats()?))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::Auth(AuthErrorKind::Missing))?
        .to_str()
        .map_err(|_| ApiError::Auth(AuthErrorKind::Malformed))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Auth(AuthErrorKind::Malformed))
}
