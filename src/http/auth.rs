use axum::{
    body::Body,
    extract::{Query, State},
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::MojenxError;
use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Token presented by the caller: the bearer header first, then `?token=`.
pub fn presented_token<B>(request: &Request<B>) -> Option<String> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value))
        .filter(|token| !token.is_empty());

    if let Some(token) = header {
        return Some(token.to_string());
    }

    Query::<TokenQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|token| !token.is_empty())
}

/// Byte-for-byte comparison against the configured secret. An empty secret
/// never matches.
pub fn token_matches(expected: &str, presented: Option<&str>) -> bool {
    match presented {
        Some(token) => !expected.is_empty() && token.as_bytes() == expected.as_bytes(),
        None => false,
    }
}

pub async fn require_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = presented_token(&request);
    if token_matches(&state.token, presented.as_deref()) {
        return next.run(request).await;
    }

    tracing::warn!(
        request_id = %request_id(&request),
        method = %request.method(),
        path = %request.uri().path(),
        "rejected request with missing or invalid token"
    );
    ApiError(MojenxError::Auth).into_response()
}
