use super::error::ApiError;
use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

/// Extension carrying the configured API key into the middleware.
#[derive(Clone)]
pub struct AuthToken(pub String);

/// Axum middleware: require `Authorization: Bearer <key>` when a key is configured.
///
/// An empty key leaves the route open.
pub async fn require_auth(request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthToken>()
        .map(|t| t.0.clone())
        .unwrap_or_default();

    if expected.is_empty() {
        return next.run(request).await;
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match check_bearer(header, &expected) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            warn!("Auth: rejected {} {}", request.method(), request.uri().path());
            err.into_response()
        }
    }
}

fn check_bearer(header: Option<&str>, expected: &str) -> Result<(), ApiError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Missing or invalid bearer token"))?;

    if constant_time_eq(token.trim().as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(ApiError::unauthorized("Invalid API token"))
    }
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
