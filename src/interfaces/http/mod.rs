//! HTTP surface: `GET /health` and `POST /predict`.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::AuthToken;
pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Assemble the application router. `api_key` guards `/predict` only.
pub fn build_router(state: Arc<AppState>, api_key: String) -> Router {
    let protected = Router::new()
        .route("/predict", post(routes::predict))
        .layer(middleware::from_fn(auth::require_auth))
        .layer(axum::Extension(AuthToken(api_key)));

    Router::new()
        .route("/health", get(routes::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
