use super::error::ApiError;
use super::state::AppState;
use crate::domain::prediction::PredictionResult;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub ticker: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub bundle_dir: String,
    pub bundle_dir_exists: bool,
    pub time: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let dir = &state.bundle_dir;
    let resolved = std::fs::canonicalize(dir)
        .or_else(|_| std::path::absolute(dir))
        .unwrap_or_else(|_| dir.clone());

    Json(HealthResponse {
        ok: true,
        bundle_dir: resolved.display().to_string(),
        bundle_dir_exists: dir.is_dir(),
        time: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    })
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.body_text()))?;
    debug!("API: /predict ticker={:?}", request.ticker);

    let result = state.service.predict(&request.ticker).await?;
    Ok(Json(result))
}
