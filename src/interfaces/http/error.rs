use crate::domain::errors::{ErrorCategory, PredictionError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

/// Error response for the HTTP API. Serialized as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.detail)
    }
}

impl std::error::Error for ApiError {}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        match e.category() {
            ErrorCategory::BundleUnavailable => {
                warn!("API: bundle unavailable: {}", e);
                Self::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            ErrorCategory::BadRequest => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            ErrorCategory::Internal => {
                error!("API: prediction failed: {}", e);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Inference error: {}", e),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "detail": self.detail });
        (self.status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_mapping() {
        let missing = ApiError::from(PredictionError::BundleNotFound {
            ticker: "AAPL".to_string(),
            missing: vec![PathBuf::from("bundles/AAPL_meta.json")],
        });
        assert_eq!(missing.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(missing.detail().starts_with("Missing bundle files for AAPL"));

        let no_data = ApiError::from(PredictionError::NoData {
            ticker: "ZZZZ".to_string(),
        });
        assert_eq!(no_data.status(), StatusCode::BAD_REQUEST);

        let model = ApiError::from(PredictionError::Model("bad shape".to_string()));
        assert_eq!(model.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(model.detail(), "Inference error: Model error: bad shape");
    }
}
