use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("rate limited: {0}")]
    RateLimited(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // The voice demo front end only distinguishes ok / not ok
            AppError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        };

        let body = match &self {
            AppError::Upstream {
                message,
                details: Some(details),
            } => serde_json::json!({ "error": message, "details": details }),
            AppError::Upstream { message, .. } => serde_json::json!({ "error": message }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
