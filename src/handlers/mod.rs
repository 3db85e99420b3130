pub mod availability;
pub mod booking;
pub mod health;
pub mod voice;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::errors::AppError;

/// Unwraps a JSON body, turning axum's rejection into a `{error}` 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}
