use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::models::{BookingPayload, BookingResponse};
use crate::state::AppState;

use super::json_body;

// POST /api/book
pub async fn book(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookingPayload>, JsonRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let request = json_body(payload)?.into_request(state.config.timezone)?;

    tracing::info!(
        category = request.category.as_str(),
        date = %request.date,
        slot = %request.slot_label,
        "booking received"
    );

    let outcome = state.reservations.reserve(request).await;
    if let Some(warning) = outcome.warning {
        tracing::warn!(
            booking_id = %outcome.booking_id,
            warning = warning.as_str(),
            "booking accepted without calendar entry"
        );
    }

    Ok(Json(BookingResponse::from(&outcome)))
}
