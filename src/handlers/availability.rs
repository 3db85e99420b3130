use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::models::availability::parse_request_date;
use crate::models::{AvailabilityPayload, AvailabilityResponse};
use crate::state::AppState;

use super::json_body;

// POST /api/availability
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AvailabilityPayload>, JsonRejection>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let payload = json_body(payload)?;
    let raw = payload
        .date
        .ok_or_else(|| AppError::Validation("missing required field: date".to_string()))?;
    let date = parse_request_date(&raw, state.config.timezone)
        .ok_or_else(|| AppError::Validation(format!("invalid date: {raw}")))?;

    let slots = state.availability.get_availability(date).await;
    Ok(Json(AvailabilityResponse { slots }))
}
