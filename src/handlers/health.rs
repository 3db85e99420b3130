use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    calendar: bool,
    notifications: bool,
    voice: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        calendar: state.availability.has_calendar(),
        notifications: state.reservations.has_notifications(),
        voice: state.voice.is_some(),
    })
}
