use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::services::voice::VoiceError;
use crate::state::AppState;

// POST /api/retell/create-web-call
pub async fn create_web_call(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Some(voice) = state.voice.as_ref() else {
        return Err(AppError::Config(
            "Retell API key or agent id missing in server configuration".to_string(),
        ));
    };

    voice.create_web_call().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "failed to create web call");
        let details = match e {
            VoiceError::Rejected { details, .. } => details,
            VoiceError::Transport(_) => None,
        };
        AppError::Upstream {
            message: "Failed to create web call".to_string(),
            details,
        }
    })
}
