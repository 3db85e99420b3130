pub mod retell;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// The provider answered with a non-success status. `details` is its
    /// response body when that body was JSON.
    #[error("provider rejected web call ({status})")]
    Rejected {
        status: u16,
        details: Option<serde_json::Value>,
    },

    #[error("provider unreachable: {0}")]
    Transport(String),
}

/// Issues short-lived access tokens for browser voice sessions.
#[async_trait]
pub trait VoiceSessionProvider: Send + Sync {
    /// Returns the provider's session payload untouched.
    async fn create_web_call(&self) -> Result<serde_json::Value, VoiceError>;
}
