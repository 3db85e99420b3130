use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::{VoiceError, VoiceSessionProvider};

const RETELL_CREATE_WEB_CALL: &str = "https://api.retellai.com/v2/create-web-call";

pub struct RetellProvider {
    api_key: String,
    agent_id: String,
    endpoint: String,
    client: reqwest::Client,
}

impl RetellProvider {
    pub fn new(api_key: String, agent_id: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            api_key,
            agent_id,
            endpoint: RETELL_CREATE_WEB_CALL.to_string(),
            client,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl VoiceSessionProvider for RetellProvider {
    async fn create_web_call(&self) -> Result<serde_json::Value, VoiceError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({ "agent_id": self.agent_id }))
            .send()
            .await
            .map_err(|e| VoiceError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| VoiceError::Transport(e.to_string()))?;
        let data: Option<serde_json::Value> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            return Err(VoiceError::Rejected {
                status: status.as_u16(),
                details: data,
            });
        }

        data.ok_or_else(|| VoiceError::Transport("provider returned non-JSON body".to_string()))
    }
}
