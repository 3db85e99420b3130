use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{AvailabilityResponse, BookingPayload, BookingResponse};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The server refused the request itself, as opposed to failing to
    /// answer it.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if (400..500).contains(status))
    }
}

/// Backend calls made by the booking wizard.
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn availability(&self, date: NaiveDate) -> Result<Vec<String>, ApiError>;

    async fn book(&self, payload: &BookingPayload) -> Result<BookingResponse, ApiError>;
}

/// [`BookingApi`] over HTTP against this crate's server.
pub struct HttpBookingApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBookingApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let data: serde_json::Value = resp.json().await.unwrap_or_default();
            let message = data["error"]
                .as_str()
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
                .to_string();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        resp.json().await.map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn availability(&self, date: NaiveDate) -> Result<Vec<String>, ApiError> {
        let body = serde_json::json!({ "date": date.format("%Y-%m-%d").to_string() });
        let response: AvailabilityResponse = self.post("/api/availability", &body).await?;
        Ok(response.slots)
    }

    async fn book(&self, payload: &BookingPayload) -> Result<BookingResponse, ApiError> {
        self.post("/api/book", payload).await
    }
}
