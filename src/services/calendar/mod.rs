pub mod google;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::models::TimeInterval;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub interval: TimeInterval,
}

/// Upstream calendar holding the agency's appointments.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Occupied intervals intersecting `window`.
    async fn busy_intervals(&self, window: TimeInterval) -> anyhow::Result<Vec<TimeInterval>>;

    /// Creates the event and returns its provider id.
    async fn insert_event(&self, event: &CalendarEvent) -> anyhow::Result<String>;
}

/// Builds the Google provider from configuration. Any missing setting or
/// failed access check disables calendar features instead of failing startup.
pub async fn connect_calendar(config: &AppConfig) -> Option<Arc<dyn CalendarProvider>> {
    let Some(key_json) = config.service_account_json.as_deref() else {
        tracing::warn!("no service account key found, calendar features disabled");
        return None;
    };
    let Some(calendar_id) = config.calendar_id.clone() else {
        tracing::warn!("GOOGLE_CALENDAR_ID is not set, calendar features disabled");
        return None;
    };

    match google::GoogleCalendarProvider::connect(calendar_id, key_json).await {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "calendar unavailable, calendar features disabled");
            None
        }
    }
}
