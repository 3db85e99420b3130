use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::BookingRequest;

/// JSON body posted to the lead-notification webhook.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadNotification {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub business_name: String,
    pub industry: String,
    #[serde(rename = "type")]
    pub category: String,
    pub date_string: String,
    pub time_string: String,
    pub timestamp: String,
    pub event_id: Option<String>,
    pub booking_id: Uuid,
}

impl LeadNotification {
    pub fn new(
        request: &BookingRequest,
        booking_id: Uuid,
        event_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: request.contact_name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            business_name: request.business_name.clone(),
            industry: request.industry.clone(),
            category: request.category.as_str().to_string(),
            // e.g. "Tue Jun 10 2025"
            date_string: request.date.format("%a %b %d %Y").to_string(),
            time_string: request.slot_label.clone(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            event_id,
            booking_id,
        }
    }
}
