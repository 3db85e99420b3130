use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::availability::parse_request_date;

/// Lead source; drives event naming and webhook routing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingCategory {
    Receptionist,
    Website,
    #[default]
    General,
}

impl BookingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingCategory::Receptionist => "receptionist",
            BookingCategory::Website => "website",
            BookingCategory::General => "general",
        }
    }

    /// Unknown values map to `General`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "receptionist" => BookingCategory::Receptionist,
            "website" => BookingCategory::Website,
            _ => BookingCategory::General,
        }
    }

    pub fn event_prefix(&self) -> &'static str {
        match self {
            BookingCategory::Website => "Website",
            BookingCategory::Receptionist | BookingCategory::General => "Demo",
        }
    }
}

/// Wire shape of `POST /api/book`. Every field is optional here so that a
/// missing value surfaces as a validation error rather than a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, rename = "type")]
    pub category: Option<String>,
}

/// A fully specified booking, validated at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub business_name: String,
    pub industry: String,
    pub date: NaiveDate,
    pub slot_label: String,
    pub category: BookingCategory,
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("missing required field: {field}")))
}

impl BookingPayload {
    pub fn into_request(self, tz: Tz) -> Result<BookingRequest, AppError> {
        let contact_name = required(self.name, "name")?;
        let email = required(self.email, "email")?;
        let phone = required(self.phone, "phone")?;
        let business_name = required(self.business_name, "businessName")?;
        let industry = required(self.industry, "industry")?;
        let raw_date = required(self.date, "date")?;
        let slot_label = required(self.time, "time")?;

        let date = parse_request_date(&raw_date, tz)
            .ok_or_else(|| AppError::Validation(format!("invalid date: {raw_date}")))?;

        Ok(BookingRequest {
            contact_name,
            email,
            phone,
            business_name,
            industry,
            date,
            slot_label,
            category: self
                .category
                .as_deref()
                .map(BookingCategory::parse)
                .unwrap_or_default(),
        })
    }
}

/// Why a booking was accepted without a calendar entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingWarning {
    UnparsableSlot,
    CalendarWriteFailed,
}

impl BookingWarning {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingWarning::UnparsableSlot => "unparsable_slot",
            BookingWarning::CalendarWriteFailed => "calendar_write_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingOutcome {
    pub success: bool,
    pub booking_id: Uuid,
    pub calendar_event_id: Option<String>,
    pub warning: Option<BookingWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<BookingWarning>,
}

impl From<&BookingOutcome> for BookingResponse {
    fn from(outcome: &BookingOutcome) -> Self {
        Self {
            success: outcome.success,
            warning: outcome.warning,
        }
    }
}
