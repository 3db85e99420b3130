use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPEN_HOUR: u32 = 9;
pub const DEFAULT_CLOSE_HOUR: u32 = 18;
const HOURS_PER_DAY: u32 = 24;

/// Half-open `[start, end)` span of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Returns `None` unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// Opening hours of a business day, `close_hour` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open_hour: DEFAULT_OPEN_HOUR,
            close_hour: DEFAULT_CLOSE_HOUR,
        }
    }
}

impl BusinessHours {
    /// Hours past midnight are clamped to the end of the day.
    pub fn new(open_hour: u32, close_hour: u32) -> Self {
        Self {
            open_hour: open_hour.min(HOURS_PER_DAY),
            close_hour: close_hour.min(HOURS_PER_DAY),
        }
    }

    /// Starting hour of every slot; empty when the range is inverted.
    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.open_hour..self.close_hour.min(HOURS_PER_DAY)
    }
}

/// A bookable one-hour window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub hour: u32,
    pub interval: TimeInterval,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityPayload {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityResponse {
    pub slots: Vec<String>,
}

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp. Timestamps
/// are converted into the business timezone before taking the calendar day.
pub fn parse_request_date(raw: &str, tz: Tz) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&tz).date_naive())
}
