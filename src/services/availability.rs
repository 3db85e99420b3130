use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::models::BusinessHours;
use crate::services::calendar::CalendarProvider;
use crate::services::scheduling::{
    available_slots, business_day_window, default_slot_labels, slot_labels,
};

const DEFAULT_CALENDAR_TIMEOUT: Duration = Duration::from_secs(8);
const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(500);

/// Answers "which hours can still be booked on this day". Never fails: any
/// calendar problem degrades to offering the whole business day.
pub struct AvailabilityService {
    calendar: Option<Arc<dyn CalendarProvider>>,
    hours: BusinessHours,
    tz: Tz,
    timeout: Duration,
    fallback_delay: Duration,
}

impl AvailabilityService {
    pub fn new(calendar: Option<Arc<dyn CalendarProvider>>, hours: BusinessHours, tz: Tz) -> Self {
        Self {
            calendar,
            hours,
            tz,
            timeout: DEFAULT_CALENDAR_TIMEOUT,
            fallback_delay: DEFAULT_FALLBACK_DELAY,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pause applied when no calendar is configured, so clients always see
    /// their loading state.
    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    pub fn has_calendar(&self) -> bool {
        self.calendar.is_some()
    }

    pub async fn get_availability(&self, date: NaiveDate) -> Vec<String> {
        let Some(calendar) = &self.calendar else {
            tokio::time::sleep(self.fallback_delay).await;
            return default_slot_labels(self.hours);
        };

        let Some(window) = business_day_window(date, self.hours, self.tz) else {
            return Vec::new();
        };

        match tokio::time::timeout(self.timeout, calendar.busy_intervals(window)).await {
            Ok(Ok(busy)) => {
                let slots = slot_labels(&available_slots(date, self.tz, self.hours, &busy));
                tracing::info!(
                    %date,
                    busy = busy.len(),
                    available = slots.len(),
                    "computed availability"
                );
                slots
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, %date, "calendar query failed, offering default hours");
                default_slot_labels(self.hours)
            }
            Err(_) => {
                tracing::warn!(
                    %date,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "calendar query timed out, offering default hours"
                );
                default_slot_labels(self.hours)
            }
        }
    }
}
