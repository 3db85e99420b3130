use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{BookingOutcome, BookingRequest, BookingWarning, LeadNotification, TimeInterval};
use crate::services::calendar::{CalendarEvent, CalendarProvider};
use crate::services::notification::{NotificationRoutes, NotificationSink};
use crate::services::scheduling::{parse_slot_label, slot_interval};

const SOURCE_MARKER: &str = "Booked via Luno Website.";

pub fn booking_event(request: &BookingRequest, interval: TimeInterval) -> CalendarEvent {
    CalendarEvent {
        summary: format!(
            "{}: {} ({})",
            request.category.event_prefix(),
            request.contact_name,
            request.business_name
        ),
        description: format!(
            "Client: {}\nEmail: {}\nPhone: {}\nBusiness: {}\nIndustry: {}\nType: {}\n\n{SOURCE_MARKER}",
            request.contact_name,
            request.email,
            request.phone,
            request.business_name,
            request.industry,
            request.category.as_str(),
        ),
        interval,
    }
}

/// Records a booking in the calendar and tells the automation webhook
/// about the lead. Each step is best effort; the booking itself always
/// succeeds once the request has been validated.
pub struct ReservationService {
    calendar: Option<Arc<dyn CalendarProvider>>,
    notifier: Arc<dyn NotificationSink>,
    routes: NotificationRoutes,
    tz: Tz,
}

impl ReservationService {
    pub fn new(
        calendar: Option<Arc<dyn CalendarProvider>>,
        notifier: Arc<dyn NotificationSink>,
        routes: NotificationRoutes,
        tz: Tz,
    ) -> Self {
        Self {
            calendar,
            notifier,
            routes,
            tz,
        }
    }

    pub fn has_notifications(&self) -> bool {
        !self.routes.is_empty()
    }

    pub async fn reserve(&self, request: BookingRequest) -> BookingOutcome {
        self.reserve_tracked(request).await.0
    }

    /// Like [`reserve`](Self::reserve) but also hands back the detached
    /// notification task, if one was started.
    pub async fn reserve_tracked(
        &self,
        request: BookingRequest,
    ) -> (BookingOutcome, Option<JoinHandle<()>>) {
        let booking_id = Uuid::new_v4();
        let mut calendar_event_id = None;
        let mut warning = None;

        if let Some(calendar) = &self.calendar {
            match self.slot_for(&request) {
                Ok(interval) => match calendar.insert_event(&booking_event(&request, interval)).await {
                    Ok(event_id) => {
                        tracing::info!(%booking_id, event_id = %event_id, "calendar event created");
                        calendar_event_id = Some(event_id);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, %booking_id, "failed to create calendar event");
                        warning = Some(BookingWarning::CalendarWriteFailed);
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        %booking_id,
                        slot = %request.slot_label,
                        "skipping calendar event for unusable slot"
                    );
                    warning = Some(BookingWarning::UnparsableSlot);
                }
            }
        }

        let notification = self.spawn_notification(&request, booking_id, calendar_event_id.clone());

        (
            BookingOutcome {
                success: true,
                booking_id,
                calendar_event_id,
                warning,
            },
            notification,
        )
    }

    fn slot_for(&self, request: &BookingRequest) -> anyhow::Result<TimeInterval> {
        let hour = parse_slot_label(&request.slot_label)?;
        slot_interval(request.date, hour, self.tz)
            .with_context(|| format!("{} does not exist on {}", request.slot_label, request.date))
    }

    fn spawn_notification(
        &self,
        request: &BookingRequest,
        booking_id: Uuid,
        event_id: Option<String>,
    ) -> Option<JoinHandle<()>> {
        let Some(url) = self.routes.target_for(request.category) else {
            tracing::debug!(
                category = request.category.as_str(),
                "no notification webhook configured"
            );
            return None;
        };

        let url = url.to_string();
        let notifier = Arc::clone(&self.notifier);
        let notification = LeadNotification::new(request, booking_id, event_id, Utc::now());
        let category = request.category.as_str();

        Some(tokio::spawn(async move {
            match notifier.deliver(&url, &notification).await {
                Ok(()) => tracing::info!(%booking_id, category, "lead notification sent"),
                Err(e) => {
                    tracing::warn!(error = %e, %booking_id, category, "lead notification failed")
                }
            }
        }))
    }
}
