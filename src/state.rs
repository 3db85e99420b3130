use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::availability::AvailabilityService;
use crate::services::calendar::CalendarProvider;
use crate::services::notification::{NotificationRoutes, NotificationSink};
use crate::services::rate_limit::RateLimiter;
use crate::services::reservation::ReservationService;
use crate::services::voice::VoiceSessionProvider;

pub struct AppState {
    pub config: AppConfig,
    pub availability: AvailabilityService,
    pub reservations: ReservationService,
    pub voice: Option<Box<dyn VoiceSessionProvider>>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        calendar: Option<Arc<dyn CalendarProvider>>,
        notifier: Arc<dyn NotificationSink>,
        voice: Option<Box<dyn VoiceSessionProvider>>,
    ) -> Self {
        let availability =
            AvailabilityService::new(calendar.clone(), config.business_hours, config.timezone)
                .with_timeout(config.calendar_timeout);
        let routes = NotificationRoutes::new(
            config.webhook_url.clone(),
            config.website_webhook_url.clone(),
        );
        let reservations = ReservationService::new(calendar, notifier, routes, config.timezone);
        let rate_limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window);

        Self {
            config,
            availability,
            reservations,
            voice,
            rate_limiter,
        }
    }
}
