pub mod webhook;

use async_trait::async_trait;

use crate::models::{BookingCategory, LeadNotification};

/// Fire-and-forget receiver of new-lead notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, url: &str, notification: &LeadNotification) -> anyhow::Result<()>;
}

/// Webhook URL per booking category. Receptionist and general leads share
/// the primary URL; website leads use their own URL when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationRoutes {
    primary: Option<String>,
    website: Option<String>,
}

impl NotificationRoutes {
    /// Values that do not look like HTTP URLs are treated as unset.
    pub fn new(primary: Option<String>, website: Option<String>) -> Self {
        let usable = |url: Option<String>| url.filter(|u| u.starts_with("http"));
        Self {
            primary: usable(primary),
            website: usable(website),
        }
    }

    pub fn target_for(&self, category: BookingCategory) -> Option<&str> {
        match category {
            BookingCategory::Website => self.website.as_deref().or(self.primary.as_deref()),
            BookingCategory::Receptionist | BookingCategory::General => self.primary.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.website.is_none()
    }
}
