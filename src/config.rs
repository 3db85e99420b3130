use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;

use crate::models::BusinessHours;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub calendar_id: Option<String>,
    /// Raw service-account key JSON, from a file or inline.
    pub service_account_json: Option<String>,
    /// Receptionist and general leads.
    pub webhook_url: Option<String>,
    pub website_webhook_url: Option<String>,
    pub retell_api_key: Option<String>,
    pub retell_agent_id: Option<String>,
    pub timezone: Tz,
    pub business_hours: BusinessHours,
    pub calendar_timeout: Duration,
    pub static_dir: PathBuf,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            calendar_id: None,
            service_account_json: None,
            webhook_url: None,
            website_webhook_url: None,
            retell_api_key: None,
            retell_agent_id: None,
            timezone: chrono_tz::UTC,
            business_hours: BusinessHours::default(),
            calendar_timeout: Duration::from_secs(8),
            static_dir: PathBuf::from("dist"),
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(15 * 60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let key_file = env::var("GOOGLE_SERVICE_ACCOUNT_FILE")
            .unwrap_or_else(|_| "service_account.json".to_string());

        Self {
            port: parsed("PORT").unwrap_or(defaults.port),
            calendar_id: non_empty("GOOGLE_CALENDAR_ID"),
            service_account_json: load_service_account(Path::new(&key_file)),
            webhook_url: non_empty("N8N_WEBHOOK_URL"),
            website_webhook_url: non_empty("N8N_WEBSITE_WEBHOOK_URL"),
            retell_api_key: non_empty("RETELL_API_KEY"),
            retell_agent_id: non_empty("RETELL_AGENT_ID"),
            timezone: non_empty("BUSINESS_TIMEZONE")
                .and_then(|name| match name.parse::<Tz>() {
                    Ok(tz) => Some(tz),
                    Err(_) => {
                        tracing::warn!(timezone = %name, "unknown BUSINESS_TIMEZONE, using UTC");
                        None
                    }
                })
                .unwrap_or(defaults.timezone),
            business_hours: BusinessHours::new(
                parsed("BUSINESS_OPEN_HOUR").unwrap_or(defaults.business_hours.open_hour),
                parsed("BUSINESS_CLOSE_HOUR").unwrap_or(defaults.business_hours.close_hour),
            ),
            calendar_timeout: parsed("CALENDAR_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.calendar_timeout),
            static_dir: non_empty("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            rate_limit_max: parsed("RATE_LIMIT_MAX").unwrap_or(defaults.rate_limit_max),
            rate_limit_window: parsed("RATE_LIMIT_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
        }
    }

    pub fn voice_configured(&self) -> bool {
        self.retell_api_key.is_some() && self.retell_agent_id.is_some()
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// A key file on disk wins over `GOOGLE_SERVICE_ACCOUNT_JSON`.
fn load_service_account(path: &Path) -> Option<String> {
    if path.exists() {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                tracing::info!(path = %path.display(), "loaded service account key from file");
                return Some(json);
            }
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "failed to read service account key file");
            }
        }
    }

    let inline = non_empty("GOOGLE_SERVICE_ACCOUNT_JSON");
    if inline.is_some() {
        tracing::info!("loaded service account key from environment");
    }
    inline
}
