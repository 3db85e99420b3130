//! Google Calendar v3 over REST, authenticated as a service account.
//!
//! Access tokens come from yup-oauth2's service-account flow, which signs
//! the JWT assertion, exchanges it and caches the result. Calendar calls
//! themselves are plain reqwest requests with that bearer token.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use super::{CalendarEvent, CalendarProvider};
use crate::models::TimeInterval;

const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Supplies bearer tokens for calendar requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> anyhow::Result<String>;
}

/// Service-account tokens, refreshed by yup-oauth2 before they expire.
pub struct ServiceAccountTokens {
    auth: DefaultAuthenticator,
}

impl ServiceAccountTokens {
    pub async fn new(key: ServiceAccountKey) -> anyhow::Result<Self> {
        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("failed to set up service account authenticator")?;
        Ok(Self { auth })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> anyhow::Result<String> {
        let token = self
            .auth
            .token(&[CALENDAR_SCOPE])
            .await
            .context("failed to obtain Google access token")?;
        token
            .token()
            .map(str::to_string)
            .context("Google returned an empty access token")
    }
}

pub fn parse_key(key_json: &str) -> anyhow::Result<ServiceAccountKey> {
    yup_oauth2::parse_service_account_key(key_json).context("invalid service account key JSON")
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<BusyPeriod>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BusyPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct InsertedEvent {
    id: String,
}

pub struct GoogleCalendarProvider {
    calendar_id: String,
    service_account_email: String,
    api_base: String,
    client: reqwest::Client,
    tokens: Box<dyn TokenSource>,
}

impl GoogleCalendarProvider {
    pub fn new(
        calendar_id: String,
        service_account_email: String,
        tokens: Box<dyn TokenSource>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            calendar_id,
            service_account_email,
            api_base: CALENDAR_API.to_string(),
            client,
            tokens,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn service_account_email(&self) -> &str {
        &self.service_account_email
    }

    /// Authenticates and makes sure the service account can see the
    /// calendar, subscribing it to the calendar list if it cannot.
    pub async fn connect(calendar_id: String, key_json: &str) -> anyhow::Result<Self> {
        let key = parse_key(key_json)?;
        let email = key.client_email.clone();
        tracing::info!(service_account = %email, "authenticating with Google");

        let tokens = ServiceAccountTokens::new(key).await?;
        let provider = Self::new(calendar_id, email, Box::new(tokens));
        provider.verify_access().await?;
        Ok(provider)
    }

    async fn verify_access(&self) -> anyhow::Result<()> {
        let url = self.url(&["calendars", &self.calendar_id])?;
        let direct: anyhow::Result<serde_json::Value> =
            self.send(self.client.get(url), "calendars.get").await;

        match direct {
            Ok(_) => {
                tracing::info!(calendar_id = %self.calendar_id, "connected to calendar");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "initial calendar access failed, adding calendar to service account list"
                );
                let url = self.url(&["users", "me", "calendarList"])?;
                let _: serde_json::Value = self
                    .send(
                        self.client.post(url).json(&json!({ "id": self.calendar_id })),
                        "calendarList.insert",
                    )
                    .await
                    .with_context(|| {
                        format!(
                            "could not access calendar {}; share it with {} and grant \"Make changes to events\"",
                            self.calendar_id, self.service_account_email
                        )
                    })?;
                tracing::info!(calendar_id = %self.calendar_id, "calendar added to service account list");
                Ok(())
            }
        }
    }

    fn url(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.api_base).context("invalid calendar API base URL")?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| anyhow::anyhow!("calendar API base URL cannot have a path"))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> anyhow::Result<T> {
        let token = self.tokens.access_token().await?;
        let resp = request
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("failed to call Google Calendar {operation}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Google Calendar {operation} error ({status}): {body}");
        }

        resp.json()
            .await
            .with_context(|| format!("failed to parse Google Calendar {operation} response"))
    }
}

fn busy_from_response(
    calendar_id: &str,
    response: FreeBusyResponse,
) -> anyhow::Result<Vec<TimeInterval>> {
    let calendar = response
        .calendars
        .get(calendar_id)
        .ok_or_else(|| anyhow::anyhow!("free/busy response has no entry for {calendar_id}"))?;

    if !calendar.errors.is_empty() {
        anyhow::bail!(
            "free/busy reported errors for {calendar_id}: {}",
            serde_json::Value::Array(calendar.errors.clone())
        );
    }

    let mut busy: Vec<TimeInterval> = calendar
        .busy
        .iter()
        .filter_map(|period| {
            let interval = TimeInterval::new(period.start, period.end);
            if interval.is_none() {
                tracing::debug!(?period, "skipping empty busy period");
            }
            interval
        })
        .collect();
    busy.sort_by_key(|b| b.start);
    Ok(busy)
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    async fn busy_intervals(&self, window: TimeInterval) -> anyhow::Result<Vec<TimeInterval>> {
        let body = json!({
            "timeMin": window.start.to_rfc3339(),
            "timeMax": window.end.to_rfc3339(),
            "items": [{ "id": self.calendar_id }],
        });
        let url = self.url(&["freeBusy"])?;
        let response: FreeBusyResponse = self
            .send(self.client.post(url).json(&body), "freebusy.query")
            .await?;
        busy_from_response(&self.calendar_id, response)
    }

    async fn insert_event(&self, event: &CalendarEvent) -> anyhow::Result<String> {
        let body = json!({
            "summary": event.summary,
            "description": event.description,
            "start": { "dateTime": event.interval.start.to_rfc3339() },
            "end": { "dateTime": event.interval.end.to_rfc3339() },
        });
        let url = self.url(&["calendars", &self.calendar_id, "events"])?;
        let inserted: InsertedEvent = self
            .send(self.client.post(url).json(&body), "events.insert")
            .await?;
        Ok(inserted.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SERVICE_ACCOUNT: &str = "booking@project.iam.gserviceaccount.com";

    struct StaticToken(&'static str);

    #[async_trait]
    impl TokenSource for StaticToken {
        async fn access_token(&self) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn provider(calendar_id: &str, api_base: &str) -> GoogleCalendarProvider {
        GoogleCalendarProvider::new(
            calendar_id.to_string(),
            SERVICE_ACCOUNT.to_string(),
            Box::new(StaticToken("test-token")),
        )
        .with_api_base(api_base)
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_key() {
        let key = parse_key(
            r#"{"type":"service_account","client_email":"a@b.iam.gserviceaccount.com","private_key":"pem","token_uri":"https://oauth2.googleapis.com/token"}"#,
        )
        .unwrap();
        assert_eq!(key.client_email, "a@b.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_parse_key_missing_email() {
        assert!(parse_key(r#"{"private_key":"pem","token_uri":"https://x"}"#).is_err());
        assert!(parse_key("not json").is_err());
    }

    #[test]
    fn test_url_escapes_calendar_id() {
        let provider = provider("x", CALENDAR_API);
        let url = provider
            .url(&["calendars", "en.usa#holiday@group.v.calendar.google.com", "events"])
            .unwrap();
        assert!(url
            .as_str()
            .starts_with("https://www.googleapis.com/calendar/v3/calendars/en.usa%23holiday"));
        assert!(url.as_str().ends_with("/events"));
    }

    #[test]
    fn test_busy_from_response_sorts_and_skips_empty() {
        let response: FreeBusyResponse = serde_json::from_value(json!({
            "calendars": {
                "cal": {
                    "busy": [
                        {"start": "2025-06-10T15:00:00Z", "end": "2025-06-10T16:00:00Z"},
                        {"start": "2025-06-10T10:00:00+02:00", "end": "2025-06-10T11:00:00+02:00"},
                        {"start": "2025-06-10T12:00:00Z", "end": "2025-06-10T12:00:00Z"}
                    ]
                }
            }
        }))
        .unwrap();
        let busy = busy_from_response("cal", response).unwrap();
        assert_eq!(busy.len(), 2);
        assert_eq!(busy[0].start, utc("2025-06-10T08:00:00Z"));
        assert_eq!(busy[1].start, utc("2025-06-10T15:00:00Z"));
    }

    #[test]
    fn test_busy_from_response_calendar_errors() {
        let response: FreeBusyResponse = serde_json::from_value(json!({
            "calendars": { "cal": { "errors": [{"domain": "global", "reason": "notFound"}] } }
        }))
        .unwrap();
        assert!(busy_from_response("cal", response).is_err());

        let response: FreeBusyResponse =
            serde_json::from_value(json!({ "calendars": {} })).unwrap();
        assert!(busy_from_response("cal", response).is_err());
    }

    #[tokio::test]
    async fn test_busy_intervals_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/freeBusy"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({ "items": [{ "id": "primary" }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "calendars": {
                    "primary": {
                        "busy": [{"start": "2025-06-10T14:00:00Z", "end": "2025-06-10T15:00:00Z"}]
                    }
                }
            })))
            .mount(&server)
            .await;

        let provider = provider("primary", &server.uri());
        let window =
            TimeInterval::new(utc("2025-06-10T09:00:00Z"), utc("2025-06-10T18:00:00Z")).unwrap();
        let busy = provider.busy_intervals(window).await.unwrap();
        assert_eq!(
            busy,
            vec![TimeInterval::new(utc("2025-06-10T14:00:00Z"), utc("2025-06-10T15:00:00Z")).unwrap()]
        );
    }

    #[tokio::test]
    async fn test_insert_event_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .and(body_partial_json(json!({ "summary": "Demo: Ada (Engines)" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt_123" })))
            .mount(&server)
            .await;

        let provider = provider("primary", &server.uri());
        let event = CalendarEvent {
            summary: "Demo: Ada (Engines)".to_string(),
            description: "Client: Ada".to_string(),
            interval: TimeInterval::new(utc("2025-06-10T09:00:00Z"), utc("2025-06-10T10:00:00Z"))
                .unwrap(),
        };
        assert_eq!(provider.insert_event(&event).await.unwrap(), "evt_123");
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/freeBusy"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let provider = provider("primary", &server.uri());
        let window =
            TimeInterval::new(utc("2025-06-10T09:00:00Z"), utc("2025-06-10T18:00:00Z")).unwrap();
        let err = provider.busy_intervals(window).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_verify_access_direct() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/agency@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "agency@example.com" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        provider("agency@example.com", &server.uri())
            .verify_access()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_verify_access_subscribes_when_not_visible() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/agency@example.com"))
            .respond_with(ResponseTemplate::new(404).set_body_string("notFound"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/me/calendarList"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({ "id": "agency@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "agency@example.com" })))
            .expect(1)
            .mount(&server)
            .await;

        provider("agency@example.com", &server.uri())
            .verify_access()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_verify_access_failure_names_service_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/agency@example.com"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = provider("agency@example.com", &server.uri())
            .verify_access()
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains(SERVICE_ACCOUNT));
        assert!(message.contains("agency@example.com"));
        assert!(format!("{err:#}").contains("403"));
    }
}
