use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tower::ServiceExt;

use luno_booking::config::AppConfig;
use luno_booking::models::{LeadNotification, TimeInterval};
use luno_booking::routes;
use luno_booking::services::availability::AvailabilityService;
use luno_booking::services::calendar::{CalendarEvent, CalendarProvider};
use luno_booking::services::notification::{NotificationRoutes, NotificationSink};
use luno_booking::services::rate_limit::RateLimiter;
use luno_booking::services::reservation::ReservationService;
use luno_booking::services::voice::{VoiceError, VoiceSessionProvider};
use luno_booking::state::AppState;

// ── Mock Providers ──

struct MockCalendar {
    busy: Vec<TimeInterval>,
    fail_insert: bool,
    inserted: mpsc::UnboundedSender<CalendarEvent>,
}

#[async_trait]
impl CalendarProvider for MockCalendar {
    async fn busy_intervals(&self, window: TimeInterval) -> anyhow::Result<Vec<TimeInterval>> {
        Ok(self
            .busy
            .iter()
            .copied()
            .filter(|b| b.overlaps(&window))
            .collect())
    }

    async fn insert_event(&self, event: &CalendarEvent) -> anyhow::Result<String> {
        if self.fail_insert {
            anyhow::bail!("calendar write refused");
        }
        let _ = self.inserted.send(event.clone());
        Ok("evt_test_1".to_string())
    }
}

struct MockSink {
    delivered: mpsc::UnboundedSender<(String, LeadNotification)>,
}

#[async_trait]
impl NotificationSink for MockSink {
    async fn deliver(&self, url: &str, notification: &LeadNotification) -> anyhow::Result<()> {
        let _ = self.delivered.send((url.to_string(), notification.clone()));
        Ok(())
    }
}

struct MockVoice;

#[async_trait]
impl VoiceSessionProvider for MockVoice {
    async fn create_web_call(&self) -> Result<serde_json::Value, VoiceError> {
        Ok(serde_json::json!({
            "access_token": "tok_abc",
            "call_id": "call_123",
        }))
    }
}

struct RejectingVoice;

#[async_trait]
impl VoiceSessionProvider for RejectingVoice {
    async fn create_web_call(&self) -> Result<serde_json::Value, VoiceError> {
        Err(VoiceError::Rejected {
            status: 401,
            details: Some(serde_json::json!({ "message": "invalid api key" })),
        })
    }
}

// ── Helpers ──

struct Harness {
    app: Router,
    events: mpsc::UnboundedReceiver<CalendarEvent>,
    leads: mpsc::UnboundedReceiver<(String, LeadNotification)>,
}

struct Options {
    busy: Vec<TimeInterval>,
    calendar: bool,
    fail_insert: bool,
    voice: Option<Box<dyn VoiceSessionProvider>>,
    rate_limit_max: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            busy: Vec::new(),
            calendar: true,
            fail_insert: false,
            voice: None,
            rate_limit_max: 100,
        }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        webhook_url: Some("https://hooks.example.com/leads".to_string()),
        website_webhook_url: Some("https://hooks.example.com/website".to_string()),
        ..AppConfig::default()
    }
}

fn harness(options: Options) -> Harness {
    let config = test_config();
    let (event_tx, events) = mpsc::unbounded_channel();
    let (lead_tx, leads) = mpsc::unbounded_channel();

    let calendar: Option<Arc<dyn CalendarProvider>> = options.calendar.then(|| {
        Arc::new(MockCalendar {
            busy: options.busy,
            fail_insert: options.fail_insert,
            inserted: event_tx,
        }) as Arc<dyn CalendarProvider>
    });

    let availability =
        AvailabilityService::new(calendar.clone(), config.business_hours, config.timezone)
            .with_fallback_delay(Duration::ZERO);
    let reservations = ReservationService::new(
        calendar,
        Arc::new(MockSink { delivered: lead_tx }),
        NotificationRoutes::new(config.webhook_url.clone(), config.website_webhook_url.clone()),
        config.timezone,
    );

    let state = Arc::new(AppState {
        rate_limiter: RateLimiter::new(options.rate_limit_max, Duration::from_secs(900)),
        config,
        availability,
        reservations,
        voice: options.voice,
    });

    Harness {
        app: routes::router(state),
        events,
        leads,
    }
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn booking_body(category: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "phone": "+15550001111",
        "businessName": "Analytical Engines",
        "industry": "Manufacturing",
        "date": "2025-06-10",
        "time": "2:00 PM",
        "type": category,
    })
}

// ── Health ──

#[tokio::test]
async fn test_health_reports_integrations() {
    let h = harness(Options::default());
    let resp = h
        .app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["calendar"], true);
    assert_eq!(json["notifications"], true);
    assert_eq!(json["voice"], false);
}

// ── Availability ──

#[tokio::test]
async fn test_availability_all_free() {
    let h = harness(Options::default());
    let resp = h
        .app
        .oneshot(post_json(
            "/api/availability",
            serde_json::json!({ "date": "2025-06-10" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let slots = json["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 9);
    assert_eq!(slots[0], "9:00 AM");
    assert_eq!(slots[8], "5:00 PM");
}

#[tokio::test]
async fn test_availability_excludes_busy_hour() {
    let busy = TimeInterval::new(utc("2025-06-10T14:00:00Z"), utc("2025-06-10T15:00:00Z")).unwrap();
    let h = harness(Options {
        busy: vec![busy],
        ..Options::default()
    });
    let resp = h
        .app
        .oneshot(post_json(
            "/api/availability",
            serde_json::json!({ "date": "2025-06-10T00:00:00Z" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(
        json["slots"],
        serde_json::json!([
            "9:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "1:00 PM", "3:00 PM", "4:00 PM",
            "5:00 PM"
        ])
    );
}

#[tokio::test]
async fn test_availability_without_calendar_uses_defaults() {
    let h = harness(Options {
        calendar: false,
        ..Options::default()
    });
    let resp = h
        .app
        .oneshot(post_json(
            "/api/availability",
            serde_json::json!({ "date": "2025-06-10" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["slots"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_availability_missing_date() {
    let h = harness(Options::default());
    let resp = h
        .app
        .oneshot(post_json("/api/availability", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_availability_unparsable_date() {
    let h = harness(Options::default());
    let resp = h
        .app
        .oneshot(post_json(
            "/api/availability",
            serde_json::json!({ "date": "next tuesday" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Booking ──

#[tokio::test]
async fn test_book_creates_event_and_notifies() {
    let mut h = harness(Options::default());
    let resp = h
        .app
        .oneshot(post_json("/api/book", booking_body("receptionist")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json, serde_json::json!({ "success": true }));

    let event = h.events.try_recv().unwrap();
    assert_eq!(event.summary, "Demo: Ada Lovelace (Analytical Engines)");
    assert_eq!(event.interval.start, utc("2025-06-10T14:00:00Z"));
    assert_eq!(event.interval.end, utc("2025-06-10T15:00:00Z"));

    let (url, lead) = tokio::time::timeout(Duration::from_secs(1), h.leads.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(url, "https://hooks.example.com/leads");
    assert_eq!(lead.name, "Ada Lovelace");
    assert_eq!(lead.time_string, "2:00 PM");
    assert_eq!(lead.event_id.as_deref(), Some("evt_test_1"));
}

#[tokio::test]
async fn test_book_website_lead_uses_website_hook() {
    let mut h = harness(Options::default());
    let resp = h
        .app
        .oneshot(post_json("/api/book", booking_body("website")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let event = h.events.try_recv().unwrap();
    assert!(event.summary.starts_with("Website: "));

    let (url, _) = tokio::time::timeout(Duration::from_secs(1), h.leads.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(url, "https://hooks.example.com/website");
}

#[tokio::test]
async fn test_book_succeeds_when_calendar_write_fails() {
    let mut h = harness(Options {
        fail_insert: true,
        ..Options::default()
    });
    let resp = h
        .app
        .oneshot(post_json("/api/book", booking_body("general")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["warning"], "calendar_write_failed");

    // The lead still goes out, without an event id
    let (_, lead) = tokio::time::timeout(Duration::from_secs(1), h.leads.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lead.event_id, None);
}

#[tokio::test]
async fn test_book_unparsable_time_skips_calendar() {
    let mut h = harness(Options::default());
    let mut body = booking_body("general");
    body["time"] = serde_json::json!("after lunch");

    let resp = h.app.oneshot(post_json("/api/book", body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["warning"], "unparsable_slot");
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn test_book_missing_field() {
    let h = harness(Options::default());
    let mut body = booking_body("general");
    body.as_object_mut().unwrap().remove("phone");

    let resp = h.app.oneshot(post_json("/api/book", body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().contains("phone"));
}

#[tokio::test]
async fn test_book_malformed_json() {
    let h = harness(Options::default());
    let req = Request::builder()
        .method("POST")
        .uri("/api/book")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let resp = h.app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["error"].is_string());
}

// ── Voice ──

#[tokio::test]
async fn test_web_call_not_configured() {
    let h = harness(Options::default());
    let resp = h
        .app
        .oneshot(post_json("/api/retell/create-web-call", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().contains("Retell"));
}

#[tokio::test]
async fn test_web_call_passthrough() {
    let h = harness(Options {
        voice: Some(Box::new(MockVoice)),
        ..Options::default()
    });
    let resp = h
        .app
        .oneshot(post_json("/api/retell/create-web-call", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["access_token"], "tok_abc");
    assert_eq!(json["call_id"], "call_123");
}

#[tokio::test]
async fn test_web_call_rejected_includes_details() {
    let h = harness(Options {
        voice: Some(Box::new(RejectingVoice)),
        ..Options::default()
    });
    let resp = h
        .app
        .oneshot(post_json("/api/retell/create-web-call", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "Failed to create web call");
    assert_eq!(json["details"]["message"], "invalid api key");
}

// ── Rate limiting ──

#[tokio::test]
async fn test_rate_limit_per_client() {
    let h = harness(Options {
        rate_limit_max: 1,
        ..Options::default()
    });

    let request = |forwarded: &str| {
        let mut req = post_json(
            "/api/availability",
            serde_json::json!({ "date": "2025-06-10" }),
        );
        req.headers_mut()
            .insert("x-forwarded-for", forwarded.parse().unwrap());
        req
    };

    let first = h.app.clone().oneshot(request("203.0.113.7")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = h.app.clone().oneshot(request("203.0.113.7")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(second).await;
    assert!(json["error"].is_string());

    let other = h.app.clone().oneshot(request("198.51.100.2")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);

    // Health is not rate limited
    let health = h
        .app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_ignores_client_supplied_hops() {
    let h = harness(Options {
        rate_limit_max: 1,
        ..Options::default()
    });

    let mut statuses = Vec::new();
    for i in 0..5 {
        let mut req = post_json(
            "/api/availability",
            serde_json::json!({ "date": "2025-06-10" }),
        );
        let forwarded = format!("10.9.9.{i}, 203.0.113.7");
        req.headers_mut()
            .insert("x-forwarded-for", forwarded.parse().unwrap());
        statuses.push(h.app.clone().oneshot(req).await.unwrap().status());
    }

    assert_eq!(statuses[0], StatusCode::OK);
    assert!(statuses[1..]
        .iter()
        .all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

// ── Security headers ──

#[tokio::test]
async fn test_security_headers_on_responses() {
    let h = harness(Options::default());
    let resp = h
        .app
        .oneshot(post_json(
            "/api/availability",
            serde_json::json!({ "date": "2025-06-10" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
}
