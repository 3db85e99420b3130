use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::handlers;
use crate::state::AppState;

/// Full application: rate-limited JSON API, health check, and the built
/// single-page site with `index.html` as the fallback for client routes.
pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let spa = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .merge(api_routes(Arc::clone(&state)))
        .route("/health", get(handlers::health::health))
        .fallback_service(spa)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/availability",
            post(handlers::availability::get_availability),
        )
        .route("/api/book", post(handlers::booking::book))
        .route(
            "/api/retell/create-web-call",
            post(handlers::voice::create_web_call),
        )
        .route_layer(middleware::from_fn_with_state(state, rate_limit))
}

async fn rate_limit(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let client = client_ip(request.headers()).or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    });
    let client = client.unwrap_or_else(|| "unknown".to_string());

    if !state.rate_limiter.check(&client) {
        tracing::warn!(client = %client, "rate limit exceeded");
        return AppError::RateLimited("too many requests, please try again later".to_string())
            .into_response();
    }

    next.run(request).await
}

/// Address appended by the single trusted proxy, i.e. the last
/// `X-Forwarded-For` entry. Earlier entries come from the client.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}
