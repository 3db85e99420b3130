use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use luno_booking::config::AppConfig;
use luno_booking::routes;
use luno_booking::services::calendar::connect_calendar;
use luno_booking::services::notification::webhook::WebhookNotifier;
use luno_booking::services::voice::retell::RetellProvider;
use luno_booking::services::voice::VoiceSessionProvider;
use luno_booking::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let calendar = connect_calendar(&config).await;

    let voice: Option<Box<dyn VoiceSessionProvider>> =
        match (&config.retell_api_key, &config.retell_agent_id) {
            (Some(key), Some(agent)) => {
                tracing::info!(agent_id = %agent, "voice demo enabled");
                Some(Box::new(RetellProvider::new(key.clone(), agent.clone())))
            }
            _ => {
                tracing::warn!("RETELL_API_KEY or RETELL_AGENT_ID missing, voice demo disabled");
                None
            }
        };

    if config.webhook_url.is_none() && config.website_webhook_url.is_none() {
        tracing::warn!("no N8N webhook configured, lead notifications disabled");
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        calendar,
        Arc::new(WebhookNotifier::new()),
        voice,
    ));

    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}, is another server already using port {}?", config.port))?;
    tracing::info!("starting server on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
