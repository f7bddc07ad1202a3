use std::sync::Arc;

use axum::{body::Body, extract::State, routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use tally_core::{
    config::Config,
    handler::WebhookHandler,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    store::RegistryStore,
};

use crate::TelegramMessenger;

/// Body returned for every webhook delivery. Telegram redelivers on anything
/// but a 2xx, so the webhook never reports failure.
pub const ACK: &str = "ok";
pub const HEALTH_TEXT: &str = "Test Bot is running!";
/// Largest update body read before the delivery is dropped (still acked).
pub const MAX_WEBHOOK_BODY: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<WebhookHandler>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health).post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn health() -> &'static str {
    HEALTH_TEXT
}

async fn webhook(State(state): State<Arc<AppState>>, body: Body) -> &'static str {
    // Read the body here rather than through `Bytes` so an oversized update
    // is acked instead of rejected with 413.
    let body = match axum::body::to_bytes(body, MAX_WEBHOOK_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("dropping webhook body: {e}");
            return ACK;
        }
    };
    let outcome = state.handler.handle_payload(&body).await;
    tracing::debug!(?outcome, "webhook handled");
    ACK
}

/// Wire the Telegram adapter around `store` and serve the webhook until
/// ctrl-c / SIGTERM.
pub async fn run_webhook(cfg: Arc<Config>, store: Arc<dyn RegistryStore>) -> anyhow::Result<()> {
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::from_config(&cfg)?);
    let messenger: Arc<dyn MessagingPort> = if cfg.throttle_enabled {
        Arc::new(ThrottledMessenger::new(
            raw_messenger,
            ThrottleConfig::default(),
        ))
    } else {
        raw_messenger
    };

    let handler = Arc::new(WebhookHandler::new(cfg.clone(), store, messenger));
    let app = build_router(AppState { handler });

    let addr = cfg.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("tally webhook listening on {addr}");
    if cfg.admin_id.is_none() {
        warn!("ADMIN_ID is not set; /status and /broadcast are disabled");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("tally webhook stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
