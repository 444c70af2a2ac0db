// Tracker Tokens Gateway - HTTP entry point
// Exposes the ledger, engagement, notification, and breach-check surfaces

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracker_core::{
    AccountStore, BreachGateway, BreachProvider, Config, Engagement, HttpRangeProvider, Ledger,
    NotificationCenter,
};

mod error;
mod handlers;
mod metrics;
mod models;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
    pub engagement: Engagement,
    pub notifications: NotificationCenter,
    pub breach: BreachGateway,
}

impl AppState {
    pub fn new(config: &Config, provider: Arc<dyn BreachProvider>) -> Self {
        let store = AccountStore::new();
        let ledger = Ledger::new(store.clone(), &config.earning);
        let notifications = NotificationCenter::new(store.clone());
        let engagement = Engagement::new(store.clone(), notifications.clone(), &config.earning);
        let breach = BreachGateway::new(provider, store, notifications.clone(), &config.breach);

        Self {
            ledger,
            engagement,
            notifications,
            breach,
        }
    }
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_export))
        .route(
            "/tokens",
            get(handlers::list_tokens).post(handlers::create_token_transaction),
        )
        .route(
            "/trackers",
            get(handlers::list_sites).post(handlers::record_trackers),
        )
        .route(
            "/notifications",
            get(handlers::list_notifications)
                .post(handlers::create_notification)
                .put(handlers::update_notification),
        )
        .route(
            "/breach-check",
            get(handlers::breach_check).post(handlers::breach_check_and_notify),
        )
        .route(
            "/users",
            get(handlers::get_user)
                .post(handlers::register_user)
                .put(handlers::update_user),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("Starting Tracker Tokens gateway");

    // Config file path as first argument, environment overrides otherwise
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let provider = Arc::new(HttpRangeProvider::new(&config.breach)?);
    let state = AppState::new(&config, provider);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.http_listen_addr).await?;
    info!("Gateway listening on {}", config.http_listen_addr);
    info!("   GET/POST /tokens        - ledger queries and appends");
    info!("   GET/POST /trackers      - site visits and blocked trackers");
    info!("   GET/POST/PUT /notifications");
    info!("   GET/POST /breach-check  - k-anonymity breach lookups");
    info!("   GET/POST/PUT /users");

    axum::serve(listener, app).await?;

    Ok(())
}
