// SPDX-License-Identifier: MIT

//! ViewTube API Server
//!
//! Backend for a small video-sharing platform: user accounts with JWT
//! sessions, media updates through an external media host, and channel
//! subscription / watch-history queries over Firestore.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use viewtube_api::{
    config::Config,
    db::FirestoreStore,
    services::{ChannelService, HttpMediaHost, PasswordHasher, SessionManager, TokenIssuer},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting ViewTube API");

    // Initialize Firestore. Failure to reach the store at startup is fatal.
    let store = Arc::new(
        FirestoreStore::new(&config.gcp_project_id)
            .await
            .expect("Failed to connect to Firestore"),
    );

    let media = Arc::new(HttpMediaHost::new(&config));
    let tokens = TokenIssuer::new(&config);
    let sessions = SessionManager::new(
        store.clone(),
        media,
        PasswordHasher::new(),
        tokens.clone(),
    );
    let channels = ChannelService::new(store.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        tokens,
        sessions,
        channels,
    });

    // Build router
    let app = viewtube_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("viewtube_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
