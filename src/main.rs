// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Imaginify API Server
//!
//! Receives Clerk webhooks and keeps the application's user records in sync
//! with the identity provider.

use imaginify_api::{
    config::Config,
    db::FirestoreDb,
    services::{ClerkClient, UserSyncService, WebhookVerifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment; a missing secret is fatal here,
    // before the listener is bound.
    let config = Config::from_env().expect("Failed to load configuration");
    let verifier = WebhookVerifier::from_config(&config).expect("Invalid WEBHOOK_SECRET");
    tracing::info!(port = config.port, "Starting Imaginify API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize Clerk client for metadata backfill
    let clerk = ClerkClient::from_config(&config).expect("Failed to initialize Clerk client");
    tracing::info!(api_url = %config.clerk_api_url, "Clerk client initialized");

    let sync = UserSyncService::new(Arc::new(db), Arc::new(clerk));

    // Build shared state
    let state = Arc::new(AppState { verifier, sync });

    // Build router
    let app = imaginify_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("imaginify_api=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
