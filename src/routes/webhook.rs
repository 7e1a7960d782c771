// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for Clerk user lifecycle events.

use crate::error::Result;
use crate::services::{SyncOutcome, WebhookEnvelope};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Router,
};
use std::sync::Arc;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/webhooks/clerk", post(handle_clerk_event))
}

/// Handle a Clerk webhook delivery (POST).
///
/// The body is taken as raw bytes: the signature covers the exact bytes
/// Svix sent, so it must be verified before any JSON parsing.
async fn handle_clerk_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<SyncOutcome> {
    let envelope = WebhookEnvelope::from_headers(&headers, body)?;
    let event = state.verifier.verify_event(&envelope)?;

    tracing::info!(
        svix_id = %envelope.id,
        event_type = %event.event_type(),
        "Webhook event verified"
    );

    state.sync.handle(event).await
}
