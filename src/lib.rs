// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Imaginify API: identity provider user sync
//!
//! This crate receives signed Clerk webhooks and mirrors the user lifecycle
//! (create, update, delete) into the application's own user store.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use services::{UserSyncService, WebhookVerifier};

/// Shared application state.
pub struct AppState {
    pub verifier: WebhookVerifier,
    pub sync: UserSyncService,
}
