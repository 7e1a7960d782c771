// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod clerk;
pub mod signature;
pub mod user_sync;

pub use clerk::{ClerkClient, ProviderMetadata};
pub use signature::{VerificationError, WebhookEnvelope, WebhookVerifier};
pub use user_sync::{SyncOutcome, UserSyncService};
