// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use imaginify_api::config::Config;
use imaginify_api::db::{FirestoreDb, MemoryUserStore, UserStore};
use imaginify_api::error::AppError;
use imaginify_api::models::{ApplicationUser, NewUser, PublicMetadata, UserUpdate};
use imaginify_api::routes::create_router;
use imaginify_api::services::{ProviderMetadata, UserSyncService, WebhookVerifier};
use imaginify_api::AppState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Generate a unique provider ID for test isolation.
#[allow(dead_code)]
pub fn unique_provider_id() -> String {
    format!("user_test_{}", uuid::Uuid::new_v4().simple())
}

// ─── Recording collaborators ─────────────────────────────────

/// In-memory store that counts calls and can be told to fail.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryUserStore,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub updates: Mutex<Vec<(String, UserUpdate)>>,
    pub deleted_ids: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn total_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.update_calls.load(Ordering::SeqCst)
            + self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_fail(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for RecordingStore {
    async fn create_user(&self, user: NewUser) -> Result<ApplicationUser, AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        self.inner.create_user(user).await
    }

    async fn get_user_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<ApplicationUser>, AppError> {
        self.inner.get_user_by_provider_id(provider_id).await
    }

    async fn update_user(
        &self,
        provider_id: &str,
        update: &UserUpdate,
    ) -> Result<Option<ApplicationUser>, AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.updates
            .lock()
            .unwrap()
            .push((provider_id.to_string(), update.clone()));
        self.check_fail()?;
        self.inner.update_user(provider_id, update).await
    }

    async fn delete_user(&self, provider_id: &str) -> Result<Option<ApplicationUser>, AppError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.deleted_ids.lock().unwrap().push(provider_id.to_string());
        self.check_fail()?;
        self.inner.delete_user(provider_id).await
    }
}

/// Metadata API double that records every write.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingMetadata {
    pub writes: Mutex<Vec<(String, PublicMetadata)>>,
    pub fail: AtomicBool,
}

#[allow(dead_code)]
impl RecordingMetadata {
    pub fn writes(&self) -> Vec<(String, PublicMetadata)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderMetadata for RecordingMetadata {
    async fn set_public_metadata(
        &self,
        provider_id: &str,
        metadata: &PublicMetadata,
    ) -> Result<(), AppError> {
        self.writes
            .lock()
            .unwrap()
            .push((provider_id.to_string(), metadata.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::IdentityProvider("HTTP 500: injected".to_string()));
        }
        Ok(())
    }
}

// ─── App fixtures ────────────────────────────────────────────

/// Router plus handles on its collaborators.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub store: Arc<RecordingStore>,
    pub metadata: Arc<RecordingMetadata>,
    pub verifier: WebhookVerifier,
}

/// Create a test app with recording in-memory collaborators.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let verifier = WebhookVerifier::from_config(&config).expect("test secret is valid");
    let store = Arc::new(RecordingStore::default());
    let metadata = Arc::new(RecordingMetadata::default());
    let sync = UserSyncService::new(store.clone(), metadata.clone());

    let state = Arc::new(AppState {
        verifier: verifier.clone(),
        sync,
    });

    TestApp {
        router: create_router(state),
        store,
        metadata,
        verifier,
    }
}

/// Build a correctly signed webhook request for `event`.
#[allow(dead_code)]
pub fn signed_request(verifier: &WebhookVerifier, event: &serde_json::Value) -> Request<Body> {
    let body = serde_json::to_vec(event).unwrap();
    let msg_id = format!("msg_{}", uuid::Uuid::new_v4().simple());
    let timestamp = chrono::Utc::now().timestamp();
    let signature = verifier.sign(&msg_id, timestamp, &body);

    Request::builder()
        .method("POST")
        .uri("/api/webhooks/clerk")
        .header("content-type", "application/json")
        .header("svix-id", msg_id)
        .header("svix-timestamp", timestamp.to_string())
        .header("svix-signature", signature)
        .body(Body::from(body))
        .unwrap()
}

/// A `user.created` event with every optional field populated.
#[allow(dead_code)]
pub fn user_created_event(provider_id: &str) -> serde_json::Value {
    serde_json::json!({
        "object": "event",
        "type": "user.created",
        "data": {
            "id": provider_id,
            "object": "user",
            "email_addresses": [
                {"id": "idn_primary", "email_address": "ada@example.com"}
            ],
            "primary_email_address_id": "idn_primary",
            "username": "ada",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "image_url": "https://img.clerk.com/ada.png"
        }
    })
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
