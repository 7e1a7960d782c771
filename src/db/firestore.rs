// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`UserStore`].
//!
//! Users live in the `users` collection with the Clerk user ID as the
//! document ID, so Firestore itself enforces one record per provider user.

use super::{collections, UserStore};
use crate::error::AppError;
use crate::models::{ApplicationUser, NewUser, UserUpdate};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any bearer token; hand it an unsigned one.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let client = firestore::FirestoreDb::with_options_token_source(
            firestore::FirestoreDbOptions::new(project_id.to_string()),
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Ok(Self { client })
    }
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn create_user(&self, user: NewUser) -> Result<ApplicationUser, AppError> {
        let user = ApplicationUser::from_new(user);

        let result = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.provider_id)
            .object(&user)
            .execute::<ApplicationUser>()
            .await;

        match result {
            Ok(created) => {
                tracing::debug!(
                    provider_id = %created.provider_id,
                    user_id = %created.id,
                    "User document inserted"
                );
                Ok(created)
            }
            Err(FirestoreError::DataConflictError(_)) => Err(AppError::Conflict(format!(
                "user {} already exists",
                user.provider_id
            ))),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn get_user_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<ApplicationUser>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(provider_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_user(
        &self,
        provider_id: &str,
        update: &UserUpdate,
    ) -> Result<Option<ApplicationUser>, AppError> {
        let Some(mut user) = self.get_user_by_provider_id(provider_id).await? else {
            return Ok(None);
        };
        update.apply_to(&mut user);

        // Only the present fields are written; `Exists` keeps a concurrent
        // delete from being undone by this write.
        let result = self
            .client
            .fluent()
            .update()
            .fields(update.field_paths())
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(provider_id)
            .object(&user)
            .execute::<ApplicationUser>()
            .await;

        match result {
            Ok(updated) => Ok(Some(updated)),
            Err(FirestoreError::DataNotFoundError(_)) => Ok(None),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn delete_user(&self, provider_id: &str) -> Result<Option<ApplicationUser>, AppError> {
        let Some(user) = self.get_user_by_provider_id(provider_id).await? else {
            return Ok(None);
        };

        self.client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(provider_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(user))
    }
}
