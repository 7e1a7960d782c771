// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Applies verified identity events to the user store.
//!
//! - `user.created`: insert, then backfill the application ID into Clerk
//! - `user.updated`: partial update of the fields present in the event
//! - `user.deleted`: delete by provider ID
//! - anything else: acknowledged, nothing changes
//!
//! Only a failed create is reported as an error. Update, delete and backfill
//! failures are logged and acknowledged so Clerk doesn't keep redelivering.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{
    ApplicationUser, DeletedPayload, IdentityEvent, NewUser, PublicMetadata, UserPayload,
    UserUpdate,
};
use crate::services::clerk::ProviderMetadata;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

/// What a webhook delivery did.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Created(ApplicationUser),
    Updated(Option<ApplicationUser>),
    Deleted(Option<ApplicationUser>),
    Ignored { event_type: String },
}

impl SyncOutcome {
    /// The user record to report back, if any.
    pub fn user(&self) -> Option<&ApplicationUser> {
        match self {
            Self::Created(user) => Some(user),
            Self::Updated(user) | Self::Deleted(user) => user.as_ref(),
            Self::Ignored { .. } => None,
        }
    }
}

/// Acknowledgement body for handled event types.
#[derive(Serialize)]
struct SyncAck<'a> {
    message: &'static str,
    user: Option<&'a ApplicationUser>,
}

impl IntoResponse for SyncOutcome {
    fn into_response(self) -> Response {
        if let Self::Ignored { .. } = self {
            return StatusCode::OK.into_response();
        }

        let ack = SyncAck {
            message: "OK",
            user: self.user(),
        };
        (StatusCode::OK, Json(ack)).into_response()
    }
}

/// Event dispatcher over the user store and the provider metadata API.
#[derive(Clone)]
pub struct UserSyncService {
    users: Arc<dyn UserStore>,
    metadata: Arc<dyn ProviderMetadata>,
}

impl UserSyncService {
    pub fn new(users: Arc<dyn UserStore>, metadata: Arc<dyn ProviderMetadata>) -> Self {
        Self { users, metadata }
    }

    /// Apply one verified event.
    pub async fn handle(&self, event: IdentityEvent) -> Result<SyncOutcome> {
        match event {
            IdentityEvent::UserCreated(payload) => self.on_user_created(payload).await,
            IdentityEvent::UserUpdated(payload) => Ok(self.on_user_updated(payload).await),
            IdentityEvent::UserDeleted(payload) => self.on_user_deleted(payload).await,
            IdentityEvent::Other {
                event_type,
                object_id,
            } => {
                tracing::info!(
                    event_type = %event_type,
                    object_id = ?object_id,
                    "Ignoring unhandled event type"
                );
                Ok(SyncOutcome::Ignored { event_type })
            }
        }
    }

    async fn on_user_created(&self, payload: UserPayload) -> Result<SyncOutcome> {
        let draft = NewUser::from(&payload);

        let user = match self.users.create_user(draft).await {
            Ok(user) => {
                tracing::info!(
                    provider_id = %user.provider_id,
                    user_id = %user.id,
                    "User created"
                );
                user
            }
            Err(AppError::Conflict(_)) => {
                // Redelivery of an event we already applied: keep the
                // existing record and redo the backfill in case it failed.
                let existing = self
                    .users
                    .get_user_by_provider_id(&payload.id)
                    .await?
                    .ok_or_else(|| {
                        tracing::error!(
                            provider_id = %payload.id,
                            "User vanished between create conflict and lookup"
                        );
                        AppError::Database(format!("user {} changed during create", payload.id))
                    })?;
                tracing::info!(
                    provider_id = %existing.provider_id,
                    user_id = %existing.id,
                    "User already exists, treating user.created as redelivery"
                );
                existing
            }
            Err(e) => {
                tracing::error!(provider_id = %payload.id, error = %e, "Failed to create user");
                return Err(e);
            }
        };

        self.backfill_metadata(&user).await;

        Ok(SyncOutcome::Created(user))
    }

    async fn on_user_updated(&self, payload: UserPayload) -> SyncOutcome {
        let update = UserUpdate::from(&payload);
        if update.is_empty() {
            tracing::debug!(
                provider_id = %payload.id,
                "user.updated carries no profile fields, touching updated_at only"
            );
        }

        match self.users.update_user(&payload.id, &update).await {
            Ok(Some(user)) => {
                tracing::info!(
                    provider_id = %payload.id,
                    fields = ?update.field_paths(),
                    "User updated"
                );
                SyncOutcome::Updated(Some(user))
            }
            Ok(None) => {
                tracing::warn!(provider_id = %payload.id, "user.updated for unknown user");
                SyncOutcome::Updated(None)
            }
            Err(e) => {
                tracing::error!(provider_id = %payload.id, error = %e, "Failed to update user");
                SyncOutcome::Updated(None)
            }
        }
    }

    async fn on_user_deleted(&self, payload: DeletedPayload) -> Result<SyncOutcome> {
        let provider_id = payload
            .id
            .ok_or_else(|| AppError::InvalidPayload("user.deleted without user id".to_string()))?;

        let deleted = match self.users.delete_user(&provider_id).await {
            Ok(Some(user)) => {
                tracing::info!(provider_id = %provider_id, user_id = %user.id, "User deleted");
                Some(user)
            }
            Ok(None) => {
                tracing::info!(provider_id = %provider_id, "user.deleted for unknown user");
                None
            }
            Err(e) => {
                tracing::error!(provider_id = %provider_id, error = %e, "Failed to delete user");
                None
            }
        };

        Ok(SyncOutcome::Deleted(deleted))
    }

    /// Best effort: the local record stays even if this fails.
    async fn backfill_metadata(&self, user: &ApplicationUser) {
        let metadata = PublicMetadata {
            user_id: user.id.clone(),
        };

        match self
            .metadata
            .set_public_metadata(&user.provider_id, &metadata)
            .await
        {
            Ok(()) => tracing::debug!(
                provider_id = %user.provider_id,
                user_id = %user.id,
                "Public metadata backfilled"
            ),
            Err(e) => tracing::warn!(
                provider_id = %user.provider_id,
                user_id = %user.id,
                error = %e,
                "Failed to backfill public metadata"
            ),
        }
    }
}
