// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User store: Firestore in production, in-memory for tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryUserStore;

use crate::error::AppError;
use crate::models::{ApplicationUser, NewUser, UserUpdate};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Application users (keyed by provider user ID)
    pub const USERS: &str = "users";
}

/// Persistent store for application users.
///
/// There is at most one user per provider ID; every operation is keyed by it.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user from a draft.
    ///
    /// Returns `AppError::Conflict` if a user with the same provider ID
    /// already exists; the existing record is left untouched.
    async fn create_user(&self, user: NewUser) -> Result<ApplicationUser, AppError>;

    /// Look up a user by provider ID.
    async fn get_user_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<ApplicationUser>, AppError>;

    /// Apply a partial update. `Ok(None)` if there is no such user.
    async fn update_user(
        &self,
        provider_id: &str,
        update: &UserUpdate,
    ) -> Result<Option<ApplicationUser>, AppError>;

    /// Delete a user, returning the removed record. `Ok(None)` if absent.
    async fn delete_user(&self, provider_id: &str) -> Result<Option<ApplicationUser>, AppError>;
}
