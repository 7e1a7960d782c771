// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory user store.

use super::UserStore;
use crate::error::AppError;
use crate::models::{ApplicationUser, NewUser, UserUpdate};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// User store backed by a concurrent map keyed by provider ID.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, ApplicationUser>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<ApplicationUser, AppError> {
        match self.users.entry(user.provider_id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "user {} already exists",
                user.provider_id
            ))),
            Entry::Vacant(slot) => {
                let created = ApplicationUser::from_new(user);
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn get_user_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<ApplicationUser>, AppError> {
        Ok(self.users.get(provider_id).map(|user| user.value().clone()))
    }

    async fn update_user(
        &self,
        provider_id: &str,
        update: &UserUpdate,
    ) -> Result<Option<ApplicationUser>, AppError> {
        Ok(self.users.get_mut(provider_id).map(|mut user| {
            update.apply_to(user.value_mut());
            user.value().clone()
        }))
    }

    async fn delete_user(&self, provider_id: &str) -> Result<Option<ApplicationUser>, AppError> {
        Ok(self.users.remove(provider_id).map(|(_, user)| user))
    }
}
