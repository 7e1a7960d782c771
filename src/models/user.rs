// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use crate::models::event::UserPayload;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Application user stored in Firestore (document ID is the provider ID).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationUser {
    /// Application user ID (UUID v4, generated on creation)
    pub id: String,
    /// Clerk user ID
    pub provider_id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Profile picture URL
    pub photo: String,
    /// When the user was first synced (RFC 3339)
    pub created_at: String,
    /// Last sync from the identity provider (RFC 3339)
    pub updated_at: String,
}

impl ApplicationUser {
    /// Materialize a draft with a fresh application ID.
    pub fn from_new(new: NewUser) -> Self {
        let now = now_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider_id: new.provider_id,
            email: new.email,
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            photo: new.photo,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Draft built from a `user.created` event.
///
/// Missing profile fields become empty strings, never null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub provider_id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub photo: String,
}

impl From<&UserPayload> for NewUser {
    fn from(payload: &UserPayload) -> Self {
        Self {
            provider_id: payload.id.clone(),
            email: payload.primary_email().unwrap_or_default().to_string(),
            username: payload.username.clone().unwrap_or_default(),
            first_name: payload.first_name.clone().unwrap_or_default(),
            last_name: payload.last_name.clone().unwrap_or_default(),
            photo: payload.image_url.clone().unwrap_or_default(),
        }
    }
}

/// Partial update built from a `user.updated` event.
///
/// `None` means "leave the stored value alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo: Option<String>,
}

impl From<&UserPayload> for UserUpdate {
    fn from(payload: &UserPayload) -> Self {
        Self {
            email: payload.primary_email().map(str::to_string),
            username: payload.username.clone(),
            first_name: payload.first_name.clone(),
            last_name: payload.last_name.clone(),
            photo: payload.image_url.clone(),
        }
    }
}

impl UserUpdate {
    /// True when the event carried no profile fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields().all(|(_, value)| value.is_none())
    }

    /// Stored field names this update writes, including `updated_at`.
    pub fn field_paths(&self) -> Vec<&'static str> {
        self.fields()
            .filter(|(_, value)| value.is_some())
            .map(|(name, _)| name)
            .chain(std::iter::once("updated_at"))
            .collect()
    }

    /// Overwrite the present fields on `user` and bump `updated_at`.
    pub fn apply_to(&self, user: &mut ApplicationUser) {
        let targets = [
            (&self.email, &mut user.email),
            (&self.username, &mut user.username),
            (&self.first_name, &mut user.first_name),
            (&self.last_name, &mut user.last_name),
            (&self.photo, &mut user.photo),
        ];
        for (value, target) in targets {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        user.updated_at = now_rfc3339();
    }

    fn fields(&self) -> impl Iterator<Item = (&'static str, &Option<String>)> {
        [
            ("email", &self.email),
            ("username", &self.username),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("photo", &self.photo),
        ]
        .into_iter()
    }
}

/// Public metadata written back to the Clerk user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMetadata {
    /// Application user ID
    #[serde(rename = "userId")]
    pub user_id: String,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> UserPayload {
        UserPayload {
            id: "user_1".to_string(),
            email_addresses: None,
            primary_email_address_id: None,
            username: None,
            first_name: None,
            last_name: None,
            image_url: None,
        }
    }

    #[test]
    fn test_new_user_defaults_to_empty_strings() {
        let draft = NewUser::from(&payload());
        assert_eq!(draft.provider_id, "user_1");
        assert_eq!(draft.email, "");
        assert_eq!(draft.username, "");
        assert_eq!(draft.photo, "");
    }

    #[test]
    fn test_update_only_username() {
        let update = UserUpdate::from(&UserPayload {
            username: Some("newname".to_string()),
            ..payload()
        });

        assert!(!update.is_empty());
        assert_eq!(update.field_paths(), vec!["username", "updated_at"]);

        let mut user = ApplicationUser::from_new(NewUser {
            provider_id: "user_1".to_string(),
            email: "a@example.com".to_string(),
            username: "old".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            photo: "https://img/1.png".to_string(),
        });
        let id = user.id.clone();
        update.apply_to(&mut user);

        assert_eq!(user.id, id);
        assert_eq!(user.username, "newname");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Lovelace");
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.photo, "https://img/1.png");
    }

    #[test]
    fn test_empty_update() {
        let update = UserUpdate::from(&payload());
        assert!(update.is_empty());
        assert_eq!(update.field_paths(), vec!["updated_at"]);
    }

    #[test]
    fn test_public_metadata_key() {
        let json = serde_json::to_value(PublicMetadata {
            user_id: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"userId": "abc"}));
    }
}
