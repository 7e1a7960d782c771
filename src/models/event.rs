// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clerk webhook event payloads.
//!
//! Clerk sends `{"type": "...", "data": {...}, "object": "event", ...}`.
//! The `data` shape depends on `type`, so we read the envelope first and
//! then decode `data` into the variant for that type.

use crate::error::AppError;
use serde::Deserialize;

/// Envelope fields we need before knowing the payload type.
#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// A verified identity provider event.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityEvent {
    UserCreated(UserPayload),
    UserUpdated(UserPayload),
    UserDeleted(DeletedPayload),
    /// Any event type we don't act on (sessions, organizations, ...).
    Other {
        event_type: String,
        object_id: Option<String>,
    },
}

impl IdentityEvent {
    pub const USER_CREATED: &'static str = "user.created";
    pub const USER_UPDATED: &'static str = "user.updated";
    pub const USER_DELETED: &'static str = "user.deleted";

    /// Parse an event from the raw (already verified) request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, AppError> {
        let raw: RawEvent = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidPayload(format!("malformed event: {e}")))?;

        let event = match raw.event_type.as_str() {
            Self::USER_CREATED => Self::UserCreated(decode_data(&raw.event_type, raw.data)?),
            Self::USER_UPDATED => Self::UserUpdated(decode_data(&raw.event_type, raw.data)?),
            Self::USER_DELETED => Self::UserDeleted(decode_data(&raw.event_type, raw.data)?),
            _ => Self::Other {
                object_id: raw
                    .data
                    .get("id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                event_type: raw.event_type,
            },
        };

        Ok(event)
    }

    /// The Clerk event type string.
    pub fn event_type(&self) -> &str {
        match self {
            Self::UserCreated(_) => Self::USER_CREATED,
            Self::UserUpdated(_) => Self::USER_UPDATED,
            Self::UserDeleted(_) => Self::USER_DELETED,
            Self::Other { event_type, .. } => event_type,
        }
    }
}

fn decode_data<T: for<'de> Deserialize<'de>>(
    event_type: &str,
    data: serde_json::Value,
) -> Result<T, AppError> {
    serde_json::from_value(data)
        .map_err(|e| AppError::InvalidPayload(format!("{event_type}: {e}")))
}

/// User object carried by `user.created` and `user.updated`.
///
/// Every profile field is optional; `null` and a missing key are treated
/// the same way.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserPayload {
    /// Clerk user ID (`user_...`)
    pub id: String,
    #[serde(default)]
    pub email_addresses: Option<Vec<EmailAddress>>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl UserPayload {
    /// The primary email address, falling back to the first one listed.
    pub fn primary_email(&self) -> Option<&str> {
        let addresses = self.email_addresses.as_deref().unwrap_or_default();

        self.primary_email_address_id
            .as_deref()
            .and_then(|primary| {
                addresses
                    .iter()
                    .find(|addr| addr.id.as_deref() == Some(primary))
            })
            .or_else(|| addresses.first())
            .map(|addr| addr.email_address.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmailAddress {
    #[serde(default)]
    pub id: Option<String>,
    pub email_address: String,
}

/// Deleted-object stub carried by `user.deleted`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeletedPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub deleted: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<IdentityEvent, AppError> {
        IdentityEvent::from_slice(value.to_string().as_bytes())
    }

    #[test]
    fn test_parse_user_created() {
        let event = parse(json!({
            "type": "user.created",
            "object": "event",
            "data": {
                "id": "user_2abc",
                "email_addresses": [
                    {"id": "idn_1", "email_address": "old@example.com"},
                    {"id": "idn_2", "email_address": "ada@example.com"}
                ],
                "primary_email_address_id": "idn_2",
                "username": "ada",
                "first_name": "Ada",
                "last_name": null,
                "image_url": "https://img.clerk.com/ada.png"
            }
        }))
        .unwrap();

        let user = match event {
            IdentityEvent::UserCreated(user) => user,
            other => panic!("expected user.created, got {other:?}"),
        };
        assert_eq!(user.id, "user_2abc");
        assert_eq!(user.primary_email(), Some("ada@example.com"));
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.last_name, None);
    }

    #[test]
    fn test_primary_email_falls_back_to_first() {
        let user: UserPayload = serde_json::from_value(json!({
            "id": "user_1",
            "email_addresses": [{"email_address": "first@example.com"}],
            "primary_email_address_id": "idn_missing"
        }))
        .unwrap();
        assert_eq!(user.primary_email(), Some("first@example.com"));

        let user: UserPayload =
            serde_json::from_value(json!({"id": "user_1", "email_addresses": null})).unwrap();
        assert_eq!(user.primary_email(), None);
    }

    #[test]
    fn test_parse_user_deleted_without_id() {
        let event = parse(json!({
            "type": "user.deleted",
            "data": {"deleted": true, "object": "user"}
        }))
        .unwrap();

        assert_eq!(
            event,
            IdentityEvent::UserDeleted(DeletedPayload {
                id: None,
                deleted: Some(true)
            })
        );
    }

    #[test]
    fn test_parse_unknown_type() {
        let event = parse(json!({
            "type": "session.created",
            "data": {"id": "sess_123", "user_id": "user_1"}
        }))
        .unwrap();

        assert_eq!(event.event_type(), "session.created");
        assert_eq!(
            event,
            IdentityEvent::Other {
                event_type: "session.created".to_string(),
                object_id: Some("sess_123".to_string()),
            }
        );
    }

    #[test]
    fn test_created_without_id_is_invalid() {
        let err = parse(json!({"type": "user.created", "data": {"username": "x"}})).unwrap_err();
        assert!(matches!(err, AppError::InvalidPayload(_)));
    }

    #[test]
    fn test_malformed_body_is_invalid() {
        let err = IdentityEvent::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, AppError::InvalidPayload(_)));
    }
}
