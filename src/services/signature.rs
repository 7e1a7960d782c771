// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Svix webhook signature verification.
//!
//! Clerk delivers webhooks through Svix. Each delivery carries three headers:
//! - `svix-id`: unique message ID
//! - `svix-timestamp`: Unix seconds when the message was signed
//! - `svix-signature`: space-separated `v1,<base64>` signatures
//!
//! The signature is HMAC-SHA256 over `"{id}.{timestamp}.{body}"` keyed with
//! the base64-decoded part of the `whsec_...` endpoint secret.

use crate::config::{Config, ConfigError};
use crate::error::AppError;
use crate::models::IdentityEvent;
use axum::body::Bytes;
use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Per-request verification failures. All map to 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("missing required header {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature timestamp")]
    InvalidTimestamp,

    #[error("message timestamp too old")]
    TimestampTooOld,

    #[error("message timestamp too new")]
    TimestampTooNew,

    #[error("no matching signature found")]
    NoMatchingSignature,
}

/// One inbound webhook delivery, as received. Lives for a single request.
#[derive(Debug, Clone)]
pub struct WebhookEnvelope {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
    pub raw_body: Bytes,
}

impl WebhookEnvelope {
    /// Collect the Svix headers. Absent, empty or non-ASCII values count as
    /// missing.
    pub fn from_headers(headers: &HeaderMap, raw_body: Bytes) -> Result<Self, VerificationError> {
        let get = |name: &'static str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(VerificationError::MissingHeader(name))
        };

        Ok(Self {
            id: get(HEADER_ID)?,
            timestamp: get(HEADER_TIMESTAMP)?,
            signature: get(HEADER_SIGNATURE)?,
            raw_body,
        })
    }
}

/// Verifies Svix signatures with the endpoint secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    /// HMAC already keyed with the endpoint secret; cloned per message.
    mac: HmacSha256,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    /// Build a verifier from a `whsec_...` secret (prefix optional).
    pub fn new(secret: &str, tolerance_secs: u64) -> Result<Self, ConfigError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = BASE64
            .decode(encoded)
            .map_err(|e| ConfigError::Invalid("WEBHOOK_SECRET", format!("not base64: {e}")))?;

        if key.is_empty() {
            return Err(ConfigError::Missing("WEBHOOK_SECRET"));
        }

        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| ConfigError::Invalid("WEBHOOK_SECRET", e.to_string()))?;

        Ok(Self {
            mac,
            tolerance_secs: i64::try_from(tolerance_secs).unwrap_or(i64::MAX),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.webhook_secret, config.webhook_tolerance_secs)
    }

    /// Verify the envelope and parse its body into a typed event.
    pub fn verify_event(&self, envelope: &WebhookEnvelope) -> Result<IdentityEvent, AppError> {
        self.verify(envelope)?;
        IdentityEvent::from_slice(&envelope.raw_body)
    }

    /// Verify the envelope against the current time.
    pub fn verify(&self, envelope: &WebhookEnvelope) -> Result<(), VerificationError> {
        self.verify_at(envelope, chrono::Utc::now().timestamp())
    }

    /// Verify the envelope as if the current time were `now` (Unix seconds).
    pub fn verify_at(&self, envelope: &WebhookEnvelope, now: i64) -> Result<(), VerificationError> {
        let timestamp: i64 = envelope
            .timestamp
            .parse()
            .map_err(|_| VerificationError::InvalidTimestamp)?;

        if now.saturating_sub(timestamp) > self.tolerance_secs {
            return Err(VerificationError::TimestampTooOld);
        }
        if timestamp.saturating_sub(now) > self.tolerance_secs {
            return Err(VerificationError::TimestampTooNew);
        }

        let expected = self.compute(&envelope.id, &envelope.timestamp, &envelope.raw_body);

        let matched = envelope
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| BASE64.decode(sig).ok())
            .any(|sig| bool::from(sig.as_slice().ct_eq(expected.as_slice())));

        if matched {
            Ok(())
        } else {
            Err(VerificationError::NoMatchingSignature)
        }
    }

    /// Produce the `svix-signature` value for a message.
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> String {
        let mac = self.compute(msg_id, &timestamp.to_string(), payload);
        format!("{},{}", SIGNATURE_VERSION, BASE64.encode(mac))
    }

    fn compute(&self, msg_id: &str, timestamp: &str, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
