// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clerk Backend API client.
//!
//! Only used for the metadata backfill: after a user is created locally we
//! store the application user ID in the Clerk user's public metadata so the
//! front end can resolve it from the session without a database lookup.

use crate::config::Config;
use crate::error::AppError;
use crate::models::PublicMetadata;
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Writes per-user metadata into the identity provider.
#[async_trait]
pub trait ProviderMetadata: Send + Sync {
    /// Merge `metadata` into the provider user's public metadata.
    async fn set_public_metadata(
        &self,
        provider_id: &str,
        metadata: &PublicMetadata,
    ) -> Result<(), AppError>;
}

#[derive(Serialize)]
struct UpdateMetadataRequest<'a> {
    public_metadata: &'a PublicMetadata,
}

/// Clerk Backend API client.
#[derive(Clone)]
pub struct ClerkClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl ClerkClient {
    /// Create a client for `base_url` (e.g. `https://api.clerk.com/v1`).
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building Clerk HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.clerk_api_url, &config.clerk_secret_key)
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Clerk rate limit hit (429)");
            return Err(AppError::IdentityProvider(
                AppError::PROVIDER_RATE_LIMIT.to_string(),
            ));
        }

        Err(AppError::IdentityProvider(format!("HTTP {}: {}", status, body)))
    }
}

#[async_trait]
impl ProviderMetadata for ClerkClient {
    async fn set_public_metadata(
        &self,
        provider_id: &str,
        metadata: &PublicMetadata,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}/users/{}/metadata",
            self.base_url,
            urlencoding::encode(provider_id)
        );

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.secret_key)
            .json(&UpdateMetadataRequest {
                public_metadata: metadata,
            })
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(e.to_string()))?;

        self.check_response(response).await
    }
}
