// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. A missing webhook secret stops the
//! server before it accepts a single request.

use std::env;

/// Default Clerk Backend API base URL.
pub const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com/v1";

/// Default allowed clock skew for `svix-timestamp`, in seconds.
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Clerk Backend API base URL
    pub clerk_api_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Accepted distance between `svix-timestamp` and now
    pub webhook_tolerance_secs: u64,

    // --- Secrets ---
    /// Svix signing secret for the Clerk webhook endpoint (`whsec_...`)
    pub webhook_secret: String,
    /// Clerk Backend API secret key (`sk_...`)
    pub clerk_secret_key: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("clerk_api_url", &self.clerk_api_url)
            .field("gcp_project_id", &self.gcp_project_id)
            .field("port", &self.port)
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .field("webhook_secret", &"<redacted>")
            .field("clerk_secret_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Config for tests only.
    ///
    /// The webhook secret is a valid `whsec_` secret (base64 of
    /// `test_webhook_signing_key_bytes!!`).
    pub fn test_default() -> Self {
        Self {
            clerk_api_url: "http://localhost:9999/v1".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
            webhook_secret: "whsec_dGVzdF93ZWJob29rX3NpZ25pbmdfa2V5X2J5dGVzISE=".to_string(),
            clerk_secret_key: "sk_test_clerk_secret".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            clerk_api_url: env::var("CLERK_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_CLERK_API_URL.to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            webhook_tolerance_secs: match env::var("WEBHOOK_TOLERANCE_SECS") {
                Ok(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("WEBHOOK_TOLERANCE_SECS", v))?,
                Err(_) => DEFAULT_WEBHOOK_TOLERANCE_SECS,
            },

            webhook_secret: required("WEBHOOK_SECRET")?,
            clerk_secret_key: required("CLERK_SECRET_KEY")?,
        })
    }
}

/// Read a required secret, trimmed. Empty counts as missing.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
