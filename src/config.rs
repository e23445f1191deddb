// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets as environment variables through secret
//! bindings, so everything is read once at startup.

use std::env;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SITE_DOMAIN: &str = "http://localhost:5173";

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Cloud Firestore (or its emulator).
    Firestore,
    /// In-process store, lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Firebase project whose ID tokens are accepted
    pub firebase_project_id: String,
    /// Storage backend selection
    pub store_backend: StoreBackend,
    /// Public site origin, used for checkout redirects and CORS
    pub site_domain: String,

    // --- Secrets ---
    /// Stripe secret API key
    pub stripe_secret_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gcp_project_id =
            env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?;

        let firebase_project_id =
            env::var("FIREBASE_PROJECT_ID").unwrap_or_else(|_| gcp_project_id.clone());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StoreBackend::Firestore,
        };

        Ok(Self {
            port,
            gcp_project_id,
            firebase_project_id,
            store_backend,
            site_domain: env::var("SITE_DOMAIN")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_SITE_DOMAIN.to_string()),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?,
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 3000,
            gcp_project_id: "test-project".to_string(),
            firebase_project_id: "test-project".to_string(),
            store_backend: StoreBackend::Memory,
            site_domain: DEFAULT_SITE_DOMAIN.to_string(),
            stripe_secret_key: "sk_test_secret".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
