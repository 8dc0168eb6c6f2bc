//! Application configuration loaded from environment variables.
//!
//! Only provider credentials live here. The emulator variables
//! (FIRESTORE_EMULATOR_HOST, FIREBASE_AUTH_EMULATOR_HOST) are read
//! directly by the adapters, following the Google SDK conventions.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase web API key (public, identifies the project to Identity Toolkit)
    pub firebase_api_key: String,
    /// GCP project ID (Firestore database)
    pub gcp_project_id: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            firebase_api_key: "test_api_key".to_string(),
            gcp_project_id: "test-project".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
