//! Configuration loading and representation.
//!
//! Everything comes from environment variables, read once at startup. Blank
//! values count as unset.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use pantry_inventory::SynchronizerConfig;
use pantry_inventory::sync::{DEFAULT_COLLECTION, DEFAULT_MAX_ATTEMPTS};

use crate::document_store::FirestoreConfig;
use crate::document_store::firestore;
use crate::external::SpoonacularConfig;
use crate::external::spoonacular;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Secret credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub synchronizer: SynchronizerConfig,
    /// `None` selects the in-memory store.
    pub firestore: Option<FirestoreConfig>,
    /// `None` disables recipe suggestions.
    pub recipes: Option<SpoonacularConfig>,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_var(
            "PANTRY_BIND_ADDR",
            get("PANTRY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        let max_attempts: u32 = match get("PANTRY_MAX_WRITE_ATTEMPTS") {
            Some(raw) => parse_var("PANTRY_MAX_WRITE_ATTEMPTS", raw)?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "PANTRY_MAX_WRITE_ATTEMPTS",
                reason: "must be at least 1".to_string(),
            });
        }

        let synchronizer = SynchronizerConfig {
            collection: get("PANTRY_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            max_attempts,
        };
        if synchronizer.collection.contains('/') {
            return Err(ConfigError::Invalid {
                var: "PANTRY_COLLECTION",
                reason: "collection name cannot contain '/'".to_string(),
            });
        }

        let firestore = get("FIRESTORE_PROJECT_ID").map(|project_id| FirestoreConfig {
            base_url: get("FIRESTORE_BASE_URL")
                .unwrap_or_else(|| firestore::DEFAULT_BASE_URL.to_string()),
            api_key: get("FIRESTORE_API_KEY").map(ApiKey::new),
            ..FirestoreConfig::new(project_id)
        });

        let recipes = get("SPOONACULAR_API_KEY").map(|key| SpoonacularConfig {
            base_url: get("SPOONACULAR_BASE_URL")
                .unwrap_or_else(|| spoonacular::DEFAULT_BASE_URL.to_string()),
            api_key: ApiKey::new(key),
        });

        let timeout_secs: u64 = match get("PANTRY_HTTP_TIMEOUT_SECS") {
            Some(raw) => parse_var("PANTRY_HTTP_TIMEOUT_SECS", raw)?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            bind_addr,
            synchronizer,
            firestore,
            recipes,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Shared outbound HTTP client honoring the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))
    }
}

fn parse_var<T>(var: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: format!("{raw:?}: {e}"),
    })
}
