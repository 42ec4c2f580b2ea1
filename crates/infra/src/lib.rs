//! Infrastructure layer: document-store adapters, external services, config.

pub mod config;
pub mod document_store;
pub mod external;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ApiKey, AppConfig, ConfigError};
pub use document_store::{FirestoreConfig, FirestoreStore};
pub use external::{SpoonacularClient, SpoonacularConfig};
