//! Service wiring: document store + synchronizer + optional recipe source.

use std::sync::Arc;

use pantry_infra::{AppConfig, FirestoreStore, SpoonacularClient};
use pantry_inventory::{
    DocumentStore, InMemoryDocumentStore, InventorySynchronizer, RecipeSource, SynchronizerConfig,
};

/// Type-erased document store shared by handlers.
pub type SharedStore = Arc<dyn DocumentStore>;

pub struct AppServices {
    inventory: InventorySynchronizer<SharedStore>,
    recipes: Option<Arc<dyn RecipeSource>>,
}

impl AppServices {
    pub fn new(
        store: SharedStore,
        config: SynchronizerConfig,
        recipes: Option<Arc<dyn RecipeSource>>,
    ) -> Self {
        Self {
            inventory: InventorySynchronizer::with_config(store, config),
            recipes,
        }
    }

    /// In-memory store, default collection, no recipe suggestions (dev/test).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryDocumentStore::new()),
            SynchronizerConfig::default(),
            None,
        )
    }

    pub fn inventory(&self) -> &InventorySynchronizer<SharedStore> {
        &self.inventory
    }

    pub fn recipes(&self) -> Option<&dyn RecipeSource> {
        self.recipes.as_deref()
    }
}

/// Wire services from configuration.
///
/// Without Firestore settings the in-memory store is used; without a
/// Spoonacular key recipe suggestions are disabled.
pub fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let client = config.http_client()?;

    let store: SharedStore = match &config.firestore {
        Some(firestore) => {
            tracing::info!(project = %firestore.project_id, "using Firestore document store");
            Arc::new(FirestoreStore::new(firestore.clone(), client.clone())?)
        }
        None => {
            tracing::warn!("FIRESTORE_PROJECT_ID not set; using in-memory document store");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    let recipes: Option<Arc<dyn RecipeSource>> = match &config.recipes {
        Some(recipes) => Some(Arc::new(SpoonacularClient::new(recipes.clone(), client))),
        None => {
            tracing::warn!("SPOONACULAR_API_KEY not set; recipe suggestions disabled");
            None
        }
    };

    Ok(AppServices::new(
        store,
        config.synchronizer.clone(),
        recipes,
    ))
}
