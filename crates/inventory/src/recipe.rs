//! Recipe suggestions for what is currently in the pantry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::InventoryItem;
use crate::view::display_name;

/// A suggested recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("recipe service error: {0}")]
    ExternalService(String),

    #[error("recipe suggestions are not configured")]
    NotConfigured,
}

impl RecipeError {
    pub fn code(&self) -> &'static str {
        match self {
            RecipeError::ExternalService(_) => "external_service_error",
            RecipeError::NotConfigured => "recipes_unavailable",
        }
    }
}

/// Third-party recipe lookup.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Recipes using the comma-separated `ingredients`; may be empty.
    async fn find_by_ingredients(&self, ingredients: &str) -> Result<Vec<Recipe>, RecipeError>;
}

/// Comma-separated display names of `items`, in order.
pub fn ingredient_query(items: &[InventoryItem]) -> String {
    items
        .iter()
        .map(|item| display_name(item.name().as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Ask `source` for recipes using the given inventory.
///
/// An empty pantry yields no recipes without calling the service.
pub async fn suggest_recipes<R>(source: &R, items: &[InventoryItem]) -> Result<Vec<Recipe>, RecipeError>
where
    R: RecipeSource + ?Sized,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let ingredients = ingredient_query(items);
    tracing::debug!(%ingredients, "requesting recipe suggestions");
    source.find_by_ingredients(&ingredients).await
}
