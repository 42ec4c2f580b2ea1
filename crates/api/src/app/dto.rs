use serde::{Deserialize, Serialize};

use pantry_inventory::{InventoryItem, Mutation, Recipe, display_name};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    // Missing and empty names get the same validation error.
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    #[serde(default)]
    pub q: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ItemDto {
    pub name: String,
    pub display_name: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub count: usize,
    pub items: Vec<ItemDto>,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub message: &'static str,
    pub outcome: Mutation,
    /// Inventory as listed after the mutation; `None` when that refresh failed.
    pub inventory: Option<Vec<ItemDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_error: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct RecipesResponse {
    pub count: usize,
    pub recipes: Vec<Recipe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

pub fn item_to_dto(item: &InventoryItem) -> ItemDto {
    ItemDto {
        name: item.name().to_string(),
        display_name: display_name(item.name().as_str()),
        quantity: item.quantity().get(),
    }
}

pub fn items_to_dto(items: &[InventoryItem]) -> Vec<ItemDto> {
    items.iter().map(item_to_dto).collect()
}
