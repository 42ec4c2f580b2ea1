//! Pantry inventory module.
//!
//! Item model, the document-store seam, and the synchronizer that keeps a
//! caller's view of the pantry in step with the remote store. Adapters for
//! real backends live in `pantry-infra`.

pub mod item;
pub mod recipe;
pub mod store;
pub mod sync;
pub mod view;

pub use item::{InventoryItem, ItemName, Quantity, QUANTITY_FIELD};
pub use recipe::{Recipe, RecipeError, RecipeSource, ingredient_query, suggest_recipes};
pub use store::{
    Document, DocumentStore, FieldValue, Fields, InMemoryDocumentStore, Precondition, Revision,
    StoreError,
};
pub use sync::{
    InventorySynchronizer, Mutation, SyncError, Synced, SynchronizerConfig, WriteFailure,
};
pub use view::{display_name, filter_by_name, matches_search};
