use axum::{Router, routing::get};

pub mod inventory;
pub mod recipes;
pub mod system;

/// Router for all pantry endpoints (health is mounted separately).
pub fn router() -> Router {
    Router::new()
        .nest("/inventory", inventory::router())
        .route("/recipes", get(recipes::suggest))
}
