use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use pantry_inventory::{RecipeError, suggest_recipes};

use crate::app::errors::{self, Operation};
use crate::app::{dto, services::AppServices};

/// Recipe ideas for everything currently in the pantry.
pub async fn suggest(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let Some(source) = services.recipes() else {
        return errors::recipe_error_to_response(&RecipeError::NotConfigured);
    };

    let items = match services.inventory().list().await {
        Ok(items) => items,
        Err(e) => return errors::sync_error_to_response(&e, Operation::List),
    };

    let recipes = match suggest_recipes(source, &items).await {
        Ok(recipes) => recipes,
        Err(e) => {
            tracing::warn!(error = %e, "recipe lookup failed");
            return errors::recipe_error_to_response(&e);
        }
    };

    let message = recipes.is_empty().then_some("No recipes found");
    (
        StatusCode::OK,
        Json(dto::RecipesResponse {
            count: recipes.len(),
            recipes,
            message,
        }),
    )
        .into_response()
}
