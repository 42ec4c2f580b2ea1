use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use pantry_inventory::{Mutation, Synced, filter_by_name};

use crate::app::errors::{self, Operation};
use crate::app::{dto, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items))
        .route("/items", post(add_item))
        .route("/items/:name", delete(remove_item))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::InventoryQuery>,
) -> axum::response::Response {
    let items = match services.inventory().list().await {
        Ok(items) => filter_by_name(items, &query.q),
        Err(e) => return errors::sync_error_to_response(&e, Operation::List),
    };

    (
        StatusCode::OK,
        Json(dto::InventoryResponse {
            count: items.len(),
            items: dto::items_to_dto(&items),
        }),
    )
        .into_response()
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddItemRequest>,
) -> axum::response::Response {
    let synced = services.inventory().add(&body.name).await;
    mutation_response(synced, Operation::Add, "Item added successfully")
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    let synced = services.inventory().remove(&name).await;
    mutation_response(synced, Operation::Remove, "Item removed successfully")
}

fn mutation_response(
    synced: Synced,
    op: Operation,
    message: &'static str,
) -> axum::response::Response {
    let Synced { outcome, inventory } = synced;

    let mutation = match outcome {
        Ok(m) => m,
        Err(e) => {
            return errors::sync_error_with_inventory(&e, op, inventory.as_deref().ok());
        }
    };

    let (inventory, refresh_error) = match inventory {
        Ok(items) => (Some(dto::items_to_dto(&items)), None),
        Err(_) => (None, Some(errors::FETCH_FAILED)),
    };
    let status = if mutation == Mutation::Created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    (
        status,
        Json(dto::MutationResponse {
            message,
            outcome: mutation,
            inventory,
            refresh_error,
        }),
    )
        .into_response()
}
