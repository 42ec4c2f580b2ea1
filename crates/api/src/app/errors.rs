use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pantry_inventory::{InventoryItem, RecipeError, SyncError};

use crate::app::dto;

/// The user-facing operation a failure belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    List,
    Add,
    Remove,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Operation::List => FETCH_FAILED,
            Operation::Add => "Error adding item",
            Operation::Remove => "Error removing item",
        }
    }
}

pub const FETCH_FAILED: &str = "Error fetching inventory";
pub const RECIPES_FAILED: &str = "Error fetching recipes";

pub fn sync_error_to_response(err: &SyncError, op: Operation) -> axum::response::Response {
    sync_error_with_inventory(err, op, None)
}

/// Error response that also carries the inventory listed after the failure.
pub fn sync_error_with_inventory(
    err: &SyncError,
    op: Operation,
    inventory: Option<&[InventoryItem]>,
) -> axum::response::Response {
    let (status, message) = match err {
        SyncError::Validation(e) => (StatusCode::BAD_REQUEST, sentence(e.detail())),
        SyncError::Fetch(_) => (StatusCode::BAD_GATEWAY, FETCH_FAILED.to_string()),
        SyncError::Write { .. } => (StatusCode::BAD_GATEWAY, op.failure_message().to_string()),
    };

    let mut body = json!({
        "error": err.code(),
        "message": message,
    });
    if let Some(items) = inventory {
        body["inventory"] = json!(dto::items_to_dto(items));
    }
    (status, axum::Json(body)).into_response()
}

pub fn recipe_error_to_response(err: &RecipeError) -> axum::response::Response {
    match err {
        RecipeError::NotConfigured => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            err.code(),
            "Recipe suggestions are not configured",
        ),
        RecipeError::ExternalService(_) => {
            json_error(StatusCode::BAD_GATEWAY, err.code(), RECIPES_FAILED)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Upper-case the first character ("item name cannot be empty" -> "Item name cannot be empty").
fn sentence(detail: &str) -> String {
    let mut chars = detail.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
