// HTTP handlers for inventory endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::inventory::{InventoryError, Item, ItemListQuery};

/// Handler for GET /api/items
/// Lists bookable items, optionally filtered by resource type
#[utoipa::path(
    get,
    path = "/api/items",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Bookable items", body = Vec<Item>),
        (status = 500, description = "Internal server error")
    ),
    tag = "items"
)]
pub async fn list_items_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<ItemListQuery>,
) -> Result<Json<Vec<Item>>, InventoryError> {
    tracing::debug!("Listing items with filter: {:?}", query.resource_type);

    let items = state.item_repo.list(query.resource_type).await?;

    Ok(Json(items))
}
