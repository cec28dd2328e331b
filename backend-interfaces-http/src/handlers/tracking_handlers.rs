use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use backend_application::queries::{
    inventory_history_queries,
    item_search_queries,
    movement_queries,
    spatial_queries,
};
use backend_application::AppState;
use backend_domain::{
    BoundingBoxQuery,
    InventoryAtQuery,
    InventoryHistoryEntry,
    InventoryHistoryQuery,
    InventoryStateEntry,
    MovementHistoryQuery,
    PlayerItemHistoryEntry,
    PlayerLocation,
    PlayersByItemQuery,
    RadiusQuery,
};

use crate::error::HttpError;
use crate::middleware::authorized_domain;

pub async fn movement_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(query): Json<MovementHistoryQuery>,
) -> Result<Json<Vec<PlayerLocation>>, HttpError> {
    let domain = authorized_domain(&state.config, &headers)?;
    let rows = movement_queries::get_player_movement_history(&state, &domain, query).await?;
    Ok(Json(rows))
}

pub async fn bounding_box(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(query): Json<BoundingBoxQuery>,
) -> Result<Json<Vec<PlayerLocation>>, HttpError> {
    let domain = authorized_domain(&state.config, &headers)?;
    let rows = spatial_queries::get_bounding_box_players(&state, &domain, query).await?;
    Ok(Json(rows))
}

pub async fn radius(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(query): Json<RadiusQuery>,
) -> Result<Json<Vec<PlayerLocation>>, HttpError> {
    let domain = authorized_domain(&state.config, &headers)?;
    let rows = spatial_queries::get_radius_players(&state, &domain, query).await?;
    Ok(Json(rows))
}

pub async fn inventory_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(query): Json<InventoryHistoryQuery>,
) -> Result<Json<Vec<InventoryHistoryEntry>>, HttpError> {
    let domain = authorized_domain(&state.config, &headers)?;
    let rows = inventory_history_queries::get_player_inventory_history(&state, &domain, query).await?;
    Ok(Json(rows))
}

pub async fn inventory_at(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(query): Json<InventoryAtQuery>,
) -> Result<Json<Vec<InventoryStateEntry>>, HttpError> {
    let domain = authorized_domain(&state.config, &headers)?;
    let rows = inventory_history_queries::get_player_inventory_at(&state, &domain, query).await?;
    Ok(Json(rows))
}

pub async fn players_by_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(query): Json<PlayersByItemQuery>,
) -> Result<Json<Vec<PlayerItemHistoryEntry>>, HttpError> {
    let domain = authorized_domain(&state.config, &headers)?;
    let rows = item_search_queries::get_players_by_item(&state, &domain, query).await?;
    Ok(Json(rows))
}
