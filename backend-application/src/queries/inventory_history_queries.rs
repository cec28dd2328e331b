use chrono::{DateTime, Utc};
use futures_util::future::try_join;
use tracing::warn;

use backend_domain::{
    assemble_history,
    enrich_history,
    enrich_state,
    replay_inventory,
    DomainId,
    InventoryAtQuery,
    InventoryHistoryEntry,
    InventoryHistoryQuery,
    InventoryStateEntry,
    ItemDefinition,
    TimeRange,
};

use crate::queries::spatial_queries::validate_range;
use crate::queries::storage_failure;
use crate::{AppError, AppState};

/// Anchor baseline plus every baseline and diff row in range, newest first.
///
/// An unknown player or an empty range yields an empty list.
pub async fn get_player_inventory_history(
    state: &AppState,
    domain: &DomainId,
    query: InventoryHistoryQuery,
) -> Result<Vec<InventoryHistoryEntry>, AppError> {
    let range = TimeRange::new(Some(query.start_date), Some(query.end_date));
    validate_range(range)?;

    let Some(association_id) =
        resolve_player(state, domain, &query.player_id, &query.game_server_id).await?
    else {
        return Ok(Vec::new());
    };

    let anchor = state
        .inventory_repo
        .find_anchor_baseline(domain, &association_id, query.start_date)
        .await
        .map_err(|err| storage_failure(state, "failed to find anchor baseline", err))?;

    let (baselines, diffs) = try_join(
        state
            .inventory_repo
            .fetch_baselines(domain, &association_id, anchor.as_deref(), range),
        state.inventory_repo.fetch_diffs(domain, &association_id, range),
    )
    .await
    .map_err(|err| storage_failure(state, "failed to fetch inventory history", err))?;

    let mut history = assemble_history(&baselines, &diffs);
    let ids = history.iter().map(|entry| entry.item_id.clone()).collect::<Vec<_>>();
    let definitions = lookup_definitions(state, domain, ids).await;
    enrich_history(&mut history, &definitions);
    Ok(history)
}

/// Per-item inventory held at one instant, ordered by item id.
pub async fn get_player_inventory_at(
    state: &AppState,
    domain: &DomainId,
    query: InventoryAtQuery,
) -> Result<Vec<InventoryStateEntry>, AppError> {
    let Some(association_id) =
        resolve_player(state, domain, &query.player_id, &query.game_server_id).await?
    else {
        return Ok(Vec::new());
    };

    let mut inventory = stored_inventory_at(state, domain, &association_id, query.at)
        .await
        .map_err(|err| storage_failure(state, "failed to reconstruct inventory", err))?;
    let ids = inventory.iter().map(|entry| entry.item_id.clone()).collect::<Vec<_>>();
    let definitions = lookup_definitions(state, domain, ids).await;
    enrich_state(&mut inventory, &definitions);
    Ok(inventory)
}

/// Replays the anchor baseline at or before `at` and every later diff up to
/// `at`, straight from storage.
pub(crate) async fn stored_inventory_at(
    state: &AppState,
    domain: &DomainId,
    association_id: &str,
    at: DateTime<Utc>,
) -> anyhow::Result<Vec<InventoryStateEntry>> {
    let anchor = state
        .inventory_repo
        .find_anchor_baseline(domain, association_id, at)
        .await?;
    let baselines = match anchor.as_deref() {
        Some(anchor_id) => {
            state
                .inventory_repo
                .fetch_baselines(domain, association_id, Some(anchor_id), TimeRange::new(Some(at), Some(at)))
                .await?
        }
        None => Vec::new(),
    };
    let anchor_at = baselines
        .iter()
        .filter(|row| anchor.as_deref() == Some(row.baseline_id.as_str()))
        .map(|row| row.observed_at)
        .min();
    let diffs = state
        .inventory_repo
        .fetch_diffs(domain, association_id, TimeRange::new(anchor_at, Some(at)))
        .await?;
    Ok(replay_inventory(&baselines, &diffs, at))
}

async fn resolve_player(
    state: &AppState,
    domain: &DomainId,
    player_id: &str,
    game_server_id: &str,
) -> Result<Option<String>, AppError> {
    let player_id = player_id.trim();
    let game_server_id = game_server_id.trim();
    if player_id.is_empty() || game_server_id.is_empty() {
        return Err(AppError::BadRequest(
            "player_id and game_server_id are required".to_string(),
        ));
    }
    let association = state
        .association_repo
        .find_by_player(domain, player_id, game_server_id)
        .await
        .map_err(|err| storage_failure(state, "failed to resolve player association", err))?;
    Ok(association.map(|association| association.id))
}

// Enrichment is cosmetic; a catalog failure leaves code and name empty.
async fn lookup_definitions(state: &AppState, domain: &DomainId, mut ids: Vec<String>) -> Vec<ItemDefinition> {
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Vec::new();
    }
    match state.item_catalog.find_items_by_ids(domain, &ids).await {
        Ok(definitions) => definitions,
        Err(err) => {
            warn!(domain = %domain, "item enrichment skipped: {:#}", err);
            Vec::new()
        }
    }
}
