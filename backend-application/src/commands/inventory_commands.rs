use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use backend_domain::{
    aggregate_by_code,
    partition_date,
    plan_observation,
    AggregatedInventory,
    AggregatedItem,
    DomainId,
    InventoryItem,
    InventoryObservationOutcome,
    ObservationPlan,
    SeriesKind,
};

use crate::queries::inventory_history_queries::stored_inventory_at;
use crate::AppState;

/// Records one inventory observation as a baseline or a diff set.
///
/// Never fails the caller: any collaborator failure is logged and counted,
/// and `None` is returned.
pub async fn observe_player_inventory(
    state: &AppState,
    domain: &DomainId,
    association_id: &str,
    game_server_id: &str,
    items: Vec<InventoryItem>,
) -> Option<InventoryObservationOutcome> {
    match try_observe_player_inventory(state, domain, association_id, game_server_id, &items).await {
        Ok(outcome) => {
            match &outcome {
                InventoryObservationOutcome::Baseline { .. } => state.metrics.record_baseline(),
                InventoryObservationOutcome::Diff { rows } => state.metrics.record_diff(*rows),
                InventoryObservationOutcome::Unchanged => state.metrics.record_unchanged(),
            }
            debug!(
                domain = %domain,
                association_id,
                outcome = ?outcome,
                "inventory observed"
            );
            Some(outcome)
        }
        Err(err) => {
            state.metrics.record_inventory_error();
            warn!(
                domain = %domain,
                association_id,
                game_server_id,
                "inventory observation dropped: {:#}",
                err
            );
            None
        }
    }
}

async fn try_observe_player_inventory(
    state: &AppState,
    domain: &DomainId,
    association_id: &str,
    game_server_id: &str,
    items: &[InventoryItem],
) -> Result<InventoryObservationOutcome> {
    let _guard = state.player_locks.acquire(domain, association_id).await;
    let now = state.clock.now();

    let previous_items = state.snapshot_cache.get_inventory(domain, association_id).await?;
    let last_baseline = state
        .snapshot_cache
        .get_last_baseline(domain, association_id)
        .await?;

    let mut codes = items
        .iter()
        .chain(previous_items.iter().flatten())
        .map(|item| item.code.clone())
        .collect::<Vec<_>>();
    codes.sort();
    codes.dedup();
    let definitions = state
        .item_catalog
        .resolve_items_by_code(domain, &codes, game_server_id)
        .await?;

    let current = aggregate_by_code(items, &definitions);
    let previous = match previous_items.as_deref() {
        Some(previous) => Some(aggregate_by_code(previous, &definitions)),
        None if current.is_empty() => Some(stored_state(state, domain, association_id, now).await?),
        None => None,
    };

    let baseline_id = Uuid::new_v4().to_string();
    let plan = plan_observation(
        association_id,
        &baseline_id,
        previous.as_ref(),
        &current,
        last_baseline,
        state.config.baseline_interval(),
        now,
    );

    let ttl = state.config.snapshot_ttl();
    let date = partition_date(now);
    let outcome = match plan {
        ObservationPlan::Baseline(rows) => {
            state
                .partitions
                .ensure_partition(SeriesKind::InventoryBaseline, date)
                .await?;
            state.inventory_repo.insert_baseline(domain, &rows).await?;
            state
                .snapshot_cache
                .set_last_baseline(domain, association_id, now, ttl)
                .await?;
            InventoryObservationOutcome::Baseline {
                baseline_id,
                rows: rows.len(),
            }
        }
        ObservationPlan::Diff(rows) if rows.is_empty() => InventoryObservationOutcome::Unchanged,
        ObservationPlan::Diff(rows) => {
            state
                .partitions
                .ensure_partition(SeriesKind::InventoryDiff, date)
                .await?;
            state.inventory_repo.insert_diffs(domain, &rows).await?;
            InventoryObservationOutcome::Diff { rows: rows.len() }
        }
    };

    state
        .snapshot_cache
        .set_inventory(domain, association_id, items, ttl)
        .await?;
    Ok(outcome)
}

// Without a cached snapshot, an empty inventory is compared against what
// storage last recorded, keyed by item id, so held items still get removals.
async fn stored_state(
    state: &AppState,
    domain: &DomainId,
    association_id: &str,
    now: DateTime<Utc>,
) -> Result<AggregatedInventory> {
    let entries = stored_inventory_at(state, domain, association_id, now).await?;
    Ok(entries
        .into_iter()
        .map(|entry| {
            let item = AggregatedItem {
                item_id: entry.item_id.clone(),
                amount: entry.quantity,
                quality: entry.quality,
            };
            (entry.item_id, item)
        })
        .collect())
}
