use futures_util::future::try_join;

use backend_domain::{DomainId, PlayerItemHistoryEntry, PlayersByItemQuery, TimeRange};

use crate::queries::spatial_queries::validate_range;
use crate::queries::storage_failure;
use crate::{AppError, AppState};

/// Baseline rows and presence diffs for one item, newest first.
/// A player appears once per matching row.
pub async fn get_players_by_item(
    state: &AppState,
    domain: &DomainId,
    query: PlayersByItemQuery,
) -> Result<Vec<PlayerItemHistoryEntry>, AppError> {
    let item_id = query.item_id.trim();
    if item_id.is_empty() {
        return Err(AppError::BadRequest("item_id is required".to_string()));
    }
    let range = TimeRange::new(query.start_date, query.end_date);
    validate_range(range)?;

    let (baselines, diffs) = try_join(
        state.inventory_repo.fetch_baselines_by_item(domain, item_id, range),
        state
            .inventory_repo
            .fetch_presence_diffs_by_item(domain, item_id, range),
    )
    .await
    .map_err(|err| storage_failure(state, "failed to search players by item", err))?;

    let mut entries = baselines
        .into_iter()
        .map(PlayerItemHistoryEntry::from)
        .chain(
            diffs
                .into_iter()
                .filter(|row| row.change_type.signals_presence())
                .map(PlayerItemHistoryEntry::from),
        )
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| {
        b.observed_at
            .cmp(&a.observed_at)
            .then_with(|| a.association_id.cmp(&b.association_id))
    });
    Ok(entries)
}
