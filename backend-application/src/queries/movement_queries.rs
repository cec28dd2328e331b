use chrono::{DateTime, Duration, Utc};

use backend_domain::{normalize_optional_text, DomainId, MovementFilter, MovementHistoryQuery, PlayerLocation};

use crate::queries::storage_failure;
use crate::{AppError, AppState};

pub const MAX_MOVEMENT_LIMIT: usize = 1000;
const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// Applies defaults and validates the limit. Runs before any storage access.
pub fn movement_filter(query: MovementHistoryQuery, now: DateTime<Utc>) -> Result<MovementFilter, AppError> {
    let limit = match query.limit {
        None | Some(0) => MAX_MOVEMENT_LIMIT,
        Some(limit) if limit > MAX_MOVEMENT_LIMIT => {
            return Err(AppError::BadRequest(format!(
                "invalid pagination: limit must be less than or equal to {MAX_MOVEMENT_LIMIT}"
            )));
        }
        Some(limit) => limit,
    };

    let start = query
        .start_date
        .unwrap_or_else(|| now - Duration::hours(DEFAULT_LOOKBACK_HOURS));
    if let Some(end) = query.end_date {
        if end < start {
            return Err(AppError::BadRequest(
                "start_date must not be after end_date".to_string(),
            ));
        }
    }

    let mut player_ids = query
        .player_ids
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| normalize_optional_text(Some(id)))
        .collect::<Vec<_>>();
    player_ids.sort();
    player_ids.dedup();

    Ok(MovementFilter {
        player_ids,
        start,
        end: query.end_date,
        limit,
    })
}

pub async fn get_player_movement_history(
    state: &AppState,
    domain: &DomainId,
    query: MovementHistoryQuery,
) -> Result<Vec<PlayerLocation>, AppError> {
    let filter = movement_filter(query, state.clock.now())?;
    state
        .location_repo
        .fetch_movement_history(domain, &filter)
        .await
        .map_err(|err| storage_failure(state, "failed to fetch movement history", err))
}
