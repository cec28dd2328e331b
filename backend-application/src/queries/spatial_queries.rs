use backend_domain::{BoundingBoxQuery, DomainId, PlayerLocation, RadiusQuery, TimeRange};

use crate::queries::storage_failure;
use crate::{AppError, AppState};

pub async fn get_bounding_box_players(
    state: &AppState,
    domain: &DomainId,
    mut query: BoundingBoxQuery,
) -> Result<Vec<PlayerLocation>, AppError> {
    query.game_server_id = required_server_id(&query.game_server_id)?;
    let bounds = [
        query.min_x, query.max_x, query.min_y, query.max_y, query.min_z, query.max_z,
    ];
    if bounds.iter().any(|value| !value.is_finite()) {
        return Err(AppError::BadRequest("box bounds must be finite".to_string()));
    }
    validate_range(query.time_range())?;

    state
        .location_repo
        .fetch_in_bounding_box(domain, &query)
        .await
        .map_err(|err| storage_failure(state, "failed to run bounding box query", err))
}

pub async fn get_radius_players(
    state: &AppState,
    domain: &DomainId,
    mut query: RadiusQuery,
) -> Result<Vec<PlayerLocation>, AppError> {
    query.game_server_id = required_server_id(&query.game_server_id)?;
    if ![query.x, query.y, query.z].iter().all(|value| value.is_finite()) {
        return Err(AppError::BadRequest("center must be finite".to_string()));
    }
    if !query.radius.is_finite() || query.radius < 0.0 {
        return Err(AppError::BadRequest(
            "radius must be a non-negative number".to_string(),
        ));
    }
    validate_range(query.time_range())?;

    state
        .location_repo
        .fetch_in_radius(domain, &query)
        .await
        .map_err(|err| storage_failure(state, "failed to run radius query", err))
}

fn required_server_id(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("game_server_id is required".to_string()));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_range(range: TimeRange) -> Result<(), AppError> {
    match (range.start, range.end) {
        (Some(start), Some(end)) if start > end => Err(AppError::BadRequest(
            "start_date must not be after end_date".to_string(),
        )),
        _ => Ok(()),
    }
}
