use backend_domain::{partition_date, normalize_optional_text, DomainId, LocationSample, SeriesKind};

use crate::queries::storage_failure;
use crate::{AppError, AppState};

pub async fn observe_player_location(
    state: &AppState,
    domain: &DomainId,
    association_id: &str,
    x: f64,
    y: f64,
    z: f64,
    dimension: Option<String>,
) -> Result<(), AppError> {
    let observed_at = state.clock.now();
    let sample = LocationSample {
        association_id: association_id.to_string(),
        x,
        y,
        z,
        dimension: normalize_optional_text(dimension),
        observed_at,
    };

    state
        .partitions
        .ensure_partition(SeriesKind::Location, partition_date(observed_at))
        .await
        .map_err(|err| storage_failure(state, "failed to ensure location partition", err))?;
    state
        .location_repo
        .insert_location(domain, &sample)
        .await
        .map_err(|err| storage_failure(state, "failed to insert location sample", err))?;

    state.metrics.record_location();
    Ok(())
}
