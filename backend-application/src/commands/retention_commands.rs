use chrono::{DateTime, Utc};
use tracing::info;

use backend_domain::{DomainId, RetentionResult};

use crate::queries::storage_failure;
use crate::{AppError, AppState};

pub async fn cleanup_location(
    state: &AppState,
    domain: &DomainId,
    cutoff: DateTime<Utc>,
) -> Result<RetentionResult, AppError> {
    let deleted = state
        .location_repo
        .delete_locations_before(domain, cutoff)
        .await
        .map_err(|err| storage_failure(state, "failed to delete location samples", err))?;
    info!(
        domain = %domain,
        "deleted {} player location records older than {}",
        deleted,
        cutoff.to_rfc3339()
    );
    Ok(RetentionResult { cutoff, deleted })
}

pub async fn cleanup_inventory(
    state: &AppState,
    domain: &DomainId,
    cutoff: DateTime<Utc>,
) -> Result<RetentionResult, AppError> {
    let deleted = state
        .inventory_repo
        .delete_inventory_before(domain, cutoff)
        .await
        .map_err(|err| storage_failure(state, "failed to delete inventory history", err))?;
    info!(
        domain = %domain,
        "deleted {} player inventory records older than {}",
        deleted,
        cutoff.to_rfc3339()
    );
    Ok(RetentionResult { cutoff, deleted })
}
