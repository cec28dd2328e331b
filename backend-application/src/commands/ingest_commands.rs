use tracing::warn;

use backend_domain::{normalize_optional_text, DomainId, IngestSummary, ObservationEnvelope};

use crate::commands::{inventory_commands, location_commands};
use crate::queries::storage_failure;
use crate::{AppError, AppState};

/// Resolves every observation's association and records it.
///
/// Observations without a game server or with an unknown player are dropped.
/// Location storage failures abort the batch; inventory failures never do.
pub async fn process_observations(
    state: &AppState,
    domain: &DomainId,
    envelope: ObservationEnvelope,
) -> Result<IngestSummary, AppError> {
    let inherited_server_id = normalize_optional_text(envelope.game_server_id);
    let mut summary = IngestSummary::default();

    for observation in envelope.locations {
        let game_server_id =
            normalize_optional_text(observation.game_server_id).or_else(|| inherited_server_id.clone());
        let Some(association_id) =
            resolve_association(state, domain, &observation.game_id, game_server_id.as_deref()).await?
        else {
            summary.dropped += 1;
            continue;
        };
        location_commands::observe_player_location(
            state,
            domain,
            &association_id,
            observation.x,
            observation.y,
            observation.z,
            observation.dimension,
        )
        .await?;
        summary.locations += 1;
    }

    for observation in envelope.inventories {
        let game_server_id =
            normalize_optional_text(observation.game_server_id).or_else(|| inherited_server_id.clone());
        let Some(server_id) = game_server_id else {
            summary.dropped += 1;
            continue;
        };
        let Some(association_id) =
            resolve_association(state, domain, &observation.game_id, Some(&server_id)).await?
        else {
            summary.dropped += 1;
            continue;
        };
        inventory_commands::observe_player_inventory(
            state,
            domain,
            &association_id,
            &server_id,
            observation.items,
        )
        .await;
        summary.inventories += 1;
    }

    if summary.dropped > 0 {
        warn!(
            domain = %domain,
            "dropped {} observations (missing game server or unknown player)",
            summary.dropped
        );
        state.metrics.record_ingest_dropped(summary.dropped);
    }
    Ok(summary)
}

async fn resolve_association(
    state: &AppState,
    domain: &DomainId,
    game_id: &str,
    game_server_id: Option<&str>,
) -> Result<Option<String>, AppError> {
    let game_id = game_id.trim();
    let Some(game_server_id) = game_server_id else {
        return Ok(None);
    };
    if game_id.is_empty() {
        return Ok(None);
    }
    state
        .association_repo
        .find_association(domain, game_id, game_server_id)
        .await
        .map_err(|err| storage_failure(state, "failed to resolve player association", err))
}
