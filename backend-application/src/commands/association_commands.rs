use tracing::info;

use backend_domain::{normalize_optional_text, DomainId, PlayerAssociation};

use crate::queries::storage_failure;
use crate::{AppError, AppState};

/// Binds a game reference on one server to a domain player.
pub async fn register_association(
    state: &AppState,
    domain: &DomainId,
    association: PlayerAssociation,
) -> Result<PlayerAssociation, AppError> {
    let required = |value: String, field: &str| {
        normalize_optional_text(Some(value)).ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
    };
    let association = PlayerAssociation {
        id: required(association.id, "id")?,
        player_id: required(association.player_id, "player_id")?,
        game_server_id: required(association.game_server_id, "game_server_id")?,
        game_id: required(association.game_id, "game_id")?,
    };
    state
        .association_repo
        .upsert_association(domain, &association)
        .await
        .map_err(|err| storage_failure(state, "failed to store player association", err))?;
    info!(
        domain = %domain,
        association_id = %association.id,
        "registered player {} on {}",
        association.player_id,
        association.game_server_id
    );
    Ok(association)
}
