use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use backend_application::commands::ingest_commands;
use backend_application::AppState;

use crate::error::HttpError;
use crate::middleware::{authorized_domain, parse_envelope};

pub async fn ingest_observations(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Response, HttpError> {
    let domain = authorized_domain(&state.config, &headers)?;

    let envelope = parse_envelope(&headers, &body).map_err(|err| {
        error!("failed to parse ingest body: {}", err);
        HttpError::BadRequest(err.to_string())
    })?;
    if envelope.locations.is_empty() && envelope.inventories.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let summary = ingest_commands::process_observations(&state, &domain, envelope).await?;
    Ok(Json(summary).into_response())
}
