use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::record_commands;
use backend_application::AppState;
use backend_domain::PlayerLocation;

use crate::error::HttpError;
use crate::middleware::authorize;

fn check(state: &AppState, headers: &HeaderMap) -> Result<(), HttpError> {
    if !authorize(&state.config, headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(())
}

pub async fn list_records(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PlayerLocation>>, HttpError> {
    check(&state, &headers)?;
    Ok(Json(record_commands::find_records()?))
}

pub async fn create_record(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlayerLocation>, HttpError> {
    check(&state, &headers)?;
    Ok(Json(record_commands::create_record()?))
}

pub async fn get_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<PlayerLocation>, HttpError> {
    check(&state, &headers)?;
    Ok(Json(record_commands::find_record(&id)?))
}

pub async fn update_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<PlayerLocation>, HttpError> {
    check(&state, &headers)?;
    Ok(Json(record_commands::update_record(&id)?))
}

pub async fn delete_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<bool>, HttpError> {
    check(&state, &headers)?;
    Ok(Json(record_commands::delete_record(&id)?))
}
