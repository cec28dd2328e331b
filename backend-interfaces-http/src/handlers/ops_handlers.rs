use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tokio::time::{timeout, Duration};
use tracing::error;

use backend_application::commands::{association_commands, retention_commands};
use backend_application::AppState;
use backend_domain::{PlayerAssociation, RetentionRequest, RetentionResult};

use crate::error::HttpError;
use crate::middleware::{authorize, authorized_domain};

pub async fn retention_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RetentionRequest>,
) -> Result<Json<RetentionResult>, HttpError> {
    let domain = authorized_domain(&state.config, &headers)?;
    let result = retention_commands::cleanup_location(&state, &domain, request.cutoff).await?;
    Ok(Json(result))
}

pub async fn retention_inventory(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RetentionRequest>,
) -> Result<Json<RetentionResult>, HttpError> {
    let domain = authorized_domain(&state.config, &headers)?;
    let result = retention_commands::cleanup_inventory(&state, &domain, request.cutoff).await?;
    Ok(Json(result))
}

pub async fn register_association(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PlayerAssociation>,
) -> Result<Json<PlayerAssociation>, HttpError> {
    let domain = authorized_domain(&state.config, &headers)?;
    let stored = association_commands::register_association(&state, &domain, payload).await?;
    Ok(Json(stored))
}

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let timeout_duration = Duration::from_secs(timeout_secs);
    let checks = async {
        state.health.check_database().await?;
        state.health.check_cache().await
    };
    match timeout(timeout_duration, checks).await {
        Ok(Ok(_)) => StatusCode::OK,
        Ok(Err(err)) => {
            error!("ready check failed: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(_) => {
            error!("ready check timeout after {}s", timeout_secs);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}

pub async fn not_found() -> HttpError {
    HttpError::NotFound
}
