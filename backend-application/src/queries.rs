use tracing::error;

use crate::{AppError, AppState};

pub mod inventory_history_queries;
pub mod item_search_queries;
pub mod movement_queries;
pub mod spatial_queries;

/// Logs a storage failure, counts it and wraps it for the caller.
pub(crate) fn storage_failure(state: &AppState, context: &str, err: anyhow::Error) -> AppError {
    error!("{}: {}", context, err);
    state.metrics.record_query_error();
    AppError::Internal(err.context(context.to_string()))
}
