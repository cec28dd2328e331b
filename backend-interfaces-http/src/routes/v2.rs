use axum::routing::{get, post, put};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{ingest_handlers, ops_handlers, record_handlers, tracking_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v2/ingest/observations",
            post(ingest_handlers::ingest_observations),
        )
        .route(
            "/v2/tracking/movement-history",
            post(tracking_handlers::movement_history),
        )
        .route("/v2/tracking/bounding-box", post(tracking_handlers::bounding_box))
        .route("/v2/tracking/radius", post(tracking_handlers::radius))
        .route(
            "/v2/tracking/inventory-history",
            post(tracking_handlers::inventory_history),
        )
        .route("/v2/tracking/inventory-at", post(tracking_handlers::inventory_at))
        .route(
            "/v2/tracking/players-by-item",
            post(tracking_handlers::players_by_item),
        )
        .route(
            "/v2/tracking/records",
            get(record_handlers::list_records).post(record_handlers::create_record),
        )
        .route(
            "/v2/tracking/records/:id",
            get(record_handlers::get_record)
                .put(record_handlers::update_record)
                .delete(record_handlers::delete_record),
        )
        .route(
            "/v2/ops/retention/location",
            post(ops_handlers::retention_location),
        )
        .route(
            "/v2/ops/retention/inventory",
            post(ops_handlers::retention_inventory),
        )
        .route("/v2/ops/associations", put(ops_handlers::register_association))
        .route("/v2/ops/health/live", get(ops_handlers::health_live))
        .route("/v2/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v2/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .fallback(ops_handlers::not_found)
        .with_state(state)
}
