use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    location_observations: AtomicU64,
    inventory_observations: AtomicU64,
    inventory_baselines: AtomicU64,
    inventory_diff_rows: AtomicU64,
    inventory_unchanged: AtomicU64,
    inventory_errors: AtomicU64,
    ingest_dropped: AtomicU64,
    query_errors: AtomicU64,
}

impl Metrics {
    pub fn record_location(&self) {
        self.location_observations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_baseline(&self) {
        self.inventory_observations.fetch_add(1, Ordering::Relaxed);
        self.inventory_baselines.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_diff(&self, row_count: usize) {
        self.inventory_observations.fetch_add(1, Ordering::Relaxed);
        self.inventory_diff_rows
            .fetch_add(row_count as u64, Ordering::Relaxed);
    }

    pub fn record_unchanged(&self) {
        self.inventory_observations.fetch_add(1, Ordering::Relaxed);
        self.inventory_unchanged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inventory_error(&self) {
        self.inventory_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingest_dropped(&self, count: usize) {
        self.ingest_dropped.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_query_error(&self) {
        self.query_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inventory_errors(&self) -> u64 {
        self.inventory_errors.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let locations = self.location_observations.load(Ordering::Relaxed);
        let inventories = self.inventory_observations.load(Ordering::Relaxed);
        let baselines = self.inventory_baselines.load(Ordering::Relaxed);
        let diff_rows = self.inventory_diff_rows.load(Ordering::Relaxed);
        let unchanged = self.inventory_unchanged.load(Ordering::Relaxed);
        let inventory_errors = self.inventory_errors.load(Ordering::Relaxed);
        let dropped = self.ingest_dropped.load(Ordering::Relaxed);
        let query_errors = self.query_errors.load(Ordering::Relaxed);

        format!(
            "# TYPE telemetry_location_observations_total counter\n\
telemetry_location_observations_total {}\n\
# TYPE telemetry_inventory_observations_total counter\n\
telemetry_inventory_observations_total {}\n\
# TYPE telemetry_inventory_baselines_total counter\n\
telemetry_inventory_baselines_total {}\n\
# TYPE telemetry_inventory_diff_rows_total counter\n\
telemetry_inventory_diff_rows_total {}\n\
# TYPE telemetry_inventory_unchanged_total counter\n\
telemetry_inventory_unchanged_total {}\n\
# TYPE telemetry_inventory_errors_total counter\n\
telemetry_inventory_errors_total {}\n\
# TYPE telemetry_ingest_dropped_total counter\n\
telemetry_ingest_dropped_total {}\n\
# TYPE telemetry_query_errors_total counter\n\
telemetry_query_errors_total {}\n",
            locations, inventories, baselines, diff_rows, unchanged, inventory_errors, dropped, query_errors
        )
    }
}
