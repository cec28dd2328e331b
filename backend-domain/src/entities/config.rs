// Runtime configuration handed to the application layer

const MAX_BASELINE_INTERVAL_SECONDS: u64 = 10 * 365 * 24 * 3600;
/// Longest snapshot lifetime accepted from configuration.
pub const MAX_SNAPSHOT_TTL_SECONDS: u64 = 365 * 24 * 3600;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub default_domain: String,
    pub baseline_interval_seconds: u64,
    pub snapshot_ttl_seconds: u64,
    pub location_retention_days: u32,
    pub inventory_retention_days: u32,
    pub retention_hour: u32,
    pub retention_minute: u32,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl RuntimeConfig {
    pub fn baseline_interval(&self) -> chrono::Duration {
        let seconds = self.baseline_interval_seconds.min(MAX_BASELINE_INTERVAL_SECONDS);
        chrono::Duration::seconds(seconds as i64)
    }

    pub fn snapshot_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.snapshot_ttl_seconds.min(MAX_SNAPSHOT_TTL_SECONDS))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3234".to_string(),
            api_token: None,
            default_domain: "default".to_string(),
            baseline_interval_seconds: 3600,
            snapshot_ttl_seconds: 3600,
            location_retention_days: 7,
            inventory_retention_days: 30,
            retention_hour: 3,
            retention_minute: 15,
            max_body_bytes: 8 * 1024 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
}
