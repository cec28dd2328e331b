use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{DbConfig, RuntimeConfig, MAX_SNAPSHOT_TTL_SECONDS};

const ENV_PREFIX: &str = "TELEMETRY_";
const DEFAULT_CONFIG_PATH: &str = "./config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Clickhouse,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "clickhouse" => Ok(StorageBackend::Clickhouse),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage_backend '{}'", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Clickhouse => f.write_str("clickhouse"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub default_domain: String,
    pub storage_backend: StorageBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub item_catalog_path: String,
    pub baseline_interval_seconds: u64,
    pub snapshot_ttl_seconds: u64,
    pub location_retention_days: u32,
    pub inventory_retention_days: u32,
    pub retention_hour: u32,
    pub retention_minute: u32,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            bind_addr: runtime.bind_addr,
            api_token: None,
            default_domain: runtime.default_domain,
            storage_backend: StorageBackend::Clickhouse,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "telemetry".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            item_catalog_path: "./item_catalog.json".to_string(),
            baseline_interval_seconds: runtime.baseline_interval_seconds,
            snapshot_ttl_seconds: runtime.snapshot_ttl_seconds,
            location_retention_days: runtime.location_retention_days,
            inventory_retention_days: runtime.inventory_retention_days,
            retention_hour: runtime.retention_hour,
            retention_minute: runtime.retention_minute,
            max_body_bytes: runtime.max_body_bytes,
            request_timeout_seconds: runtime.request_timeout_seconds,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads from `TELEMETRY_CONFIG` (or `./config.toml`).
    pub async fn load() -> Result<Self> {
        let path = env::var("TELEMETRY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &str) -> Result<Self> {
        let file_path = Path::new(path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.api_token = normalize_secret(self.api_token.take());
        self.clickhouse_user = normalize_secret(self.clickhouse_user.take());
        self.clickhouse_password = normalize_secret(self.clickhouse_password.take());
        self.log_dir = normalize_secret(self.log_dir.take());
        self.default_domain = self.default_domain.trim().to_string();
        self.clickhouse_url = self.clickhouse_url.trim().trim_end_matches('/').to_string();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.item_catalog_path = resolve_path(base, &self.item_catalog_path);
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.default_domain.is_empty() {
            return Err(anyhow!("default_domain must not be empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.baseline_interval_seconds == 0 {
            return Err(anyhow!("baseline_interval_seconds must be greater than 0"));
        }
        if self.snapshot_ttl_seconds == 0 || self.snapshot_ttl_seconds > MAX_SNAPSHOT_TTL_SECONDS {
            return Err(anyhow!(
                "snapshot_ttl_seconds must be between 1 and {}",
                MAX_SNAPSHOT_TTL_SECONDS
            ));
        }
        if self.location_retention_days == 0 || self.inventory_retention_days == 0 {
            return Err(anyhow!("retention days must be greater than 0"));
        }
        if self.retention_hour > 23 || self.retention_minute > 59 {
            return Err(anyhow!("retention_hour or retention_minute out of range"));
        }
        if self.storage_backend == StorageBackend::Clickhouse && self.clickhouse_url.is_empty() {
            return Err(anyhow!("clickhouse_url must not be empty"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            default_domain: self.default_domain.clone(),
            baseline_interval_seconds: self.baseline_interval_seconds,
            snapshot_ttl_seconds: self.snapshot_ttl_seconds,
            location_retention_days: self.location_retention_days,
            inventory_retention_days: self.inventory_retention_days,
            retention_hour: self.retention_hour,
            retention_minute: self.retention_minute,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(format!("{ENV_PREFIX}{key}")).ok());
    }

    /// Unparseable numeric values keep the current setting and log a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Some(value) = lookup("DEFAULT_DOMAIN") {
            self.default_domain = value;
        }
        if let Some(value) = lookup("STORAGE_BACKEND") {
            match value.parse() {
                Ok(backend) => self.storage_backend = backend,
                Err(err) => warn!("ignoring TELEMETRY_STORAGE_BACKEND: {}", err),
            }
        }
        if let Some(value) = lookup("CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Some(value) = lookup("CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Some(value) = lookup("CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Some(value) = lookup("CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Some(value) = lookup("ITEM_CATALOG_PATH") {
            self.item_catalog_path = value;
        }
        if let Some(value) = lookup("BASELINE_INTERVAL_SECONDS") {
            self.baseline_interval_seconds = parse_override("BASELINE_INTERVAL_SECONDS", &value, self.baseline_interval_seconds);
        }
        if let Some(value) = lookup("SNAPSHOT_TTL_SECONDS") {
            self.snapshot_ttl_seconds = parse_override("SNAPSHOT_TTL_SECONDS", &value, self.snapshot_ttl_seconds);
        }
        if let Some(value) = lookup("LOCATION_RETENTION_DAYS") {
            self.location_retention_days = parse_override("LOCATION_RETENTION_DAYS", &value, self.location_retention_days);
        }
        if let Some(value) = lookup("INVENTORY_RETENTION_DAYS") {
            self.inventory_retention_days = parse_override("INVENTORY_RETENTION_DAYS", &value, self.inventory_retention_days);
        }
        if let Some(value) = lookup("RETENTION_HOUR") {
            self.retention_hour = parse_override("RETENTION_HOUR", &value, self.retention_hour);
        }
        if let Some(value) = lookup("RETENTION_MINUTE") {
            self.retention_minute = parse_override("RETENTION_MINUTE", &value, self.retention_minute);
        }
        if let Some(value) = lookup("MAX_BODY_BYTES") {
            self.max_body_bytes = parse_override("MAX_BODY_BYTES", &value, self.max_body_bytes);
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = parse_override("REQUEST_TIMEOUT_SECONDS", &value, self.request_timeout_seconds);
        }
        if let Some(value) = lookup("LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

/// Unparseable values keep `current` and are reported.
fn parse_override<T: FromStr + Copy>(key: &str, value: &str, current: T) -> T {
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!("ignoring {}{}={:?}: not a valid number", ENV_PREFIX, key, value);
            current
        }
    }
}

fn normalize_secret(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
