use std::sync::Arc;

use anyhow::Result;
use clickhouse::Client;
use tracing::{info, warn};

use backend_application::{AppState, Metrics, PlayerLocks};
use backend_domain::ports::{
    InventoryRepository,
    InventorySnapshotCache,
    ItemCatalog,
    LocationRepository,
    PartitionCoordinator,
    PlayerAssociationRepository,
};
use backend_domain::{DbConfig, RuntimeConfig};
use backend_infrastructure::{
    AppConfig,
    ClickhouseRepo,
    DefaultHealthService,
    FileItemCatalog,
    MemorySnapshotCache,
    MemoryTrackingStore,
    StorageBackend,
    SystemClock,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let item_catalog = Arc::new(FileItemCatalog::load(&config.item_catalog_path).await?);
        let snapshot_cache = Arc::new(MemorySnapshotCache::new());

        let state = match config.storage_backend {
            StorageBackend::Clickhouse => {
                let repo = Arc::new(connect_clickhouse(&config.to_db_config()).await?);
                assemble_state(runtime_config, repo, item_catalog, snapshot_cache)
            }
            StorageBackend::Memory => {
                warn!("memory storage backend selected, tracking data is lost on restart");
                let store = Arc::new(MemoryTrackingStore::new());
                assemble_state(runtime_config, store, item_catalog, snapshot_cache)
            }
        };
        info!("storage backend: {}", config.storage_backend);

        Ok(Self { state })
    }
}

async fn connect_clickhouse(db_config: &DbConfig) -> Result<ClickhouseRepo> {
    let mut clickhouse = Client::default()
        .with_url(&db_config.clickhouse_url)
        .with_database(&db_config.clickhouse_database);
    if let Some(user) = &db_config.clickhouse_user {
        clickhouse = clickhouse.with_user(user);
    }
    if let Some(password) = &db_config.clickhouse_password {
        clickhouse = clickhouse.with_password(password);
    }

    let repo = ClickhouseRepo::new(clickhouse, db_config.clickhouse_database.clone());
    repo.ensure_schema().await?;
    Ok(repo)
}

fn assemble_state<S>(
    config: RuntimeConfig,
    store: Arc<S>,
    item_catalog: Arc<dyn ItemCatalog>,
    snapshot_cache: Arc<dyn InventorySnapshotCache>,
) -> AppState
where
    S: LocationRepository
        + InventoryRepository
        + PlayerAssociationRepository
        + PartitionCoordinator
        + 'static,
{
    AppState {
        config,
        location_repo: store.clone(),
        inventory_repo: store.clone(),
        association_repo: store.clone(),
        partitions: store.clone(),
        item_catalog,
        snapshot_cache: snapshot_cache.clone(),
        clock: Arc::new(SystemClock),
        health: Arc::new(DefaultHealthService::new(store, snapshot_cache)),
        player_locks: Arc::new(PlayerLocks::default()),
        metrics: Arc::new(Metrics::default()),
    }
}

#[cfg(test)]
mod tests {
    use backend_domain::ports::HealthCheckService;

    use super::*;

    #[tokio::test]
    async fn memory_backend_starts_without_external_services() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            storage_backend: StorageBackend::Memory,
            item_catalog_path: dir.path().join("catalog.json").to_string_lossy().to_string(),
            ..AppConfig::default()
        };

        let context = AppContext::new(&config).await.unwrap();
        assert!(context.state.health.check_database().await.unwrap());
        assert!(context.state.health.check_cache().await.unwrap());
        assert_eq!(context.state.config.default_domain, "default");
    }
}
