use std::sync::Arc;

use async_trait::async_trait;
use backend_domain::ports::{HealthCheckService, InventoryRepository, InventorySnapshotCache};

pub struct DefaultHealthService {
    inventory_repo: Arc<dyn InventoryRepository>,
    snapshot_cache: Arc<dyn InventorySnapshotCache>,
}

impl DefaultHealthService {
    pub fn new(
        inventory_repo: Arc<dyn InventoryRepository>,
        snapshot_cache: Arc<dyn InventorySnapshotCache>,
    ) -> Self {
        Self {
            inventory_repo,
            snapshot_cache,
        }
    }
}

#[async_trait]
impl HealthCheckService for DefaultHealthService {
    async fn check_database(&self) -> anyhow::Result<bool> {
        self.inventory_repo.ping().await.map(|_| true)
    }

    async fn check_cache(&self) -> anyhow::Result<bool> {
        self.snapshot_cache.ping().await.map(|_| true)
    }
}
