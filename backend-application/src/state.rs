use std::sync::Arc;

use backend_domain::ports::{
    Clock,
    HealthCheckService,
    InventoryRepository,
    InventorySnapshotCache,
    ItemCatalog,
    LocationRepository,
    PartitionCoordinator,
    PlayerAssociationRepository,
};
use backend_domain::RuntimeConfig;

use crate::{Metrics, PlayerLocks};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub location_repo: Arc<dyn LocationRepository>,
    pub inventory_repo: Arc<dyn InventoryRepository>,
    pub association_repo: Arc<dyn PlayerAssociationRepository>,
    pub partitions: Arc<dyn PartitionCoordinator>,
    pub item_catalog: Arc<dyn ItemCatalog>,
    pub snapshot_cache: Arc<dyn InventorySnapshotCache>,
    pub clock: Arc<dyn Clock>,
    pub health: Arc<dyn HealthCheckService>,
    pub player_locks: Arc<PlayerLocks>,
    pub metrics: Arc<Metrics>,
}
