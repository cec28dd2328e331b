#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use backend_application::{AppState, Metrics, PlayerLocks};
use backend_domain::ports::{Clock, PlayerAssociationRepository};
use backend_domain::{DomainId, ItemDefinition, PlayerAssociation, RuntimeConfig};
use backend_infrastructure::{DefaultHealthService, FileItemCatalog, MemorySnapshotCache, MemoryTrackingStore};

pub const SERVER: &str = "gs-1";

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn hour(h: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryTrackingStore>,
    pub clock: Arc<ManualClock>,
    pub domain: DomainId,
}

impl Harness {
    pub fn new(config: RuntimeConfig) -> Self {
        let store = Arc::new(MemoryTrackingStore::new());
        let clock = Arc::new(ManualClock::new(hour(0)));
        let catalog = FileItemCatalog::from_entries(
            ["A", "B", "C", "wood", "stone"]
                .iter()
                .map(|code| ItemDefinition {
                    id: format!("item-{code}"),
                    code: code.to_string(),
                    game_server_id: SERVER.to_string(),
                    domain: None,
                    name: Some(format!("Item {code}")),
                    description: None,
                })
                .collect(),
        );
        let snapshot_cache = Arc::new(MemorySnapshotCache::new());
        let state = AppState {
            config,
            location_repo: store.clone(),
            inventory_repo: store.clone(),
            association_repo: store.clone(),
            partitions: store.clone(),
            item_catalog: Arc::new(catalog),
            snapshot_cache: snapshot_cache.clone(),
            clock: clock.clone(),
            health: Arc::new(DefaultHealthService::new(store.clone(), snapshot_cache)),
            player_locks: Arc::new(PlayerLocks::default()),
            metrics: Arc::new(Metrics::default()),
        };
        Self {
            state,
            store,
            clock,
            domain: DomainId::from("tenant-a"),
        }
    }

    /// Registers `P{n}` on the default server as association `assoc-{n}`.
    pub async fn register(&self, n: usize) -> String {
        let association = PlayerAssociation {
            id: format!("assoc-{n}"),
            player_id: format!("P{n}"),
            game_server_id: SERVER.to_string(),
            game_id: format!("game-{n}"),
        };
        self.store
            .upsert_association(&self.domain, &association)
            .await
            .unwrap();
        association.id
    }
}

pub fn config_with_interval(hours: u64) -> RuntimeConfig {
    RuntimeConfig {
        baseline_interval_seconds: hours * 3600,
        snapshot_ttl_seconds: 7 * 24 * 3600,
        ..RuntimeConfig::default()
    }
}
