use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{InventoryItem, ItemDefinition};
use crate::value_objects::DomainId;

#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// Unknown codes are simply absent from the result.
    async fn resolve_items_by_code(
        &self,
        domain: &DomainId,
        codes: &[String],
        game_server_id: &str,
    ) -> anyhow::Result<Vec<ItemDefinition>>;
    async fn find_items_by_ids(
        &self,
        domain: &DomainId,
        ids: &[String],
    ) -> anyhow::Result<Vec<ItemDefinition>>;
}

/// Last observed raw inventory per player, held with a TTL.
#[async_trait]
pub trait InventorySnapshotCache: Send + Sync {
    async fn get_inventory(
        &self,
        domain: &DomainId,
        association_id: &str,
    ) -> anyhow::Result<Option<Vec<InventoryItem>>>;
    async fn set_inventory(
        &self,
        domain: &DomainId,
        association_id: &str,
        items: &[InventoryItem],
        ttl: Duration,
    ) -> anyhow::Result<()>;
    async fn get_last_baseline(
        &self,
        domain: &DomainId,
        association_id: &str,
    ) -> anyhow::Result<Option<DateTime<Utc>>>;
    async fn set_last_baseline(
        &self,
        domain: &DomainId,
        association_id: &str,
        at: DateTime<Utc>,
        ttl: Duration,
    ) -> anyhow::Result<()>;
    async fn ping(&self) -> anyhow::Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[async_trait]
pub trait HealthCheckService: Send + Sync {
    async fn check_database(&self) -> anyhow::Result<bool>;
    async fn check_cache(&self) -> anyhow::Result<bool>;
}
