use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::entities::{
    BoundingBoxQuery,
    InventoryBaselineRow,
    InventoryDiffRow,
    LocationSample,
    MovementFilter,
    PlayerAssociation,
    PlayerLocation,
    RadiusQuery,
    TimeRange,
};
use crate::value_objects::{DomainId, SeriesKind};

/// Guarantees a dated write target exists. Idempotent.
#[async_trait]
pub trait PartitionCoordinator: Send + Sync {
    async fn ensure_partition(&self, series: SeriesKind, date: NaiveDate) -> anyhow::Result<()>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn insert_location(&self, domain: &DomainId, sample: &LocationSample) -> anyhow::Result<()>;
    /// Newest first, distinct, capped at `filter.limit`.
    async fn fetch_movement_history(
        &self,
        domain: &DomainId,
        filter: &MovementFilter,
    ) -> anyhow::Result<Vec<PlayerLocation>>;
    async fn fetch_in_bounding_box(
        &self,
        domain: &DomainId,
        query: &BoundingBoxQuery,
    ) -> anyhow::Result<Vec<PlayerLocation>>;
    /// The distance predicate is evaluated by the store.
    async fn fetch_in_radius(
        &self,
        domain: &DomainId,
        query: &RadiusQuery,
    ) -> anyhow::Result<Vec<PlayerLocation>>;
    async fn delete_locations_before(
        &self,
        domain: &DomainId,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn insert_baseline(&self, domain: &DomainId, rows: &[InventoryBaselineRow]) -> anyhow::Result<()>;
    async fn insert_diffs(&self, domain: &DomainId, rows: &[InventoryDiffRow]) -> anyhow::Result<()>;
    /// Id of the most recent baseline group observed at or before `at`.
    async fn find_anchor_baseline(
        &self,
        domain: &DomainId,
        association_id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<String>>;
    /// Rows of the anchor group plus every baseline row inside `range`.
    async fn fetch_baselines(
        &self,
        domain: &DomainId,
        association_id: &str,
        anchor_baseline_id: Option<&str>,
        range: TimeRange,
    ) -> anyhow::Result<Vec<InventoryBaselineRow>>;
    async fn fetch_diffs(
        &self,
        domain: &DomainId,
        association_id: &str,
        range: TimeRange,
    ) -> anyhow::Result<Vec<InventoryDiffRow>>;
    async fn fetch_baselines_by_item(
        &self,
        domain: &DomainId,
        item_id: &str,
        range: TimeRange,
    ) -> anyhow::Result<Vec<InventoryBaselineRow>>;
    /// Only `added` and `changed` rows.
    async fn fetch_presence_diffs_by_item(
        &self,
        domain: &DomainId,
        item_id: &str,
        range: TimeRange,
    ) -> anyhow::Result<Vec<InventoryDiffRow>>;
    /// Deletes baseline and diff rows older than `cutoff`, returns the total.
    async fn delete_inventory_before(
        &self,
        domain: &DomainId,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<u64>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait PlayerAssociationRepository: Send + Sync {
    async fn find_association(
        &self,
        domain: &DomainId,
        game_id: &str,
        game_server_id: &str,
    ) -> anyhow::Result<Option<String>>;
    async fn find_by_player(
        &self,
        domain: &DomainId,
        player_id: &str,
        game_server_id: &str,
    ) -> anyhow::Result<Option<PlayerAssociation>>;
    async fn upsert_association(
        &self,
        domain: &DomainId,
        association: &PlayerAssociation,
    ) -> anyhow::Result<()>;
    async fn list_domains(&self) -> anyhow::Result<Vec<DomainId>>;
}
