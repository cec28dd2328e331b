use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;

use backend_domain::ports::{
    InventoryRepository,
    LocationRepository,
    PartitionCoordinator,
    PlayerAssociationRepository,
};
use backend_domain::{
    in_bounding_box,
    in_radius,
    partition_date,
    BoundingBoxQuery,
    DomainId,
    InventoryBaselineRow,
    InventoryDiffRow,
    LocationSample,
    MovementFilter,
    PlayerAssociation,
    PlayerLocation,
    RadiusQuery,
    SeriesKind,
    TimeRange,
};

#[derive(Default)]
struct Tables {
    partitions: HashSet<(SeriesKind, NaiveDate)>,
    locations: Vec<(DomainId, LocationSample)>,
    baselines: Vec<(DomainId, InventoryBaselineRow)>,
    diffs: Vec<(DomainId, InventoryDiffRow)>,
    associations: Vec<(DomainId, PlayerAssociation)>,
}

impl Tables {
    fn require_partition(&self, series: SeriesKind, at: DateTime<Utc>) -> Result<()> {
        let date = partition_date(at);
        if self.partitions.contains(&(series, date)) {
            Ok(())
        } else {
            Err(anyhow!("no {} partition for {}", series.as_str(), date))
        }
    }

    fn association(&self, domain: &DomainId, id: &str) -> Option<&PlayerAssociation> {
        self.associations
            .iter()
            .find(|(d, association)| d == domain && association.id == id)
            .map(|(_, association)| association)
    }

    /// Samples joined through their association, newest first, duplicates removed.
    fn player_locations(
        &self,
        domain: &DomainId,
        keep: impl Fn(&LocationSample, &PlayerAssociation) -> bool,
    ) -> Vec<PlayerLocation> {
        let mut rows = self
            .locations
            .iter()
            .filter(|(d, _)| d == domain)
            .filter_map(|(_, sample)| {
                let association = self.association(domain, &sample.association_id)?;
                keep(sample, association).then(|| PlayerLocation {
                    association_id: sample.association_id.clone(),
                    player_id: association.player_id.clone(),
                    game_server_id: association.game_server_id.clone(),
                    x: sample.x,
                    y: sample.y,
                    z: sample.z,
                    dimension: sample.dimension.clone(),
                    observed_at: sample.observed_at,
                })
            })
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| {
            b.observed_at
                .cmp(&a.observed_at)
                .then_with(|| a.association_id.cmp(&b.association_id))
        });
        rows.dedup();
        rows
    }
}

/// Process-local tracking store. Writes into a day that was never ensured
/// fail, the same contract the partitioned database enforces.
#[derive(Default)]
pub struct MemoryTrackingStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
    reads: AtomicU64,
}

impl MemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of read calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub async fn ensured_partitions(&self) -> Vec<(SeriesKind, NaiveDate)> {
        let mut partitions = self.tables.read().await.partitions.iter().copied().collect::<Vec<_>>();
        partitions.sort_by_key(|(series, date)| (series.as_str(), *date));
        partitions
    }

    pub async fn location_count(&self) -> usize {
        self.tables.read().await.locations.len()
    }

    pub async fn baseline_rows(&self, domain: &DomainId) -> Vec<InventoryBaselineRow> {
        scoped(&self.tables.read().await.baselines, domain)
    }

    pub async fn diff_rows(&self, domain: &DomainId) -> Vec<InventoryDiffRow> {
        scoped(&self.tables.read().await.diffs, domain)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(anyhow!("tracking store unavailable"));
        }
        Ok(())
    }

    fn begin_read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_online()
    }
}

fn scoped<T: Clone>(rows: &[(DomainId, T)], domain: &DomainId) -> Vec<T> {
    rows.iter()
        .filter(|(d, _)| d == domain)
        .map(|(_, row)| row.clone())
        .collect()
}

fn newest_first<T>(rows: &mut [T], observed_at: impl Fn(&T) -> DateTime<Utc>) {
    rows.sort_by(|a, b| observed_at(b).cmp(&observed_at(a)));
}

#[async_trait]
impl PartitionCoordinator for MemoryTrackingStore {
    async fn ensure_partition(&self, series: SeriesKind, date: NaiveDate) -> Result<()> {
        self.check_online()?;
        self.tables.write().await.partitions.insert((series, date));
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for MemoryTrackingStore {
    async fn insert_location(&self, domain: &DomainId, sample: &LocationSample) -> Result<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        tables.require_partition(SeriesKind::Location, sample.observed_at)?;
        tables.locations.push((domain.clone(), sample.clone()));
        Ok(())
    }

    async fn fetch_movement_history(
        &self,
        domain: &DomainId,
        filter: &MovementFilter,
    ) -> Result<Vec<PlayerLocation>> {
        self.begin_read()?;
        let range = TimeRange::new(Some(filter.start), filter.end);
        let mut rows = self.tables.read().await.player_locations(domain, |sample, association| {
            range.contains(sample.observed_at)
                && (filter.player_ids.is_empty() || filter.player_ids.contains(&association.player_id))
        });
        rows.truncate(filter.limit);
        Ok(rows)
    }

    async fn fetch_in_bounding_box(
        &self,
        domain: &DomainId,
        query: &BoundingBoxQuery,
    ) -> Result<Vec<PlayerLocation>> {
        self.begin_read()?;
        let range = query.time_range();
        Ok(self.tables.read().await.player_locations(domain, |sample, association| {
            association.game_server_id == query.game_server_id
                && range.contains(sample.observed_at)
                && in_bounding_box(query, sample.x, sample.y, sample.z)
        }))
    }

    async fn fetch_in_radius(&self, domain: &DomainId, query: &RadiusQuery) -> Result<Vec<PlayerLocation>> {
        self.begin_read()?;
        let range = query.time_range();
        Ok(self.tables.read().await.player_locations(domain, |sample, association| {
            association.game_server_id == query.game_server_id
                && range.contains(sample.observed_at)
                && in_radius(query, sample.x, sample.y, sample.z)
        }))
    }

    async fn delete_locations_before(&self, domain: &DomainId, cutoff: DateTime<Utc>) -> Result<u64> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        let before = tables.locations.len();
        tables
            .locations
            .retain(|(d, sample)| d != domain || sample.observed_at >= cutoff);
        Ok((before - tables.locations.len()) as u64)
    }
}

#[async_trait]
impl InventoryRepository for MemoryTrackingStore {
    async fn insert_baseline(&self, domain: &DomainId, rows: &[InventoryBaselineRow]) -> Result<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        for row in rows {
            tables.require_partition(SeriesKind::InventoryBaseline, row.observed_at)?;
        }
        tables
            .baselines
            .extend(rows.iter().map(|row| (domain.clone(), row.clone())));
        Ok(())
    }

    async fn insert_diffs(&self, domain: &DomainId, rows: &[InventoryDiffRow]) -> Result<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        for row in rows {
            tables.require_partition(SeriesKind::InventoryDiff, row.observed_at)?;
        }
        tables
            .diffs
            .extend(rows.iter().map(|row| (domain.clone(), row.clone())));
        Ok(())
    }

    async fn find_anchor_baseline(
        &self,
        domain: &DomainId,
        association_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .baselines
            .iter()
            .filter(|(d, row)| d == domain && row.association_id == association_id && row.observed_at <= at)
            .max_by_key(|(_, row)| row.observed_at)
            .map(|(_, row)| row.baseline_id.clone()))
    }

    async fn fetch_baselines(
        &self,
        domain: &DomainId,
        association_id: &str,
        anchor_baseline_id: Option<&str>,
        range: TimeRange,
    ) -> Result<Vec<InventoryBaselineRow>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let mut rows = tables
            .baselines
            .iter()
            .filter(|(d, row)| d == domain && row.association_id == association_id)
            .filter(|(_, row)| {
                anchor_baseline_id == Some(row.baseline_id.as_str()) || range.contains(row.observed_at)
            })
            .map(|(_, row)| row.clone())
            .collect::<Vec<_>>();
        newest_first(&mut rows, |row| row.observed_at);
        Ok(rows)
    }

    async fn fetch_diffs(
        &self,
        domain: &DomainId,
        association_id: &str,
        range: TimeRange,
    ) -> Result<Vec<InventoryDiffRow>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let mut rows = tables
            .diffs
            .iter()
            .filter(|(d, row)| d == domain && row.association_id == association_id && range.contains(row.observed_at))
            .map(|(_, row)| row.clone())
            .collect::<Vec<_>>();
        newest_first(&mut rows, |row| row.observed_at);
        Ok(rows)
    }

    async fn fetch_baselines_by_item(
        &self,
        domain: &DomainId,
        item_id: &str,
        range: TimeRange,
    ) -> Result<Vec<InventoryBaselineRow>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let mut rows = tables
            .baselines
            .iter()
            .filter(|(d, row)| d == domain && row.item_id == item_id && range.contains(row.observed_at))
            .map(|(_, row)| row.clone())
            .collect::<Vec<_>>();
        newest_first(&mut rows, |row| row.observed_at);
        Ok(rows)
    }

    async fn fetch_presence_diffs_by_item(
        &self,
        domain: &DomainId,
        item_id: &str,
        range: TimeRange,
    ) -> Result<Vec<InventoryDiffRow>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let mut rows = tables
            .diffs
            .iter()
            .filter(|(d, row)| {
                d == domain
                    && row.item_id == item_id
                    && row.change_type.signals_presence()
                    && range.contains(row.observed_at)
            })
            .map(|(_, row)| row.clone())
            .collect::<Vec<_>>();
        newest_first(&mut rows, |row| row.observed_at);
        Ok(rows)
    }

    async fn delete_inventory_before(&self, domain: &DomainId, cutoff: DateTime<Utc>) -> Result<u64> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        let before = tables.baselines.len() + tables.diffs.len();
        tables
            .baselines
            .retain(|(d, row)| d != domain || row.observed_at >= cutoff);
        tables
            .diffs
            .retain(|(d, row)| d != domain || row.observed_at >= cutoff);
        Ok((before - tables.baselines.len() - tables.diffs.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        self.check_online()
    }
}

#[async_trait]
impl PlayerAssociationRepository for MemoryTrackingStore {
    async fn find_association(
        &self,
        domain: &DomainId,
        game_id: &str,
        game_server_id: &str,
    ) -> Result<Option<String>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .associations
            .iter()
            .find(|(d, a)| d == domain && a.game_id == game_id && a.game_server_id == game_server_id)
            .map(|(_, a)| a.id.clone()))
    }

    async fn find_by_player(
        &self,
        domain: &DomainId,
        player_id: &str,
        game_server_id: &str,
    ) -> Result<Option<PlayerAssociation>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .associations
            .iter()
            .find(|(d, a)| d == domain && a.player_id == player_id && a.game_server_id == game_server_id)
            .map(|(_, a)| a.clone()))
    }

    async fn upsert_association(&self, domain: &DomainId, association: &PlayerAssociation) -> Result<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        tables.associations.retain(|(d, existing)| {
            d != domain
                || (existing.id != association.id
                    && !(existing.game_id == association.game_id
                        && existing.game_server_id == association.game_server_id))
        });
        tables.associations.push((domain.clone(), association.clone()));
        Ok(())
    }

    async fn list_domains(&self) -> Result<Vec<DomainId>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let domains = tables
            .associations
            .iter()
            .map(|(d, _)| d.clone())
            .collect::<BTreeSet<_>>();
        Ok(domains.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn sample(association_id: &str, observed_at: DateTime<Utc>) -> LocationSample {
        LocationSample {
            association_id: association_id.to_string(),
            x: 1.0,
            y: 2.0,
            z: 3.0,
            dimension: None,
            observed_at,
        }
    }

    #[tokio::test]
    async fn writes_need_an_ensured_partition() {
        let store = MemoryTrackingStore::new();
        let domain = DomainId::from("d1");
        assert!(store.insert_location(&domain, &sample("a1", at(1, 5))).await.is_err());

        store
            .ensure_partition(SeriesKind::Location, at(1, 0).date_naive())
            .await
            .unwrap();
        store.insert_location(&domain, &sample("a1", at(1, 5))).await.unwrap();
        assert!(store.insert_location(&domain, &sample("a1", at(2, 5))).await.is_err());
        assert_eq!(store.location_count().await, 1);
    }

    #[tokio::test]
    async fn retention_is_scoped_to_the_domain() {
        let store = MemoryTrackingStore::new();
        for day in [1, 3] {
            store
                .ensure_partition(SeriesKind::Location, at(day, 0).date_naive())
                .await
                .unwrap();
        }
        let d1 = DomainId::from("d1");
        let d2 = DomainId::from("d2");
        store.insert_location(&d1, &sample("a1", at(1, 1))).await.unwrap();
        store.insert_location(&d1, &sample("a1", at(3, 1))).await.unwrap();
        store.insert_location(&d2, &sample("a2", at(1, 1))).await.unwrap();

        assert_eq!(store.delete_locations_before(&d1, at(2, 0)).await.unwrap(), 1);
        assert_eq!(store.location_count().await, 2);
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryTrackingStore::new();
        store.set_offline(true);
        assert!(store.ping().await.is_err());
        assert!(store.list_domains().await.is_err());
        store.set_offline(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn upsert_replaces_the_game_reference() {
        let store = MemoryTrackingStore::new();
        let domain = DomainId::from("d1");
        let mut association = PlayerAssociation {
            id: "a1".to_string(),
            player_id: "p1".to_string(),
            game_server_id: "gs-1".to_string(),
            game_id: "steam-1".to_string(),
        };
        store.upsert_association(&domain, &association).await.unwrap();
        association.player_id = "p2".to_string();
        store.upsert_association(&domain, &association).await.unwrap();

        let found = store.find_by_player(&domain, "p2", "gs-1").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some("a1".to_string()));
        assert!(store.find_by_player(&domain, "p1", "gs-1").await.unwrap().is_none());
        assert_eq!(store.list_domains().await.unwrap(), vec![domain]);
    }
}
