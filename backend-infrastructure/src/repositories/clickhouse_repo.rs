use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use clickhouse::query::Query;
use clickhouse::Client;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info};

use backend_domain::ports::{
    InventoryRepository,
    LocationRepository,
    PartitionCoordinator,
    PlayerAssociationRepository,
};
use backend_domain::{
    BoundingBoxQuery,
    ChangeType,
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

use super::clickhouse_rows::{
    AssociationRecord,
    BaselineRecord,
    DiffRecord,
    LocationRecord,
    PlayerLocationRecord,
};

const LOCATION_TABLE: &str = "player_location";
const BASELINE_TABLE: &str = "player_inventory_baseline";
const DIFF_TABLE: &str = "player_inventory_diff";
const ASSOCIATION_TABLE: &str = "player_on_game_server";

const PLAYER_LOCATION_COLUMNS: &str =
    "l.association_id, a.player_id, a.game_server_id, l.x, l.y, l.z, l.dimension, l.observed_at";
const BASELINE_COLUMNS: &str =
    "domain, association_id, baseline_id, item_id, quantity, quality, observed_at";
const DIFF_COLUMNS: &str = "domain, association_id, item_id, change_type, previous_quantity, \
     new_quantity, previous_quality, new_quality, observed_at";

fn series_table(series: SeriesKind) -> &'static str {
    match series {
        SeriesKind::Location => LOCATION_TABLE,
        SeriesKind::InventoryBaseline => BASELINE_TABLE,
        SeriesKind::InventoryDiff => DIFF_TABLE,
    }
}

fn series_ddl(series: SeriesKind) -> &'static str {
    match series {
        SeriesKind::Location => {
            r#"
CREATE TABLE IF NOT EXISTS player_location (
    domain LowCardinality(String),
    association_id String,
    x Float64,
    y Float64,
    z Float64,
    dimension String,
    observed_at DateTime64(3)
) ENGINE = MergeTree
PARTITION BY toDate(observed_at)
ORDER BY (domain, association_id, observed_at)
"#
        }
        SeriesKind::InventoryBaseline => {
            r#"
CREATE TABLE IF NOT EXISTS player_inventory_baseline (
    domain LowCardinality(String),
    association_id String,
    baseline_id String,
    item_id String,
    quantity Int64,
    quality Nullable(String),
    observed_at DateTime64(3)
) ENGINE = MergeTree
PARTITION BY toDate(observed_at)
ORDER BY (domain, association_id, observed_at, item_id)
"#
        }
        SeriesKind::InventoryDiff => {
            r#"
CREATE TABLE IF NOT EXISTS player_inventory_diff (
    domain LowCardinality(String),
    association_id String,
    item_id String,
    change_type LowCardinality(String),
    previous_quantity Nullable(Int64),
    new_quantity Nullable(Int64),
    previous_quality Nullable(String),
    new_quality Nullable(String),
    observed_at DateTime64(3)
) ENGINE = MergeTree
PARTITION BY toDate(observed_at)
ORDER BY (domain, association_id, observed_at, item_id)
"#
        }
    }
}

const ASSOCIATION_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS player_on_game_server (
    domain LowCardinality(String),
    id String,
    player_id String,
    game_server_id String,
    game_id String,
    updated_at DateTime64(3)
) ENGINE = ReplacingMergeTree(updated_at)
ORDER BY (domain, game_server_id, game_id)
"#;

/// Appends `AND column >= ?` / `AND column <= ?` for the bounded ends.
fn range_clause(column: &str, range: TimeRange) -> String {
    let mut clause = String::new();
    if range.start.is_some() {
        clause.push_str(&format!(" AND {column} >= fromUnixTimestamp64Milli(?)"));
    }
    if range.end.is_some() {
        clause.push_str(&format!(" AND {column} <= fromUnixTimestamp64Milli(?)"));
    }
    clause
}

fn bind_range(mut query: Query, range: TimeRange) -> Query {
    if let Some(start) = range.start {
        query = query.bind(start.timestamp_millis());
    }
    if let Some(end) = range.end {
        query = query.bind(end.timestamp_millis());
    }
    query
}

fn association_join(domain_placeholder: &str) -> String {
    format!(
        "INNER JOIN (SELECT id, player_id, game_server_id FROM {ASSOCIATION_TABLE} FINAL \
         WHERE domain = {domain_placeholder}) AS a ON a.id = l.association_id"
    )
}

pub struct ClickhouseRepo {
    client: Client,
    database: String,
    ensured: Mutex<HashSet<SeriesKind>>,
}

impl ClickhouseRepo {
    pub fn new(client: Client, database: String) -> Self {
        Self {
            client,
            database,
            ensured: Mutex::new(HashSet::new()),
        }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;
        self.client.query(ASSOCIATION_DDL).execute().await?;
        for series in SeriesKind::ALL {
            self.client.query(series_ddl(series)).execute().await?;
        }
        self.ensured.lock().await.extend(SeriesKind::ALL);
        info!("clickhouse schema ready in database {}", self.database);
        Ok(())
    }

    async fn fetch_player_locations(
        &self,
        domain: &DomainId,
        filter_sql: &str,
        bind: impl FnOnce(Query) -> Query,
    ) -> Result<Vec<PlayerLocation>> {
        let sql = format!(
            "SELECT DISTINCT {PLAYER_LOCATION_COLUMNS} FROM {LOCATION_TABLE} AS l {} \
             WHERE l.domain = ?{filter_sql} ORDER BY l.observed_at DESC",
            association_join("?")
        );
        let query = self
            .client
            .query(&sql)
            .bind(domain.as_str())
            .bind(domain.as_str());
        let rows = bind(query).fetch_all::<PlayerLocationRecord>().await?;
        Ok(rows.into_iter().map(PlayerLocation::from).collect())
    }

    async fn count_and_delete(&self, table: &str, domain: &DomainId, cutoff: DateTime<Utc>) -> Result<u64> {
        let predicate = "domain = ? AND observed_at < fromUnixTimestamp64Milli(?)";
        let count: u64 = self
            .client
            .query(&format!("SELECT count() FROM {table} WHERE {predicate}"))
            .bind(domain.as_str())
            .bind(cutoff.timestamp_millis())
            .fetch_one()
            .await?;
        if count > 0 {
            self.client
                .query(&format!("ALTER TABLE {table} DELETE WHERE {predicate}"))
                .bind(domain.as_str())
                .bind(cutoff.timestamp_millis())
                .execute()
                .await?;
        }
        Ok(count)
    }

    async fn fetch_baseline_records(&self, sql: &str, bind: impl FnOnce(Query) -> Query) -> Result<Vec<InventoryBaselineRow>> {
        let rows = bind(self.client.query(sql)).fetch_all::<BaselineRecord>().await?;
        Ok(rows.into_iter().map(InventoryBaselineRow::from).collect())
    }

    async fn fetch_diff_records(&self, sql: &str, bind: impl FnOnce(Query) -> Query) -> Result<Vec<InventoryDiffRow>> {
        let rows = bind(self.client.query(sql)).fetch_all::<DiffRecord>().await?;
        rows.into_iter().map(DiffRecord::into_diff).collect()
    }
}

#[async_trait]
impl PartitionCoordinator for ClickhouseRepo {
    async fn ensure_partition(&self, series: SeriesKind, date: NaiveDate) -> Result<()> {
        // Day partitions are derived from `toDate(observed_at)`; only the table has to exist.
        let mut ensured = self.ensured.lock().await;
        if ensured.contains(&series) {
            return Ok(());
        }
        self.client.query(series_ddl(series)).execute().await?;
        ensured.insert(series);
        debug!(table = series_table(series), %date, "series table ensured");
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for ClickhouseRepo {
    async fn insert_location(&self, domain: &DomainId, sample: &LocationSample) -> Result<()> {
        let mut insert = self.client.insert(LOCATION_TABLE)?;
        insert.write(&LocationRecord::new(domain, sample)).await?;
        insert.end().await?;
        Ok(())
    }

    async fn fetch_movement_history(
        &self,
        domain: &DomainId,
        filter: &MovementFilter,
    ) -> Result<Vec<PlayerLocation>> {
        let range = TimeRange::new(Some(filter.start), filter.end);
        let mut filter_sql = range_clause("l.observed_at", range);
        if !filter.player_ids.is_empty() {
            filter_sql.push_str(" AND has(?, a.player_id)");
        }
        filter_sql.push_str(" ORDER BY l.observed_at DESC LIMIT ?");

        let sql = format!(
            "SELECT DISTINCT {PLAYER_LOCATION_COLUMNS} FROM {LOCATION_TABLE} AS l {} \
             WHERE l.domain = ?{filter_sql}",
            association_join("?")
        );
        let mut query = self
            .client
            .query(&sql)
            .bind(domain.as_str())
            .bind(domain.as_str());
        query = bind_range(query, range);
        if !filter.player_ids.is_empty() {
            query = query.bind(&filter.player_ids);
        }
        let rows = query
            .bind(filter.limit as u64)
            .fetch_all::<PlayerLocationRecord>()
            .await?;
        Ok(rows.into_iter().map(PlayerLocation::from).collect())
    }

    async fn fetch_in_bounding_box(
        &self,
        domain: &DomainId,
        query: &BoundingBoxQuery,
    ) -> Result<Vec<PlayerLocation>> {
        let range = query.time_range();
        let filter_sql = format!(
            " AND a.game_server_id = ? AND l.x BETWEEN ? AND ? AND l.y BETWEEN ? AND ? \
             AND l.z BETWEEN ? AND ?{}",
            range_clause("l.observed_at", range)
        );
        self.fetch_player_locations(domain, &filter_sql, |q| {
            let q = q
                .bind(query.game_server_id.as_str())
                .bind(query.min_x)
                .bind(query.max_x)
                .bind(query.min_y)
                .bind(query.max_y)
                .bind(query.min_z)
                .bind(query.max_z);
            bind_range(q, range)
        })
        .await
    }

    async fn fetch_in_radius(&self, domain: &DomainId, query: &RadiusQuery) -> Result<Vec<PlayerLocation>> {
        let range = query.time_range();
        let filter_sql = format!(
            " AND a.game_server_id = ? \
             AND sqrt(pow(l.x - ?, 2) + pow(l.y - ?, 2) + pow(l.z - ?, 2)) <= ?{}",
            range_clause("l.observed_at", range)
        );
        self.fetch_player_locations(domain, &filter_sql, |q| {
            let q = q
                .bind(query.game_server_id.as_str())
                .bind(query.x)
                .bind(query.y)
                .bind(query.z)
                .bind(query.radius);
            bind_range(q, range)
        })
        .await
    }

    async fn delete_locations_before(&self, domain: &DomainId, cutoff: DateTime<Utc>) -> Result<u64> {
        self.count_and_delete(LOCATION_TABLE, domain, cutoff).await
    }
}

#[async_trait]
impl InventoryRepository for ClickhouseRepo {
    async fn insert_baseline(&self, domain: &DomainId, rows: &[InventoryBaselineRow]) -> Result<()> {
        let mut insert = self.client.insert(BASELINE_TABLE)?;
        for row in rows {
            insert.write(&BaselineRecord::new(domain, row)).await?;
        }
        insert.end().await?;
        Ok(())
    }

    async fn insert_diffs(&self, domain: &DomainId, rows: &[InventoryDiffRow]) -> Result<()> {
        let mut insert = self.client.insert(DIFF_TABLE)?;
        for row in rows {
            insert.write(&DiffRecord::new(domain, row)).await?;
        }
        insert.end().await?;
        Ok(())
    }

    async fn find_anchor_baseline(
        &self,
        domain: &DomainId,
        association_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let sql = format!(
            "SELECT baseline_id FROM {BASELINE_TABLE} \
             WHERE domain = ? AND association_id = ? AND observed_at <= fromUnixTimestamp64Milli(?) \
             ORDER BY observed_at DESC LIMIT 1"
        );
        let ids = self
            .client
            .query(&sql)
            .bind(domain.as_str())
            .bind(association_id)
            .bind(at.timestamp_millis())
            .fetch_all::<String>()
            .await?;
        Ok(ids.into_iter().next())
    }

    async fn fetch_baselines(
        &self,
        domain: &DomainId,
        association_id: &str,
        anchor_baseline_id: Option<&str>,
        range: TimeRange,
    ) -> Result<Vec<InventoryBaselineRow>> {
        let anchor_sql = if anchor_baseline_id.is_some() {
            "baseline_id = ? OR "
        } else {
            ""
        };
        let sql = format!(
            "SELECT {BASELINE_COLUMNS} FROM {BASELINE_TABLE} \
             WHERE domain = ? AND association_id = ? AND ({anchor_sql}(1 = 1{})) \
             ORDER BY observed_at DESC, item_id",
            range_clause("observed_at", range)
        );
        self.fetch_baseline_records(&sql, |q| {
            let mut q = q.bind(domain.as_str()).bind(association_id);
            if let Some(anchor) = anchor_baseline_id {
                q = q.bind(anchor);
            }
            bind_range(q, range)
        })
        .await
    }

    async fn fetch_diffs(
        &self,
        domain: &DomainId,
        association_id: &str,
        range: TimeRange,
    ) -> Result<Vec<InventoryDiffRow>> {
        let sql = format!(
            "SELECT {DIFF_COLUMNS} FROM {DIFF_TABLE} \
             WHERE domain = ? AND association_id = ?{} \
             ORDER BY observed_at DESC, item_id",
            range_clause("observed_at", range)
        );
        self.fetch_diff_records(&sql, |q| bind_range(q.bind(domain.as_str()).bind(association_id), range))
            .await
    }

    async fn fetch_baselines_by_item(
        &self,
        domain: &DomainId,
        item_id: &str,
        range: TimeRange,
    ) -> Result<Vec<InventoryBaselineRow>> {
        let sql = format!(
            "SELECT {BASELINE_COLUMNS} FROM {BASELINE_TABLE} \
             WHERE domain = ? AND item_id = ?{} ORDER BY observed_at DESC",
            range_clause("observed_at", range)
        );
        self.fetch_baseline_records(&sql, |q| bind_range(q.bind(domain.as_str()).bind(item_id), range))
            .await
    }

    async fn fetch_presence_diffs_by_item(
        &self,
        domain: &DomainId,
        item_id: &str,
        range: TimeRange,
    ) -> Result<Vec<InventoryDiffRow>> {
        let sql = format!(
            "SELECT {DIFF_COLUMNS} FROM {DIFF_TABLE} \
             WHERE domain = ? AND item_id = ? AND change_type IN (?, ?){} ORDER BY observed_at DESC",
            range_clause("observed_at", range)
        );
        self.fetch_diff_records(&sql, |q| {
            let q = q
                .bind(domain.as_str())
                .bind(item_id)
                .bind(ChangeType::Added.as_str())
                .bind(ChangeType::Changed.as_str());
            bind_range(q, range)
        })
        .await
    }

    async fn delete_inventory_before(&self, domain: &DomainId, cutoff: DateTime<Utc>) -> Result<u64> {
        let baselines = self.count_and_delete(BASELINE_TABLE, domain, cutoff).await?;
        let diffs = self.count_and_delete(DIFF_TABLE, domain, cutoff).await?;
        Ok(baselines + diffs)
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}

#[async_trait]
impl PlayerAssociationRepository for ClickhouseRepo {
    async fn find_association(
        &self,
        domain: &DomainId,
        game_id: &str,
        game_server_id: &str,
    ) -> Result<Option<String>> {
        let sql = format!(
            "SELECT id FROM {ASSOCIATION_TABLE} FINAL \
             WHERE domain = ? AND game_id = ? AND game_server_id = ? LIMIT 1"
        );
        let ids = self
            .client
            .query(&sql)
            .bind(domain.as_str())
            .bind(game_id)
            .bind(game_server_id)
            .fetch_all::<String>()
            .await?;
        Ok(ids.into_iter().next())
    }

    async fn find_by_player(
        &self,
        domain: &DomainId,
        player_id: &str,
        game_server_id: &str,
    ) -> Result<Option<PlayerAssociation>> {
        let sql = format!(
            "SELECT domain, id, player_id, game_server_id, game_id, updated_at \
             FROM {ASSOCIATION_TABLE} FINAL \
             WHERE domain = ? AND player_id = ? AND game_server_id = ? LIMIT 1"
        );
        let rows = self
            .client
            .query(&sql)
            .bind(domain.as_str())
            .bind(player_id)
            .bind(game_server_id)
            .fetch_all::<AssociationRecord>()
            .await?;
        Ok(rows.into_iter().next().map(PlayerAssociation::from))
    }

    async fn upsert_association(&self, domain: &DomainId, association: &PlayerAssociation) -> Result<()> {
        let mut insert = self.client.insert(ASSOCIATION_TABLE)?;
        insert
            .write(&AssociationRecord {
                domain: domain.to_string(),
                id: association.id.clone(),
                player_id: association.player_id.clone(),
                game_server_id: association.game_server_id.clone(),
                game_id: association.game_id.clone(),
                updated_at: OffsetDateTime::now_utc(),
            })
            .await?;
        insert.end().await?;
        Ok(())
    }

    async fn list_domains(&self) -> Result<Vec<DomainId>> {
        let domains = self
            .client
            .query(&format!("SELECT DISTINCT domain FROM {ASSOCIATION_TABLE} ORDER BY domain"))
            .fetch_all::<String>()
            .await?;
        Ok(domains.into_iter().map(DomainId).collect())
    }
}
