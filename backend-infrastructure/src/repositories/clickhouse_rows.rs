// Column layouts of the telemetry tables. Field order matches the SELECT lists
// in clickhouse_repo.

use anyhow::Result;
use clickhouse::Row;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use backend_domain::{
    normalize_optional_text,
    DomainId,
    InventoryBaselineRow,
    InventoryDiffRow,
    LocationSample,
    PlayerAssociation,
    PlayerLocation,
};

use crate::utils::{from_column_time, to_column_time};

#[derive(Debug, Clone, Serialize, Row)]
pub struct LocationRecord {
    pub domain: String,
    pub association_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub dimension: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub observed_at: OffsetDateTime,
}

impl LocationRecord {
    pub fn new(domain: &DomainId, sample: &LocationSample) -> Self {
        Self {
            domain: domain.to_string(),
            association_id: sample.association_id.clone(),
            x: sample.x,
            y: sample.y,
            z: sample.z,
            dimension: sample.dimension.clone().unwrap_or_default(),
            observed_at: to_column_time(sample.observed_at),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Row)]
pub struct PlayerLocationRecord {
    pub association_id: String,
    pub player_id: String,
    pub game_server_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub dimension: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub observed_at: OffsetDateTime,
}

impl From<PlayerLocationRecord> for PlayerLocation {
    fn from(row: PlayerLocationRecord) -> Self {
        Self {
            association_id: row.association_id,
            player_id: row.player_id,
            game_server_id: row.game_server_id,
            x: row.x,
            y: row.y,
            z: row.z,
            dimension: normalize_optional_text(Some(row.dimension)),
            observed_at: from_column_time(row.observed_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct BaselineRecord {
    pub domain: String,
    pub association_id: String,
    pub baseline_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub quality: Option<String>,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub observed_at: OffsetDateTime,
}

impl BaselineRecord {
    pub fn new(domain: &DomainId, row: &InventoryBaselineRow) -> Self {
        Self {
            domain: domain.to_string(),
            association_id: row.association_id.clone(),
            baseline_id: row.baseline_id.clone(),
            item_id: row.item_id.clone(),
            quantity: row.quantity,
            quality: row.quality.clone(),
            observed_at: to_column_time(row.observed_at),
        }
    }
}

impl From<BaselineRecord> for InventoryBaselineRow {
    fn from(row: BaselineRecord) -> Self {
        Self {
            association_id: row.association_id,
            baseline_id: row.baseline_id,
            item_id: row.item_id,
            quantity: row.quantity,
            quality: row.quality,
            observed_at: from_column_time(row.observed_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct DiffRecord {
    pub domain: String,
    pub association_id: String,
    pub item_id: String,
    pub change_type: String,
    pub previous_quantity: Option<i64>,
    pub new_quantity: Option<i64>,
    pub previous_quality: Option<String>,
    pub new_quality: Option<String>,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub observed_at: OffsetDateTime,
}

impl DiffRecord {
    pub fn new(domain: &DomainId, row: &InventoryDiffRow) -> Self {
        Self {
            domain: domain.to_string(),
            association_id: row.association_id.clone(),
            item_id: row.item_id.clone(),
            change_type: row.change_type.as_str().to_string(),
            previous_quantity: row.previous_quantity,
            new_quantity: row.new_quantity,
            previous_quality: row.previous_quality.clone(),
            new_quality: row.new_quality.clone(),
            observed_at: to_column_time(row.observed_at),
        }
    }

    pub fn into_diff(self) -> Result<InventoryDiffRow> {
        Ok(InventoryDiffRow {
            change_type: self.change_type.parse()?,
            association_id: self.association_id,
            item_id: self.item_id,
            previous_quantity: self.previous_quantity,
            new_quantity: self.new_quantity,
            previous_quality: self.previous_quality,
            new_quality: self.new_quality,
            observed_at: from_column_time(self.observed_at),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct AssociationRecord {
    pub domain: String,
    pub id: String,
    pub player_id: String,
    pub game_server_id: String,
    pub game_id: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub updated_at: OffsetDateTime,
}

impl From<AssociationRecord> for PlayerAssociation {
    fn from(row: AssociationRecord) -> Self {
        Self {
            id: row.id,
            player_id: row.player_id,
            game_server_id: row.game_server_id,
            game_id: row.game_id,
        }
    }
}
