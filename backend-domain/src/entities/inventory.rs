// Inventory entities
// Baseline snapshots, item-level diffs and the history views built from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ChangeType;

/// One raw inventory stack as reported by the game server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl InventoryItem {
    pub fn new(code: impl Into<String>, amount: i64) -> Self {
        Self {
            code: code.into(),
            amount: Some(amount),
            quality: None,
        }
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }
}

/// All stacks of one item code folded into a single logical quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedItem {
    pub item_id: String,
    pub amount: i64,
    pub quality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryBaselineRow {
    pub association_id: String,
    pub baseline_id: String,
    pub item_id: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDiffRow {
    pub association_id: String,
    pub item_id: String,
    pub change_type: ChangeType,
    pub previous_quantity: Option<i64>,
    pub new_quantity: Option<i64>,
    pub previous_quality: Option<String>,
    pub new_quality: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl InventoryDiffRow {
    pub fn added(association_id: &str, current: &AggregatedItem, observed_at: DateTime<Utc>) -> Self {
        Self {
            association_id: association_id.to_string(),
            item_id: current.item_id.clone(),
            change_type: ChangeType::Added,
            previous_quantity: None,
            new_quantity: Some(current.amount),
            previous_quality: None,
            new_quality: current.quality.clone(),
            observed_at,
        }
    }

    pub fn changed(
        association_id: &str,
        previous: &AggregatedItem,
        current: &AggregatedItem,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            association_id: association_id.to_string(),
            item_id: current.item_id.clone(),
            change_type: ChangeType::Changed,
            previous_quantity: Some(previous.amount),
            new_quantity: Some(current.amount),
            previous_quality: previous.quality.clone(),
            new_quality: current.quality.clone(),
            observed_at,
        }
    }

    pub fn removed(association_id: &str, previous: &AggregatedItem, observed_at: DateTime<Utc>) -> Self {
        Self {
            association_id: association_id.to_string(),
            item_id: previous.item_id.clone(),
            change_type: ChangeType::Removed,
            previous_quantity: Some(previous.amount),
            new_quantity: None,
            previous_quality: previous.quality.clone(),
            new_quality: None,
            observed_at,
        }
    }

    /// Quantity held right after this change.
    pub fn resulting_quantity(&self) -> i64 {
        match self.change_type {
            ChangeType::Removed => 0,
            ChangeType::Added | ChangeType::Changed => self.new_quantity.unwrap_or_default(),
        }
    }
}

/// Result of one inventory observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryObservationOutcome {
    Baseline { baseline_id: String, rows: usize },
    Diff { rows: usize },
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    Baseline,
    Diff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryHistoryEntry {
    pub association_id: String,
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub source: HistorySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeType>,
    pub observed_at: DateTime<Utc>,
}

impl From<&InventoryBaselineRow> for InventoryHistoryEntry {
    fn from(row: &InventoryBaselineRow) -> Self {
        Self {
            association_id: row.association_id.clone(),
            item_id: row.item_id.clone(),
            item_code: None,
            item_name: None,
            quantity: row.quantity,
            quality: row.quality.clone(),
            source: HistorySource::Baseline,
            baseline_id: Some(row.baseline_id.clone()),
            change_type: None,
            observed_at: row.observed_at,
        }
    }
}

impl From<&InventoryDiffRow> for InventoryHistoryEntry {
    fn from(row: &InventoryDiffRow) -> Self {
        let quality = match row.change_type {
            ChangeType::Removed => row.previous_quality.clone(),
            ChangeType::Added | ChangeType::Changed => row.new_quality.clone(),
        };
        Self {
            association_id: row.association_id.clone(),
            item_id: row.item_id.clone(),
            item_code: None,
            item_name: None,
            quantity: row.resulting_quantity(),
            quality,
            source: HistorySource::Diff,
            baseline_id: None,
            change_type: Some(row.change_type),
            observed_at: row.observed_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryHistoryQuery {
    /// Domain-wide player id.
    pub player_id: String,
    pub game_server_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryAtQuery {
    pub player_id: String,
    pub game_server_id: String,
    pub at: DateTime<Utc>,
}

/// Per-item state at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStateEntry {
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayersByItemQuery {
    pub item_id: String,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerItemHistoryEntry {
    pub association_id: String,
    pub item_id: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub source: HistorySource,
    pub observed_at: DateTime<Utc>,
}

impl From<InventoryBaselineRow> for PlayerItemHistoryEntry {
    fn from(row: InventoryBaselineRow) -> Self {
        Self {
            association_id: row.association_id,
            item_id: row.item_id,
            quantity: row.quantity,
            quality: row.quality,
            source: HistorySource::Baseline,
            observed_at: row.observed_at,
        }
    }
}

impl From<InventoryDiffRow> for PlayerItemHistoryEntry {
    fn from(row: InventoryDiffRow) -> Self {
        Self {
            quantity: row.resulting_quantity(),
            association_id: row.association_id,
            item_id: row.item_id,
            quality: row.new_quality,
            source: HistorySource::Diff,
            observed_at: row.observed_at,
        }
    }
}
