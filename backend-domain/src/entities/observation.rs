// Ingest envelope entities
// Batched observations pushed by the game event pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::inventory::InventoryItem;

#[derive(Debug, Clone, Deserialize)]
pub struct ObservationEnvelope {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub game_server_id: Option<String>,
    #[serde(default)]
    pub locations: Vec<LocationObservation>,
    #[serde(default)]
    pub inventories: Vec<InventoryObservation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationObservation {
    pub game_id: String,
    #[serde(default)]
    pub game_server_id: Option<String>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub dimension: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryObservation {
    pub game_id: String,
    #[serde(default)]
    pub game_server_id: Option<String>,
    #[serde(default)]
    pub items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub locations: usize,
    pub inventories: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionRequest {
    pub cutoff: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetentionResult {
    pub cutoff: DateTime<Utc>,
    pub deleted: u64,
}
