// Location entities
// Position samples and the queries answered over them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub association_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    pub observed_at: DateTime<Utc>,
}

/// A sample joined through its association.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLocation {
    pub association_id: String,
    pub player_id: String,
    pub game_server_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at <= end)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementHistoryQuery {
    /// Domain-wide player ids.
    #[serde(default)]
    pub player_ids: Option<Vec<String>>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Movement query after defaults are applied and the limit is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementFilter {
    pub player_ids: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxQuery {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub game_server_id: String,
}

impl BoundingBoxQuery {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiusQuery {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub game_server_id: String,
}

impl RadiusQuery {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_date, self.end_date)
    }
}
