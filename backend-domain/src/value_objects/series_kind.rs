// Logical time-partitioned series written by the tracking engine

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Location,
    InventoryBaseline,
    InventoryDiff,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [
        SeriesKind::Location,
        SeriesKind::InventoryBaseline,
        SeriesKind::InventoryDiff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Location => "location",
            SeriesKind::InventoryBaseline => "inventory_baseline",
            SeriesKind::InventoryDiff => "inventory_diff",
        }
    }
}
