// Change type value object

use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Changed,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Changed => "changed",
        }
    }

    /// Removals record absence, every other change records presence.
    pub fn signals_presence(&self) -> bool {
        !matches!(self, ChangeType::Removed)
    }
}

impl FromStr for ChangeType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "added" => Ok(ChangeType::Added),
            "removed" => Ok(ChangeType::Removed),
            "changed" => Ok(ChangeType::Changed),
            other => Err(anyhow!("unknown change type '{}'", other)),
        }
    }
}
