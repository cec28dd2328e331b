use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::entities::{
    InventoryBaselineRow,
    InventoryDiffRow,
    InventoryHistoryEntry,
    InventoryStateEntry,
    ItemDefinition,
};
use crate::value_objects::ChangeType;

/// One event per baseline row and per diff row, newest first.
pub fn assemble_history(
    baselines: &[InventoryBaselineRow],
    diffs: &[InventoryDiffRow],
) -> Vec<InventoryHistoryEntry> {
    let mut entries = baselines
        .iter()
        .map(InventoryHistoryEntry::from)
        .chain(diffs.iter().map(InventoryHistoryEntry::from))
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| {
        b.observed_at
            .cmp(&a.observed_at)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    entries
}

enum ReplayEvent<'a> {
    Baseline(DateTime<Utc>, Vec<&'a InventoryBaselineRow>),
    Diff(&'a InventoryDiffRow),
}

impl ReplayEvent<'_> {
    fn observed_at(&self) -> DateTime<Utc> {
        match self {
            ReplayEvent::Baseline(at, _) => *at,
            ReplayEvent::Diff(row) => row.observed_at,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ReplayEvent::Baseline(..) => 0,
            ReplayEvent::Diff(_) => 1,
        }
    }
}

/// Inventory state at `at`, replayed oldest-first. Every baseline group
/// replaces the whole state, diffs apply on top of it. Rows after `at` are
/// ignored. The result is ordered by item id.
pub fn replay_inventory(
    baselines: &[InventoryBaselineRow],
    diffs: &[InventoryDiffRow],
    at: DateTime<Utc>,
) -> Vec<InventoryStateEntry> {
    let mut groups: HashMap<&str, (DateTime<Utc>, Vec<&InventoryBaselineRow>)> = HashMap::new();
    for row in baselines.iter().filter(|row| row.observed_at <= at) {
        groups
            .entry(row.baseline_id.as_str())
            .or_insert_with(|| (row.observed_at, Vec::new()))
            .1
            .push(row);
    }

    let mut events = groups
        .into_values()
        .map(|(observed_at, rows)| ReplayEvent::Baseline(observed_at, rows))
        .chain(
            diffs
                .iter()
                .filter(|row| row.observed_at <= at)
                .map(ReplayEvent::Diff),
        )
        .collect::<Vec<_>>();
    events.sort_by(|a, b| match a.observed_at().cmp(&b.observed_at()) {
        Ordering::Equal => a.rank().cmp(&b.rank()),
        other => other,
    });

    let mut state: BTreeMap<String, InventoryStateEntry> = BTreeMap::new();
    for event in events {
        match event {
            ReplayEvent::Baseline(observed_at, rows) => {
                state.clear();
                for row in rows {
                    state.insert(
                        row.item_id.clone(),
                        InventoryStateEntry {
                            item_id: row.item_id.clone(),
                            item_code: None,
                            item_name: None,
                            quantity: row.quantity,
                            quality: row.quality.clone(),
                            observed_at,
                        },
                    );
                }
            }
            ReplayEvent::Diff(row) => match row.change_type {
                ChangeType::Removed => {
                    state.remove(&row.item_id);
                }
                ChangeType::Added | ChangeType::Changed => {
                    state.insert(
                        row.item_id.clone(),
                        InventoryStateEntry {
                            item_id: row.item_id.clone(),
                            item_code: None,
                            item_name: None,
                            quantity: row.resulting_quantity(),
                            quality: row.new_quality.clone(),
                            observed_at: row.observed_at,
                        },
                    );
                }
            },
        }
    }
    state.into_values().collect()
}

pub fn enrich_history(entries: &mut [InventoryHistoryEntry], definitions: &[ItemDefinition]) {
    let by_id = index_definitions(definitions);
    for entry in entries {
        if let Some(def) = by_id.get(entry.item_id.as_str()) {
            entry.item_code = Some(def.code.clone());
            entry.item_name = def.name.clone();
        }
    }
}

pub fn enrich_state(entries: &mut [InventoryStateEntry], definitions: &[ItemDefinition]) {
    let by_id = index_definitions(definitions);
    for entry in entries {
        if let Some(def) = by_id.get(entry.item_id.as_str()) {
            entry.item_code = Some(def.code.clone());
            entry.item_name = def.name.clone();
        }
    }
}

fn index_definitions(definitions: &[ItemDefinition]) -> HashMap<&str, &ItemDefinition> {
    definitions.iter().map(|def| (def.id.as_str(), def)).collect()
}
