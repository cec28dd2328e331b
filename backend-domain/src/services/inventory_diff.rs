use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::entities::{AggregatedItem, InventoryBaselineRow, InventoryDiffRow, InventoryItem, ItemDefinition};

/// Aggregated inventory keyed by item code.
pub type AggregatedInventory = BTreeMap<String, AggregatedItem>;

/// What a single observation persists. Never both kinds of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationPlan {
    Baseline(Vec<InventoryBaselineRow>),
    Diff(Vec<InventoryDiffRow>),
}

/// Folds stacks by code. Amounts are summed with saturation (missing amount
/// counts as zero),
/// the first quality seen for a code is kept, codes without a definition are
/// dropped.
pub fn aggregate_by_code(items: &[InventoryItem], definitions: &[ItemDefinition]) -> AggregatedInventory {
    let ids = definitions
        .iter()
        .map(|def| (def.code.as_str(), def.id.as_str()))
        .collect::<BTreeMap<_, _>>();

    let mut aggregated = AggregatedInventory::new();
    for item in items {
        let Some(item_id) = ids.get(item.code.as_str()) else {
            continue;
        };
        let amount = item.amount.unwrap_or_default();
        aggregated
            .entry(item.code.clone())
            .and_modify(|existing| existing.amount = existing.amount.saturating_add(amount))
            .or_insert_with(|| AggregatedItem {
                item_id: (*item_id).to_string(),
                amount,
                quality: item.quality.clone(),
            });
    }
    aggregated
}

/// One row per code whose aggregated state differs between `previous` and
/// `current`. Identical maps produce no rows.
pub fn calculate_diffs(
    association_id: &str,
    previous: &AggregatedInventory,
    current: &AggregatedInventory,
    observed_at: DateTime<Utc>,
) -> Vec<InventoryDiffRow> {
    let mut diffs = Vec::new();

    for (code, curr) in current {
        match previous.get(code) {
            None => diffs.push(InventoryDiffRow::added(association_id, curr, observed_at)),
            Some(prev) if prev.amount != curr.amount || prev.quality != curr.quality => {
                diffs.push(InventoryDiffRow::changed(association_id, prev, curr, observed_at));
            }
            Some(_) => {}
        }
    }

    for (code, prev) in previous {
        if !current.contains_key(code) {
            diffs.push(InventoryDiffRow::removed(association_id, prev, observed_at));
        }
    }

    diffs
}

pub fn baseline_rows(
    association_id: &str,
    baseline_id: &str,
    current: &AggregatedInventory,
    observed_at: DateTime<Utc>,
) -> Vec<InventoryBaselineRow> {
    current
        .values()
        .map(|item| InventoryBaselineRow {
            association_id: association_id.to_string(),
            baseline_id: baseline_id.to_string(),
            item_id: item.item_id.clone(),
            quantity: item.amount,
            quality: item.quality.clone(),
            observed_at,
        })
        .collect()
}

/// A missing last-baseline timestamp means the epoch, so it is always due.
pub fn is_baseline_due(now: DateTime<Utc>, last_baseline: Option<DateTime<Utc>>, interval: Duration) -> bool {
    let last = last_baseline.unwrap_or_default();
    now.signed_duration_since(last) > interval
}

/// Decides between a full baseline and a diff set.
///
/// `previous` is `None` when no prior state is known. A diff against an
/// unknown state would report every held item as added, so that case always
/// writes a baseline.
///
/// An empty current inventory never becomes a baseline: a baseline group
/// without rows cannot be stored, so the emptying is recorded as `removed`
/// diffs against the known state instead.
pub fn plan_observation(
    association_id: &str,
    baseline_id: &str,
    previous: Option<&AggregatedInventory>,
    current: &AggregatedInventory,
    last_baseline: Option<DateTime<Utc>>,
    interval: Duration,
    now: DateTime<Utc>,
) -> ObservationPlan {
    match previous {
        Some(previous) if current.is_empty() || !is_baseline_due(now, last_baseline, interval) => {
            ObservationPlan::Diff(calculate_diffs(association_id, previous, current, now))
        }
        _ => ObservationPlan::Baseline(baseline_rows(association_id, baseline_id, current, now)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;
    use crate::value_objects::ChangeType;

    fn defs(codes: &[&str]) -> Vec<ItemDefinition> {
        codes
            .iter()
            .map(|code| ItemDefinition {
                id: format!("item-{code}"),
                code: code.to_string(),
                game_server_id: "gs-1".to_string(),
                domain: None,
                name: Some(code.to_string()),
                description: None,
            })
            .collect()
    }

    fn agg(items: &[(&str, i64, Option<&str>)]) -> AggregatedInventory {
        items
            .iter()
            .map(|(code, amount, quality)| {
                (
                    code.to_string(),
                    AggregatedItem {
                        item_id: format!("item-{code}"),
                        amount: *amount,
                        quality: quality.map(str::to_string),
                    },
                )
            })
            .collect()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn sums_stacks_of_the_same_code() {
        let items = vec![
            InventoryItem::new("wood", 64),
            InventoryItem::new("wood", 32),
            InventoryItem::new("wood", 10),
            InventoryItem::new("stone", 32),
        ];
        let result = aggregate_by_code(&items, &defs(&["wood", "stone"]));
        assert_eq!(result["wood"].amount, 106);
        assert_eq!(result["stone"].amount, 32);
        assert_eq!(result["wood"].item_id, "item-wood");
    }

    #[test]
    fn missing_amount_counts_as_zero() {
        let items = vec![InventoryItem {
            code: "wood".to_string(),
            amount: None,
            quality: None,
        }];
        let result = aggregate_by_code(&items, &defs(&["wood"]));
        assert_eq!(result["wood"].amount, 0);
    }

    #[test]
    fn keeps_first_quality() {
        let items = vec![
            InventoryItem::new("pickaxe", 1).with_quality("80%"),
            InventoryItem::new("pickaxe", 1).with_quality("50%"),
        ];
        let result = aggregate_by_code(&items, &defs(&["pickaxe"]));
        assert_eq!(result["pickaxe"].quality.as_deref(), Some("80%"));
        assert_eq!(result["pickaxe"].amount, 2);
    }

    #[test]
    fn drops_unknown_codes() {
        let items = vec![InventoryItem::new("wood", 64), InventoryItem::new("unknown", 10)];
        let result = aggregate_by_code(&items, &defs(&["wood"]));
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("wood"));
    }

    #[test]
    fn identical_inventories_produce_no_diffs() {
        let inventory = agg(&[("wood", 64, None), ("stone", 32, None)]);
        assert!(calculate_diffs("p1", &inventory, &inventory, at(0)).is_empty());
    }

    #[test]
    fn classifies_added_changed_and_removed() {
        let previous = agg(&[("wood", 64, None), ("stone", 32, None), ("sword", 1, Some("90%"))]);
        let current = agg(&[("wood", 64, None), ("iron", 16, None), ("sword", 1, Some("70%"))]);

        let diffs = calculate_diffs("p1", &previous, &current, at(1));
        assert_eq!(diffs.len(), 3);

        let iron = diffs.iter().find(|d| d.item_id == "item-iron").unwrap();
        assert_eq!(iron.change_type, ChangeType::Added);
        assert_eq!(iron.previous_quantity, None);
        assert_eq!(iron.new_quantity, Some(16));

        let sword = diffs.iter().find(|d| d.item_id == "item-sword").unwrap();
        assert_eq!(sword.change_type, ChangeType::Changed);
        assert_eq!(sword.previous_quality.as_deref(), Some("90%"));
        assert_eq!(sword.new_quality.as_deref(), Some("70%"));

        let stone = diffs.iter().find(|d| d.item_id == "item-stone").unwrap();
        assert_eq!(stone.change_type, ChangeType::Removed);
        assert_eq!(stone.previous_quantity, Some(32));
        assert_eq!(stone.new_quantity, None);
    }

    #[test]
    fn baseline_due_after_interval_only() {
        let interval = Duration::hours(1);
        assert!(is_baseline_due(at(5), None, interval));
        assert!(!is_baseline_due(at(1), Some(at(0)), interval));
        assert!(is_baseline_due(
            at(1) + Duration::seconds(1),
            Some(at(0)),
            interval
        ));
    }

    #[test]
    fn unknown_previous_state_forces_baseline() {
        let current = agg(&[("wood", 5, None)]);
        let plan = plan_observation("p1", "b1", None, &current, Some(at(0)), Duration::hours(6), at(1));
        match plan {
            ObservationPlan::Baseline(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].baseline_id, "b1");
            }
            ObservationPlan::Diff(_) => panic!("expected a baseline"),
        }
    }

    #[test]
    fn known_state_within_interval_produces_diff() {
        let previous = agg(&[("wood", 5, None)]);
        let current = agg(&[("wood", 5, None), ("stone", 3, None)]);
        let plan = plan_observation(
            "p1",
            "b1",
            Some(&previous),
            &current,
            Some(at(0)),
            Duration::hours(6),
            at(2),
        );
        match plan {
            ObservationPlan::Diff(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].change_type, ChangeType::Added);
                assert_eq!(rows[0].new_quantity, Some(3));
            }
            ObservationPlan::Baseline(_) => panic!("expected a diff"),
        }
    }

    #[test]
    fn stack_sum_saturates_instead_of_overflowing() {
        let items = vec![
            InventoryItem::new("wood", i64::MAX - 1),
            InventoryItem::new("wood", 1),
            InventoryItem::new("wood", 1),
        ];
        let result = aggregate_by_code(&items, &defs(&["wood"]));
        assert_eq!(result["wood"].amount, i64::MAX);
    }

    #[test]
    fn emptied_inventory_at_a_due_baseline_is_recorded_as_removals() {
        let previous = agg(&[("wood", 5, None), ("stone", 2, None)]);
        let plan = plan_observation(
            "p1",
            "b1",
            Some(&previous),
            &AggregatedInventory::new(),
            Some(at(0)),
            Duration::hours(1),
            at(3),
        );
        match plan {
            ObservationPlan::Diff(rows) => {
                assert_eq!(rows.len(), 2);
                assert!(rows.iter().all(|row| row.change_type == ChangeType::Removed));
            }
            ObservationPlan::Baseline(_) => panic!("expected removals"),
        }
    }

    #[test]
    fn empty_against_empty_writes_nothing() {
        let empty = AggregatedInventory::new();
        let plan = plan_observation("p1", "b1", Some(&empty), &empty, None, Duration::hours(1), at(3));
        assert_eq!(plan, ObservationPlan::Diff(Vec::new()));
    }

    fn arb_inventory() -> impl Strategy<Value = AggregatedInventory> {
        prop::collection::btree_map(
            "[a-e]",
            (0i64..5, prop::option::of("[xy]")),
            0..5,
        )
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(code, (amount, quality))| {
                    let item = AggregatedItem {
                        item_id: format!("item-{code}"),
                        amount,
                        quality,
                    };
                    (code, item)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn aggregated_amount_is_sum_of_stacks(amounts in prop::collection::vec(0i64..1000, 1..20)) {
            let items = amounts
                .iter()
                .map(|amount| InventoryItem::new("wood", *amount))
                .collect::<Vec<_>>();
            let result = aggregate_by_code(&items, &defs(&["wood"]));
            prop_assert_eq!(result["wood"].amount, amounts.iter().sum::<i64>());
        }

        #[test]
        fn diff_covers_exactly_the_differing_codes(
            previous in arb_inventory(),
            current in arb_inventory(),
        ) {
            let diffs = calculate_diffs("p1", &previous, &current, at(0));

            let mut expected = 0;
            for code in previous.keys().chain(current.keys().filter(|c| !previous.contains_key(*c))) {
                if previous.get(code) != current.get(code) {
                    expected += 1;
                }
            }
            prop_assert_eq!(diffs.len(), expected);

            for diff in &diffs {
                let code = diff.item_id.trim_start_matches("item-");
                match diff.change_type {
                    ChangeType::Added => {
                        prop_assert!(!previous.contains_key(code));
                        prop_assert!(diff.previous_quantity.is_none());
                    }
                    ChangeType::Removed => {
                        prop_assert!(!current.contains_key(code));
                        prop_assert!(diff.new_quantity.is_none());
                    }
                    ChangeType::Changed => {
                        prop_assert!(previous.contains_key(code) && current.contains_key(code));
                    }
                }
            }
        }
    }
}
