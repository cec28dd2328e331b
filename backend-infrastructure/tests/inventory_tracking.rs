mod common;

use std::time::Duration as StdDuration;

use backend_application::commands::inventory_commands::observe_player_inventory;
use backend_application::queries::inventory_history_queries::{
    get_player_inventory_at,
    get_player_inventory_history,
};
use backend_application::queries::item_search_queries::get_players_by_item;
use backend_domain::{
    ChangeType,
    HistorySource,
    InventoryAtQuery,
    InventoryHistoryQuery,
    InventoryItem,
    InventoryObservationOutcome,
    PlayersByItemQuery,
    RuntimeConfig,
};

use common::{config_with_interval, hour, Harness, SERVER};

async fn observe(h: &Harness, association_id: &str, at: i64, items: Vec<InventoryItem>) -> InventoryObservationOutcome {
    h.clock.set(hour(at));
    observe_player_inventory(&h.state, &h.domain, association_id, SERVER, items)
        .await
        .expect("observation should succeed")
}

#[tokio::test]
async fn baseline_then_single_added_diff() {
    let h = Harness::new(config_with_interval(6));
    let p1 = h.register(1).await;

    let first = observe(&h, &p1, 0, vec![InventoryItem::new("A", 5)]).await;
    assert!(matches!(first, InventoryObservationOutcome::Baseline { rows: 1, .. }));

    let second = observe(&h, &p1, 2, vec![InventoryItem::new("A", 5), InventoryItem::new("B", 3)]).await;
    assert_eq!(second, InventoryObservationOutcome::Diff { rows: 1 });

    let diffs = h.store.diff_rows(&h.domain).await;
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].item_id, "item-B");
    assert_eq!(diffs[0].change_type, ChangeType::Added);
    assert_eq!(diffs[0].new_quantity, Some(3));
    assert_eq!(diffs[0].previous_quantity, None);

    let history = get_player_inventory_history(
        &h.state,
        &h.domain,
        InventoryHistoryQuery {
            player_id: "P1".to_string(),
            game_server_id: SERVER.to_string(),
            start_date: hour(0),
            end_date: hour(3),
        },
    )
    .await
    .unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].item_id, "item-B");
    assert_eq!(history[0].quantity, 3);
    assert_eq!(history[0].source, HistorySource::Diff);
    assert_eq!(history[0].observed_at, hour(2));
    assert_eq!(history[0].item_code.as_deref(), Some("B"));
    assert_eq!(history[1].item_id, "item-A");
    assert_eq!(history[1].quantity, 5);
    assert_eq!(history[1].source, HistorySource::Baseline);
    assert_eq!(history[1].observed_at, hour(0));
}

#[tokio::test]
async fn unchanged_inventory_writes_nothing() {
    let h = Harness::new(config_with_interval(6));
    let p1 = h.register(1).await;

    observe(&h, &p1, 0, vec![InventoryItem::new("wood", 64), InventoryItem::new("wood", 36)]).await;
    let outcome = observe(&h, &p1, 1, vec![InventoryItem::new("wood", 100)]).await;

    assert_eq!(outcome, InventoryObservationOutcome::Unchanged);
    assert!(h.store.diff_rows(&h.domain).await.is_empty());
    assert_eq!(h.store.baseline_rows(&h.domain).await.len(), 1);
}

#[tokio::test]
async fn observation_writes_a_baseline_or_diffs_never_both() {
    let h = Harness::new(config_with_interval(1));
    let p1 = h.register(1).await;

    observe(&h, &p1, 0, vec![InventoryItem::new("A", 1)]).await;
    let due = observe(&h, &p1, 2, vec![InventoryItem::new("A", 2), InventoryItem::new("B", 1)]).await;

    assert!(matches!(due, InventoryObservationOutcome::Baseline { rows: 2, .. }));
    assert!(h.store.diff_rows(&h.domain).await.is_empty());
    assert_eq!(h.store.baseline_rows(&h.domain).await.len(), 3);
}

#[tokio::test]
async fn vanished_codes_are_recorded_as_removed() {
    let h = Harness::new(config_with_interval(6));
    let p1 = h.register(1).await;

    observe(&h, &p1, 0, vec![InventoryItem::new("A", 5), InventoryItem::new("stone", 2)]).await;
    let outcome = observe(&h, &p1, 1, vec![InventoryItem::new("A", 4)]).await;
    assert_eq!(outcome, InventoryObservationOutcome::Diff { rows: 2 });

    let diffs = h.store.diff_rows(&h.domain).await;
    let removed = diffs.iter().find(|d| d.item_id == "item-stone").unwrap();
    assert_eq!(removed.change_type, ChangeType::Removed);
    assert_eq!(removed.previous_quantity, Some(2));
    assert_eq!(removed.new_quantity, None);
    let changed = diffs.iter().find(|d| d.item_id == "item-A").unwrap();
    assert_eq!(changed.change_type, ChangeType::Changed);
    assert_eq!((changed.previous_quantity, changed.new_quantity), (Some(5), Some(4)));
}

#[tokio::test]
async fn unknown_codes_are_dropped_silently() {
    let h = Harness::new(config_with_interval(6));
    let p1 = h.register(1).await;

    let outcome = observe(&h, &p1, 0, vec![InventoryItem::new("mystery", 1), InventoryItem::new("A", 1)]).await;
    assert!(matches!(outcome, InventoryObservationOutcome::Baseline { rows: 1, .. }));
}

#[tokio::test(start_paused = true)]
async fn expired_snapshot_forces_a_fresh_baseline() {
    let config = RuntimeConfig {
        baseline_interval_seconds: 6 * 3600,
        snapshot_ttl_seconds: 60,
        ..RuntimeConfig::default()
    };
    let h = Harness::new(config);
    let p1 = h.register(1).await;

    observe(&h, &p1, 0, vec![InventoryItem::new("A", 5)]).await;
    tokio::time::advance(StdDuration::from_secs(61)).await;

    let outcome = observe(&h, &p1, 1, vec![InventoryItem::new("A", 5), InventoryItem::new("B", 1)]).await;
    assert!(matches!(outcome, InventoryObservationOutcome::Baseline { rows: 2, .. }));
    assert!(h.store.diff_rows(&h.domain).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_observations_for_one_player_are_serialized() {
    let h = Harness::new(config_with_interval(6));
    let p1 = h.register(1).await;
    h.clock.set(hour(0));

    let tasks = (0..16)
        .map(|_| {
            let state = h.state.clone();
            let domain = h.domain.clone();
            let association_id = p1.clone();
            tokio::spawn(async move {
                observe_player_inventory(
                    &state,
                    &domain,
                    &association_id,
                    SERVER,
                    vec![InventoryItem::new("A", 5)],
                )
                .await
            })
        })
        .collect::<Vec<_>>();
    let outcomes = futures_util::future::join_all(tasks).await;

    let baselines = outcomes
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .filter(|outcome| matches!(outcome, InventoryObservationOutcome::Baseline { .. }))
        .count();
    assert_eq!(baselines, 1);
    assert_eq!(h.store.baseline_rows(&h.domain).await.len(), 1);
}

#[tokio::test]
async fn storage_failure_is_swallowed_and_counted() {
    let h = Harness::new(config_with_interval(6));
    let p1 = h.register(1).await;
    h.store.set_offline(true);

    let outcome = observe_player_inventory(&h.state, &h.domain, &p1, SERVER, vec![InventoryItem::new("A", 1)]).await;
    assert!(outcome.is_none());
    assert_eq!(h.state.metrics.inventory_errors(), 1);
}

#[tokio::test]
async fn history_of_unknown_player_is_empty() {
    let h = Harness::new(config_with_interval(6));
    let history = get_player_inventory_history(
        &h.state,
        &h.domain,
        InventoryHistoryQuery {
            player_id: "nobody".to_string(),
            game_server_id: SERVER.to_string(),
            start_date: hour(0),
            end_date: hour(3),
        },
    )
    .await
    .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn history_includes_the_anchor_baseline_before_the_range() {
    let h = Harness::new(config_with_interval(6));
    let p1 = h.register(1).await;

    observe(&h, &p1, 0, vec![InventoryItem::new("A", 5)]).await;
    observe(&h, &p1, 4, vec![InventoryItem::new("A", 6)]).await;

    let history = get_player_inventory_history(
        &h.state,
        &h.domain,
        InventoryHistoryQuery {
            player_id: "P1".to_string(),
            game_server_id: SERVER.to_string(),
            start_date: hour(3),
            end_date: hour(5),
        },
    )
    .await
    .unwrap();
    let sources = history
        .iter()
        .map(|entry| (entry.source, entry.quantity))
        .collect::<Vec<_>>();
    assert_eq!(sources, vec![(HistorySource::Diff, 6), (HistorySource::Baseline, 5)]);
}

#[tokio::test]
async fn inventory_at_replays_the_latest_value_per_item() {
    let h = Harness::new(config_with_interval(6));
    let p1 = h.register(1).await;

    observe(&h, &p1, 0, vec![InventoryItem::new("A", 5), InventoryItem::new("C", 1)]).await;
    observe(&h, &p1, 1, vec![InventoryItem::new("A", 7), InventoryItem::new("C", 1)]).await;
    observe(&h, &p1, 2, vec![InventoryItem::new("A", 7), InventoryItem::new("B", 3)]).await;
    observe(&h, &p1, 3, vec![InventoryItem::new("A", 2), InventoryItem::new("B", 3)]).await;

    let query = |at| InventoryAtQuery {
        player_id: "P1".to_string(),
        game_server_id: SERVER.to_string(),
        at: hour(at),
    };

    let state = get_player_inventory_at(&h.state, &h.domain, query(4)).await.unwrap();
    let quantities = state
        .iter()
        .map(|entry| (entry.item_id.as_str(), entry.quantity))
        .collect::<Vec<_>>();
    assert_eq!(quantities, vec![("item-A", 2), ("item-B", 3)]);
    assert_eq!(state[0].item_name.as_deref(), Some("Item A"));

    let earlier = get_player_inventory_at(&h.state, &h.domain, query(1)).await.unwrap();
    let quantities = earlier
        .iter()
        .map(|entry| (entry.item_id.as_str(), entry.quantity))
        .collect::<Vec<_>>();
    assert_eq!(quantities, vec![("item-A", 7), ("item-C", 1)]);
}

#[tokio::test]
async fn players_by_item_combines_baselines_and_presence_diffs() {
    let h = Harness::new(config_with_interval(6));
    let p1 = h.register(1).await;
    let p2 = h.register(2).await;

    observe(&h, &p1, 0, vec![InventoryItem::new("B", 1)]).await;
    observe(&h, &p2, 0, vec![InventoryItem::new("A", 1)]).await;
    observe(&h, &p2, 1, vec![InventoryItem::new("A", 1), InventoryItem::new("B", 4)]).await;
    observe(&h, &p1, 2, Vec::new()).await;

    let entries = get_players_by_item(
        &h.state,
        &h.domain,
        PlayersByItemQuery {
            item_id: "item-B".to_string(),
            start_date: None,
            end_date: None,
        },
    )
    .await
    .unwrap();

    let seen = entries
        .iter()
        .map(|entry| (entry.association_id.as_str(), entry.source, entry.quantity))
        .collect::<Vec<_>>();
    assert_eq!(
        seen,
        vec![
            (p2.as_str(), HistorySource::Diff, 4),
            (p1.as_str(), HistorySource::Baseline, 1),
        ]
    );

    let windowed = get_players_by_item(
        &h.state,
        &h.domain,
        PlayersByItemQuery {
            item_id: "item-B".to_string(),
            start_date: Some(hour(1)),
            end_date: Some(hour(5)),
        },
    )
    .await
    .unwrap();
    assert_eq!(windowed.len(), 1);
}

fn inventory_at(at: i64) -> InventoryAtQuery {
    InventoryAtQuery {
        player_id: "P1".to_string(),
        game_server_id: SERVER.to_string(),
        at: hour(at),
    }
}

#[tokio::test]
async fn empty_first_observation_writes_nothing() {
    let h = Harness::new(config_with_interval(1));
    let p1 = h.register(1).await;

    let outcome = observe(&h, &p1, 0, Vec::new()).await;
    assert_eq!(outcome, InventoryObservationOutcome::Unchanged);
    assert!(h.store.baseline_rows(&h.domain).await.is_empty());
    assert!(h.store.diff_rows(&h.domain).await.is_empty());

    let state = get_player_inventory_at(&h.state, &h.domain, inventory_at(1)).await.unwrap();
    assert!(state.is_empty());
    let history = get_player_inventory_history(
        &h.state,
        &h.domain,
        InventoryHistoryQuery {
            player_id: "P1".to_string(),
            game_server_id: SERVER.to_string(),
            start_date: hour(0),
            end_date: hour(1),
        },
    )
    .await
    .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn emptied_inventory_at_a_due_baseline_is_recorded() {
    let h = Harness::new(config_with_interval(1));
    let p1 = h.register(1).await;

    observe(&h, &p1, 0, vec![InventoryItem::new("A", 5)]).await;
    let emptied = observe(&h, &p1, 2, Vec::new()).await;
    assert_eq!(emptied, InventoryObservationOutcome::Diff { rows: 1 });

    let diffs = h.store.diff_rows(&h.domain).await;
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].change_type, ChangeType::Removed);
    assert_eq!(diffs[0].previous_quantity, Some(5));

    let state = get_player_inventory_at(&h.state, &h.domain, inventory_at(3)).await.unwrap();
    assert!(state.is_empty());

    let history = get_player_inventory_history(
        &h.state,
        &h.domain,
        InventoryHistoryQuery {
            player_id: "P1".to_string(),
            game_server_id: SERVER.to_string(),
            start_date: hour(0),
            end_date: hour(3),
        },
    )
    .await
    .unwrap();
    let events = history
        .iter()
        .map(|entry| (entry.source, entry.item_id.as_str(), entry.quantity))
        .collect::<Vec<_>>();
    assert_eq!(
        events,
        vec![
            (HistorySource::Diff, "item-A", 0),
            (HistorySource::Baseline, "item-A", 5),
        ]
    );

    // The emptying did not count as a baseline, so the next holding is one.
    let refilled = observe(&h, &p1, 4, vec![InventoryItem::new("B", 1)]).await;
    assert!(matches!(refilled, InventoryObservationOutcome::Baseline { rows: 1, .. }));
    let state = get_player_inventory_at(&h.state, &h.domain, inventory_at(5)).await.unwrap();
    let quantities = state
        .iter()
        .map(|entry| (entry.item_id.as_str(), entry.quantity))
        .collect::<Vec<_>>();
    assert_eq!(quantities, vec![("item-B", 1)]);
}

#[tokio::test(start_paused = true)]
async fn emptied_inventory_after_snapshot_expiry_uses_stored_state() {
    let config = RuntimeConfig {
        baseline_interval_seconds: 6 * 3600,
        snapshot_ttl_seconds: 60,
        ..RuntimeConfig::default()
    };
    let h = Harness::new(config);
    let p1 = h.register(1).await;

    observe(&h, &p1, 0, vec![InventoryItem::new("A", 5), InventoryItem::new("C", 1)]).await;
    tokio::time::advance(StdDuration::from_secs(61)).await;

    let emptied = observe(&h, &p1, 1, Vec::new()).await;
    assert_eq!(emptied, InventoryObservationOutcome::Diff { rows: 2 });

    let state = get_player_inventory_at(&h.state, &h.domain, inventory_at(2)).await.unwrap();
    assert!(state.is_empty());
}

#[tokio::test]
async fn huge_snapshot_ttl_does_not_break_observation() {
    let config = RuntimeConfig {
        snapshot_ttl_seconds: u64::MAX,
        ..config_with_interval(1)
    };
    let h = Harness::new(config);
    let p1 = h.register(1).await;

    let outcome = observe(&h, &p1, 0, vec![InventoryItem::new("A", i64::MAX), InventoryItem::new("A", 1)]).await;
    assert!(matches!(outcome, InventoryObservationOutcome::Baseline { rows: 1, .. }));
    assert_eq!(h.store.baseline_rows(&h.domain).await[0].quantity, i64::MAX);
    assert_eq!(h.state.metrics.inventory_errors(), 0);
}
