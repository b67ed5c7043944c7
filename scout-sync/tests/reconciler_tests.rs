//! Tests for assignment reconciliation

mod helpers;

use helpers::{harness, match_record, match_schedule, pit_record, pit_schedule, TEAM};
use scout_common::events::ScoutEvent;
use scout_common::Variant;
use scout_sync::model::{Assignment, AssignmentLocator};
use scout_sync::remote::ResponseInsert;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_scheduled_match_until_scouted() {
    let h = harness(true, "U1").await;
    h.remote
        .add_schedule(match_schedule(json!([
            {"userId": "U1", "matchNumber": 5, "teamNumber": 118, "teamPosition": 1},
            {"userId": "U2", "matchNumber": 5, "teamNumber": 254, "teamPosition": 4}
        ])))
        .await;

    let first = h.sync.assignments(Variant::Match).await;
    assert_eq!(first, vec![Assignment::match_seat("U1", 5, Some(118), 1)]);

    h.sync.submit(match_record(5, 118, 1)).await;

    let second = h.sync.assignments(Variant::Match).await;
    assert!(second.is_empty());
}

#[tokio::test]
async fn test_locally_queued_record_also_satisfies() {
    let h = harness(true, "U1").await;
    h.remote
        .add_schedule(match_schedule(json!([
            {"userId": "U1", "matchNumber": 12, "teamNumber": 293, "teamPosition": 2}
        ])))
        .await;
    h.sync.queue().append(&match_record(12, 293, 2)).await;

    assert!(h.sync.assignments(Variant::Match).await.is_empty());
}

#[tokio::test]
async fn test_seat_only_assignment_matches_any_team() {
    let h = harness(true, "U1").await;
    h.remote
        .add_schedule(match_schedule(json!([
            {"userId": "U1", "matchNumber": 3, "teamPosition": 6},
            {"userId": "U1", "matchNumber": 4, "teamPosition": 6}
        ])))
        .await;
    h.remote
        .add_response(ResponseInsert::from_record(&match_record(3, 4414, 6), Some("U9")).to_canonical(false))
        .await;

    let outstanding = h.sync.assignments(Variant::Match).await;
    assert_eq!(outstanding, vec![Assignment::match_seat("U1", 4, None, 6)]);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let h = harness(true, "U1").await;
    h.remote
        .add_schedule(match_schedule(json!([
            {"userId": "U1", "matchNumber": 1, "teamNumber": 1, "teamPosition": 1},
            {"userId": "U1", "matchNumber": 2, "teamNumber": 2, "teamPosition": 2}
        ])))
        .await;

    let first = h.sync.assignments(Variant::Match).await;
    let second = h.sync.assignments(Variant::Match).await;

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);

    h.sync.set_online(false);
    assert_eq!(h.sync.assignments(Variant::Match).await, first);
}

#[tokio::test]
async fn test_pit_roster_expansion_and_exclusion() {
    let h = harness(true, "U1").await;
    h.remote
        .add_schedule(pit_schedule(json!([
            {"teams": [293, 118, 254], "scouts": [{"id": "U1", "name": "Ada"}, {"id": "U2", "name": "Lin"}]},
            {"teams": [1678], "scouts": [{"id": "U2", "name": "Lin"}]}
        ])))
        .await;
    h.remote
        .add_response(ResponseInsert::from_record(&pit_record(118), Some("U2")).to_canonical(false))
        .await;

    let outstanding = h.sync.assignments(Variant::Pit).await;
    let teams: Vec<i64> = outstanding
        .iter()
        .map(|a| match &a.locator {
            AssignmentLocator::Pit { team_number, .. } => *team_number,
            AssignmentLocator::Match { .. } => panic!("pit schedule produced a match assignment"),
        })
        .collect();

    assert_eq!(teams, vec![293, 254]);
    assert!(outstanding.iter().all(|a| a.scouter_id == "U1"));
}

#[tokio::test]
async fn test_fetch_failure_returns_last_cached_list() {
    let h = harness(true, "U1").await;
    h.remote
        .add_schedule(match_schedule(json!([
            {"userId": "U1", "matchNumber": 9, "teamNumber": 9, "teamPosition": 3}
        ])))
        .await;
    let cached = h.sync.assignments(Variant::Match).await;
    assert_eq!(cached.len(), 1);

    h.remote.set_fail_selects(true).await;
    assert_eq!(h.sync.assignments(Variant::Match).await, cached);
}

#[tokio::test]
async fn test_malformed_schedule_returns_last_cached_list() {
    let h = harness(true, "U1").await;
    h.remote
        .add_schedule(match_schedule(json!([
            {"userId": "U1", "matchNumber": 9, "teamNumber": 9, "teamPosition": 3}
        ])))
        .await;
    let cached = h.sync.assignments(Variant::Match).await;

    h.remote
        .add_schedule(match_schedule(json!([{"userId": "U1", "matchNumber": "nine"}])))
        .await;
    assert_eq!(h.sync.assignments(Variant::Match).await, cached);
}

#[tokio::test]
async fn test_missing_user_or_team_gives_empty_list() {
    let h = harness(true, "U1").await;
    h.remote
        .add_schedule(match_schedule(json!([
            {"userId": "U1", "matchNumber": 1, "teamNumber": 1, "teamPosition": 1}
        ])))
        .await;

    let reconciler = h.sync.reconciler();
    assert!(reconciler.reconcile(Variant::Match, None, Some(TEAM)).await.is_empty());
    assert!(reconciler.reconcile(Variant::Match, Some("U1"), None).await.is_empty());
    assert!(reconciler.reconcile(Variant::Match, Some(""), Some(TEAM)).await.is_empty());
}

#[tokio::test]
async fn test_watcher_recomputes_after_submission() {
    let h = harness(true, "U1").await;
    h.remote
        .add_schedule(match_schedule(json!([
            {"userId": "U1", "matchNumber": 5, "teamNumber": 118, "teamPosition": 1}
        ])))
        .await;

    let (mut rx, handle) = h.sync.watch_assignments(Variant::Match);

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("initial reconcile")
        .unwrap();
    assert_eq!(rx.borrow_and_update().len(), 1);

    h.sync.submit(match_record(5, 118, 1)).await;

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("reconcile after submission")
        .unwrap();
    assert!(rx.borrow_and_update().is_empty());

    drop(rx);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("watcher stops once unobserved")
        .unwrap();
}

#[tokio::test]
async fn test_watcher_ignores_other_variant() {
    let h = harness(true, "U1").await;
    let (mut rx, handle) = h.sync.watch_assignments(Variant::Pit);

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("initial reconcile")
        .unwrap();
    rx.borrow_and_update();

    h.sync.event_bus().emit_lossy(ScoutEvent::ScreenFocused {
        variant: Variant::Match,
        timestamp: chrono::Utc::now(),
    });
    let result = tokio::time::timeout(Duration::from_millis(200), rx.changed()).await;
    assert!(result.is_err(), "match focus must not refresh pit assignments");

    handle.abort();
}
