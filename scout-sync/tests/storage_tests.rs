//! Tests for the persisted queue, caches and session slots

mod helpers;

use helpers::{match_record, pit_record, test_kv, TEAM};
use scout_common::Variant;
use scout_sync::model::{Assignment, NaturalKey, SessionUser, Team};
use scout_sync::storage::{
    local_queue_key, AssignmentCache, LocalQueue, RemoteCache, SessionStore,
};
use serde_json::json;
use std::collections::HashSet;

#[tokio::test]
async fn test_append_is_visible_immediately() {
    let (_dir, kv) = test_kv().await;
    let queue = LocalQueue::new(kv);

    assert!(queue.append(&pit_record(293)).await);

    let queued = queue.get(Variant::Pit).await;
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].natural_key().to_string(), "team-293");
    assert!(queue.get(Variant::Match).await.is_empty());
}

#[tokio::test]
async fn test_remove_matching_removes_all_and_only_matching() {
    let (_dir, kv) = test_kv().await;
    let queue = LocalQueue::new(kv);

    queue.append(&pit_record(293)).await;
    queue.append(&pit_record(118)).await;
    queue.append(&pit_record(293)).await;
    queue.append(&pit_record(254)).await;

    let keys: HashSet<NaturalKey> = [pit_record(293).natural_key()].into_iter().collect();
    let removed = queue.remove_matching(Variant::Pit, &keys).await;

    assert_eq!(removed, 2);
    let left: Vec<i64> = queue
        .get(Variant::Pit)
        .await
        .iter()
        .filter_map(|r| r.key_columns().1)
        .collect();
    assert_eq!(left, vec![118, 254]);
}

#[tokio::test]
async fn test_remove_entries_only_touches_the_snapshot() {
    let (_dir, kv) = test_kv().await;
    let queue = LocalQueue::new(kv);

    queue.append(&pit_record(293)).await;
    queue.append(&pit_record(118)).await;
    let snapshot = queue.snapshot(Variant::Pit).await;
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].1, pit_record(293));

    queue.append(&pit_record(293)).await;

    let sent: Vec<_> = snapshot.into_iter().map(|(entry, _)| entry).collect();
    assert_eq!(queue.remove_entries(Variant::Pit, &sent).await, 2);

    let left = queue.get(Variant::Pit).await;
    assert_eq!(left, vec![pit_record(293)]);
    assert_eq!(queue.remove_entries(Variant::Pit, &[json!({"missing": true})]).await, 0);
}

#[tokio::test]
async fn test_remove_matching_is_scoped_by_team() {
    let (_dir, kv) = test_kv().await;
    let queue = LocalQueue::new(kv);

    let mut other_team = pit_record(293);
    other_team.team_id = Some("other".into());
    queue.append(&other_team).await;
    queue.append(&pit_record(293)).await;

    let keys: HashSet<NaturalKey> = [pit_record(293).natural_key()].into_iter().collect();
    assert_eq!(queue.remove_matching(Variant::Pit, &keys).await, 1);

    let left = queue.get(Variant::Pit).await;
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].team_id.as_deref(), Some("other"));
}

#[tokio::test]
async fn test_undecodable_entries_survive_rewrites() {
    let (_dir, kv) = test_kv().await;
    kv.set_json(&local_queue_key(Variant::Match), &json!([{"legacy": true}]))
        .await
        .unwrap();
    let queue = LocalQueue::new(kv);

    assert!(queue.get(Variant::Match).await.is_empty());
    assert_eq!(queue.len(Variant::Match).await, 1);

    queue.append(&match_record(1, 118, 1)).await;
    let keys: HashSet<NaturalKey> = [match_record(1, 118, 1).natural_key()].into_iter().collect();
    queue.remove_matching(Variant::Match, &keys).await;

    assert_eq!(queue.len(Variant::Match).await, 1);
}

#[tokio::test]
async fn test_corrupt_slot_reads_as_empty() {
    let (_dir, kv) = test_kv().await;
    kv.set_raw(&local_queue_key(Variant::Pit), "{not json").await.unwrap();
    let queue = LocalQueue::new(kv);

    assert!(queue.get(Variant::Pit).await.is_empty());
    assert_eq!(queue.len(Variant::Pit).await, 0);
}

#[tokio::test]
async fn test_concurrent_appends_are_not_lost() {
    let (_dir, kv) = test_kv().await;
    let queue = LocalQueue::new(kv);

    let handles: Vec<_> = (1..=12)
        .map(|team_number| {
            let queue = queue.clone();
            tokio::spawn(async move { queue.append(&pit_record(team_number)).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    assert_eq!(queue.len(Variant::Pit).await, 12);
}

#[tokio::test]
async fn test_clear_and_save() {
    let (_dir, kv) = test_kv().await;
    let queue = LocalQueue::new(kv);

    queue.save(Variant::Pit, &[pit_record(1), pit_record(2)]).await;
    assert_eq!(queue.len(Variant::Pit).await, 2);

    queue.clear(Variant::Pit).await;
    assert!(queue.is_empty(Variant::Pit).await);
}

#[tokio::test]
async fn test_remote_cache_is_per_team() {
    let (_dir, kv) = test_kv().await;
    let cache = RemoteCache::new(kv);
    let row = scout_sync::remote::ResponseInsert::from_record(&pit_record(293), Some("U1"))
        .to_canonical(false);

    cache.save(Variant::Pit, TEAM, &[row.clone()]).await;

    assert_eq!(cache.get(Variant::Pit, TEAM).await, vec![row]);
    assert!(cache.get(Variant::Pit, "other").await.is_empty());
    assert!(cache.get(Variant::Match, TEAM).await.is_empty());

    cache.save(Variant::Pit, "other", &[]).await;
    let teams: Vec<String> = cache.cached_teams(Variant::Pit).await.into_iter().map(|(t, _)| t).collect();
    assert_eq!(teams, vec!["other".to_string(), TEAM.to_string()]);
    assert!(cache.cached_teams(Variant::Match).await.is_empty());
}

#[tokio::test]
async fn test_prune_completed_assignments() {
    let (_dir, kv) = test_kv().await;
    let cache = AssignmentCache::new(kv);
    cache
        .save(
            Variant::Match,
            "U1",
            TEAM,
            &[
                Assignment::match_seat("U1", 5, Some(118), 1),
                Assignment::match_seat("U1", 6, None, 2),
            ],
        )
        .await;

    let removed = cache.prune_completed("U1", TEAM, &match_record(5, 118, 1)).await;
    assert_eq!(removed, 1);

    let removed = cache.prune_completed("U1", TEAM, &match_record(6, 4414, 2)).await;
    assert_eq!(removed, 1);
    assert!(cache.get(Variant::Match, "U1", TEAM).await.is_empty());
}

#[tokio::test]
async fn test_session_slots() {
    let (_dir, kv) = test_kv().await;
    let session = SessionStore::new(kv);

    assert!(session.user().await.is_none());
    let user = SessionUser {
        id: "U1".into(),
        email: Some("u1@example.test".into()),
    };
    session.set_user(Some(&user)).await;
    assert_eq!(session.user().await, Some(user));

    session.set_current_team_id(Some(TEAM)).await;
    assert_eq!(session.current_team_id().await.as_deref(), Some(TEAM));
    session.set_current_team_id(None).await;
    assert!(session.current_team_id().await.is_none());

    let team = Team {
        id: TEAM.into(),
        name: "Iron Wolves".into(),
        slug: None,
        current_event: Some("2025casj".into()),
        primary_owner_user_id: Some("U1".into()),
        is_personal_account: false,
    };
    session.save_team(&team).await;
    assert_eq!(session.cached_team(TEAM).await, Some(team));

    session.set_user(None).await;
    assert!(session.user().await.is_none());
}
