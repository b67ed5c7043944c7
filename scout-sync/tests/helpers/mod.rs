//! Shared fixtures for scout-sync integration tests

#![allow(dead_code)]

mod memory;

pub use memory::InMemoryRemote;

use scout_common::db::{init_database, KvStore};
use scout_sync::model::{
    FieldDescriptor, FieldType, MatrixRow, ObservationRecord, ObservationTarget, SessionUser,
};
use scout_sync::remote::{ScheduleRow, SchemaRow};
use scout_sync::{ScoutSync, SyncConfig};
use scout_common::Variant;
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEAM: &str = "team";

/// Fresh on-disk database; keep the TempDir alive for the test's duration
pub async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("scout.db")).await.unwrap();
    (dir, pool)
}

pub async fn test_kv() -> (TempDir, KvStore) {
    let (dir, pool) = test_pool().await;
    (dir, KvStore::new(pool))
}

pub struct Harness {
    pub _dir: TempDir,
    /// Same database the sync core uses
    pub kv: KvStore,
    pub remote: Arc<InMemoryRemote>,
    pub sync: ScoutSync,
}

/// Sync core over an in-memory backend, signed in as `user_id` on [`TEAM`]
pub async fn harness(online: bool, user_id: &str) -> Harness {
    let (dir, pool) = test_pool().await;
    let kv = KvStore::new(pool.clone());
    let remote = Arc::new(InMemoryRemote::new());
    let sync = ScoutSync::new(
        pool,
        remote.clone(),
        SyncConfig {
            start_online: online,
            ..SyncConfig::default()
        },
    );

    let user = SessionUser {
        id: user_id.to_string(),
        email: None,
    };
    assert!(sync.teams().set_session_user(Some(&user)).await);
    assert!(sync.teams().set_current_team(Some(TEAM)).await);

    Harness {
        _dir: dir,
        kv,
        remote,
        sync,
    }
}

pub fn pit_schema() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new(FieldType::Header, "Robot"),
        FieldDescriptor::new(FieldType::Select, "Drivetrain").with_options(["Swerve", "Tank"]),
        FieldDescriptor::new(FieldType::Number, "Weight").required(),
    ]
}

pub fn match_schema() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new(FieldType::Text, "Notes"),
        FieldDescriptor::new(FieldType::Number, "Coral").with_bounds(Some(0.0), Some(10.0)),
        FieldDescriptor::new(FieldType::Boolean, "Climbed"),
        FieldDescriptor::new(FieldType::Matrix, "Cycles").with_rows(vec![
            MatrixRow {
                id: "hi".into(),
                label: "High".into(),
                value: 0.0,
            },
            MatrixRow {
                id: "lo".into(),
                label: "Low".into(),
                value: 0.0,
            },
        ]),
    ]
}

pub fn values(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn pit_record(team_number: i64) -> ObservationRecord {
    ObservationRecord {
        data: values(json!({"field_1": "Swerve", "field_2": "112"})),
        schema: pit_schema(),
        form_name: "Pit Scouting".into(),
        event_code: Some("2025casj".into()),
        team_id: Some(TEAM.into()),
        scouter_id: None,
        target: ObservationTarget::Pit { team_number },
    }
}

pub fn match_record(match_number: i64, team_number: i64, team_location: i64) -> ObservationRecord {
    ObservationRecord {
        data: values(json!({"field_0": "quick", "field_1": "4", "field_2": true, "field_3_hi": 2})),
        schema: match_schema(),
        form_name: "Match Scouting".into(),
        event_code: Some("2025casj".into()),
        team_id: Some(TEAM.into()),
        scouter_id: None,
        target: ObservationTarget::Match {
            match_number,
            team_number,
            team_location,
        },
    }
}

pub fn match_schedule(assignments: Value) -> ScheduleRow {
    ScheduleRow {
        team: Some(TEAM.into()),
        variant: Some(Variant::Match),
        schedule_json: json!({ "assignments": assignments }),
        extra: Map::new(),
    }
}

pub fn pit_schedule(roster: Value) -> ScheduleRow {
    ScheduleRow {
        team: Some(TEAM.into()),
        variant: Some(Variant::Pit),
        schedule_json: roster,
        extra: Map::new(),
    }
}

pub fn schema_row(variant: Variant, name: &str, fields: Value) -> SchemaRow {
    SchemaRow {
        name: Some(name.to_string()),
        schema: json!({ "fields": fields }),
        scouting_type: Some(variant),
        current: true,
        extra: Map::new(),
    }
}
