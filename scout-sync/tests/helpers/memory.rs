//! In-process backend with switchable failure modes

use async_trait::async_trait;
use scout_common::Variant;
use scout_sync::model::{CanonicalRecord, ObservationRecord, Team};
use scout_sync::remote::{RemoteError, RemoteStore, ResponseInsert, ScheduleRow, SchemaRow};
use scout_sync::storage::LocalQueue;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    responses: Vec<CanonicalRecord>,
    schedules: Vec<ScheduleRow>,
    schemas: Vec<SchemaRow>,
    teams: Vec<Team>,
    fail_inserts: bool,
    fail_selects: bool,
    unreachable: bool,
    rejected_team_numbers: HashSet<i64>,
    upsert: bool,
    next_id: i64,
    /// Appended to the queue from inside the next insert call
    append_during_insert: Option<(LocalQueue, ObservationRecord)>,
}

/// Backend kept in memory
///
/// Stores inserted rows the way the hosted tables would, and can be told to
/// fail inserts, fail selects, reject specific teams or enforce the natural
/// key as a unique constraint.
#[derive(Default)]
pub struct InMemoryRemote {
    state: Mutex<State>,
    insert_attempts: AtomicUsize,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every insert fails with a network error
    pub async fn set_fail_inserts(&self, fail: bool) {
        self.state.lock().await.fail_inserts = fail;
    }

    /// Every select fails with a network error
    pub async fn set_fail_selects(&self, fail: bool) {
        self.state.lock().await.fail_selects = fail;
    }

    /// Every call, including `ping`, fails as if the host were down
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().await.unreachable = unreachable;
    }

    /// Inserts for this team number are refused with HTTP 400
    pub async fn reject_team_number(&self, team_number: i64) {
        self.state.lock().await.rejected_team_numbers.insert(team_number);
    }

    /// Ignore inserts whose natural key already exists
    pub async fn set_upsert(&self, upsert: bool) {
        self.state.lock().await.upsert = upsert;
    }

    /// Append `record` to `queue` while the next insert is in flight
    pub async fn append_during_next_insert(&self, queue: LocalQueue, record: ObservationRecord) {
        self.state.lock().await.append_during_insert = Some((queue, record));
    }

    pub async fn add_response(&self, mut record: CanonicalRecord) {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        record.id = Some(state.next_id);
        record.is_local = false;
        state.responses.push(record);
    }

    pub async fn add_schedule(&self, row: ScheduleRow) {
        self.state.lock().await.schedules.push(row);
    }

    pub async fn add_schema(&self, row: SchemaRow) {
        self.state.lock().await.schemas.push(row);
    }

    pub async fn add_team(&self, team: Team) {
        self.state.lock().await.teams.push(team);
    }

    /// Snapshot of every stored response row
    pub async fn responses(&self) -> Vec<CanonicalRecord> {
        self.state.lock().await.responses.clone()
    }

    /// Number of insert calls received, successful or not
    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    fn check_reachable(state: &State) -> Result<(), RemoteError> {
        if state.unreachable {
            return Err(RemoteError::Network("host unreachable".to_string()));
        }
        Ok(())
    }

    fn check_select(state: &State) -> Result<(), RemoteError> {
        Self::check_reachable(state)?;
        if state.fail_selects {
            return Err(RemoteError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn insert_response(&self, row: &ResponseInsert) -> Result<(), RemoteError> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        let pending = self.state.lock().await.append_during_insert.take();
        if let Some((queue, record)) = pending {
            assert!(queue.append(&record).await);
        }
        let mut state = self.state.lock().await;

        Self::check_reachable(&state)?;
        if state.fail_inserts {
            return Err(RemoteError::Network("connection reset".to_string()));
        }
        if let Some(team_number) = row.team_number {
            if state.rejected_team_numbers.contains(&team_number) {
                return Err(RemoteError::Api {
                    status: 400,
                    body: format!("team_number {} rejected", team_number),
                });
            }
        }

        let key = row.natural_key();
        if state.upsert && state.responses.iter().any(|r| r.natural_key() == key) {
            return Ok(());
        }

        state.next_id += 1;
        let mut record = row.to_canonical(false);
        record.id = Some(state.next_id);
        record.created_at = Some(scout_common::time::now_rfc3339());
        state.responses.push(record);
        Ok(())
    }

    async fn select_responses(
        &self,
        variant: Variant,
        team_id: &str,
    ) -> Result<Vec<CanonicalRecord>, RemoteError> {
        let state = self.state.lock().await;
        Self::check_select(&state)?;
        Ok(state
            .responses
            .iter()
            .filter(|r| r.variant == variant && r.team.as_deref() == Some(team_id))
            .cloned()
            .collect())
    }

    async fn select_schedules(
        &self,
        variant: Variant,
        team_id: &str,
    ) -> Result<Vec<ScheduleRow>, RemoteError> {
        let state = self.state.lock().await;
        Self::check_select(&state)?;
        Ok(state
            .schedules
            .iter()
            .filter(|s| s.variant == Some(variant) && s.team.as_deref() == Some(team_id))
            .cloned()
            .collect())
    }

    async fn select_current_schema(&self, variant: Variant) -> Result<Option<SchemaRow>, RemoteError> {
        let state = self.state.lock().await;
        Self::check_select(&state)?;
        Ok(state
            .schemas
            .iter()
            .find(|s| s.current && s.scouting_type == Some(variant))
            .cloned())
    }

    async fn select_team(&self, team_id: &str) -> Result<Option<Team>, RemoteError> {
        let state = self.state.lock().await;
        Self::check_select(&state)?;
        Ok(state
            .teams
            .iter()
            .find(|t| t.id == team_id && !t.is_personal_account)
            .cloned())
    }

    async fn select_teams_for_user(&self, user_id: &str) -> Result<Vec<Team>, RemoteError> {
        let state = self.state.lock().await;
        Self::check_select(&state)?;
        Ok(state
            .teams
            .iter()
            .filter(|t| t.primary_owner_user_id.as_deref() == Some(user_id) && !t.is_personal_account)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        let state = self.state.lock().await;
        Self::check_reachable(&state)
    }
}
