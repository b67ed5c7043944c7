//! Assignment reconciler
//!
//! Expands the backend's schedule rosters into per-scouter work items, keeps
//! the current user's, and drops every item the fused view shows as already
//! scouted. The result fully replaces the cached list on each run.

use crate::connectivity::Connectivity;
use crate::fusion::DataFusionView;
use crate::model::{Assignment, CanonicalRecord, Scout};
use crate::remote::{RemoteStore, ScheduleRow};
use crate::storage::{AssignmentCache, SessionStore};
use scout_common::events::EventBus;
use scout_common::Variant;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Match roster entry inside `schedule_json.assignments`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchRosterEntry {
    user_id: String,
    #[serde(default)]
    team_number: Option<i64>,
    match_number: i64,
    team_position: i64,
}

/// Pit roster entry: every listed scout covers every listed team
#[derive(Debug, Deserialize)]
struct PitRosterEntry {
    teams: Vec<i64>,
    scouts: Vec<Scout>,
}

/// Flatten schedule rows into one assignment per scouter and unit of work
///
/// Rows whose `schedule_json` is not a JSON object or array are skipped. One
/// malformed roster entry fails the whole expansion.
pub fn expand_schedule(
    variant: Variant,
    rows: &[ScheduleRow],
) -> Result<Vec<Assignment>, serde_json::Error> {
    let mut assignments = Vec::new();

    for row in rows {
        match variant {
            Variant::Match => {
                let entries = match &row.schedule_json {
                    Value::Object(doc) => doc.get("assignments").cloned().unwrap_or(Value::Null),
                    _ => continue,
                };
                if entries.is_null() {
                    continue;
                }
                let entries: Vec<MatchRosterEntry> = serde_json::from_value(entries)?;
                assignments.extend(entries.into_iter().map(|e| {
                    Assignment::match_seat(e.user_id, e.match_number, e.team_number, e.team_position)
                }));
            }
            Variant::Pit => {
                let entries: Vec<PitRosterEntry> = match &row.schedule_json {
                    Value::Array(_) => serde_json::from_value(row.schedule_json.clone())?,
                    Value::Object(_) => vec![serde_json::from_value(row.schedule_json.clone())?],
                    _ => continue,
                };
                for entry in entries {
                    for scout in &entry.scouts {
                        for team_number in &entry.teams {
                            assignments.push(Assignment::pit(
                                scout.id.clone(),
                                *team_number,
                                entry.scouts.clone(),
                            ));
                        }
                    }
                }
            }
        }
    }

    Ok(assignments)
}

/// Assignments not yet covered by any fused record
pub fn outstanding(assignments: Vec<Assignment>, fused: &[CanonicalRecord]) -> Vec<Assignment> {
    assignments
        .into_iter()
        .filter(|assignment| !fused.iter().any(|record| assignment.is_satisfied_by(record)))
        .collect()
}

pub struct AssignmentReconciler {
    remote: Arc<dyn RemoteStore>,
    connectivity: Connectivity,
    fusion: Arc<DataFusionView>,
    cache: AssignmentCache,
    session: SessionStore,
}

impl AssignmentReconciler {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        connectivity: Connectivity,
        fusion: Arc<DataFusionView>,
        cache: AssignmentCache,
        session: SessionStore,
    ) -> Self {
        Self {
            remote,
            connectivity,
            fusion,
            cache,
            session,
        }
    }

    /// Outstanding work for `user_id` on `team_id`
    ///
    /// Offline, or when the schedule can't be fetched or parsed, the last
    /// cached list is returned unchanged.
    pub async fn reconcile(
        &self,
        variant: Variant,
        user_id: Option<&str>,
        team_id: Option<&str>,
    ) -> Vec<Assignment> {
        let (Some(user_id), Some(team_id)) = (
            user_id.filter(|u| !u.is_empty()),
            team_id.filter(|t| !t.is_empty()),
        ) else {
            return Vec::new();
        };

        if !self.connectivity.is_online() {
            debug!(variant = %variant, team_id = %team_id, "Offline, using cached assignments");
            return self.cache.get(variant, user_id, team_id).await;
        }

        let rows = match self.remote.select_schedules(variant, team_id).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(variant = %variant, team_id = %team_id, error = %e, "Schedule fetch failed, using cached assignments");
                return self.cache.get(variant, user_id, team_id).await;
            }
        };

        let expanded = match expand_schedule(variant, &rows) {
            Ok(expanded) => expanded,
            Err(e) => {
                warn!(variant = %variant, team_id = %team_id, error = %e, "Schedule document is malformed, using cached assignments");
                return self.cache.get(variant, user_id, team_id).await;
            }
        };

        let mine: Vec<Assignment> = expanded
            .into_iter()
            .filter(|assignment| assignment.scouter_id == user_id)
            .collect();

        let fused = self.fusion.fused(variant, team_id).await;
        let remaining = outstanding(mine, &fused);

        self.cache.save(variant, user_id, team_id, &remaining).await;
        debug!(
            variant = %variant,
            team_id = %team_id,
            outstanding = remaining.len(),
            "Reconciled assignments"
        );
        remaining
    }

    /// Reconcile for the signed-in user and selected team
    pub async fn reconcile_current(&self, variant: Variant) -> Vec<Assignment> {
        let user = self.session.user().await;
        let team_id = self.session.current_team_id().await;
        self.reconcile(variant, user.as_ref().map(|u| u.id.as_str()), team_id.as_deref())
            .await
    }
}

/// Keep a variant's assignment list current in the background
///
/// Re-runs the reconciler at startup, on every event that invalidates the
/// variant, and on a fixed timer. The task ends when every receiver of the
/// returned channel has been dropped.
pub fn spawn_assignment_watcher(
    reconciler: Arc<AssignmentReconciler>,
    event_bus: &EventBus,
    variant: Variant,
    refresh_every: Duration,
) -> (watch::Receiver<Vec<Assignment>>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(Vec::new());
    let mut events = event_bus.subscribe();

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(refresh_every);
        info!(variant = %variant, "Assignment watcher started");

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                _ = ticker.tick() => {}
                received = events.recv() => match received {
                    Ok(event) if event.invalidates(variant) => {
                        debug!(variant = %variant, event = event.event_type(), "Assignments invalidated");
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(variant = %variant, skipped, "Assignment watcher lagged behind events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }

            let assignments = reconciler.reconcile_current(variant).await;
            tx.send_replace(assignments);
        }

        info!(variant = %variant, "Assignment watcher stopped");
    });

    (rx, handle)
}
