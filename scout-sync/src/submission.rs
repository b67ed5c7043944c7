//! Submission coordinator
//!
//! Routes one captured observation either to the backend or, when offline
//! or when the backend call fails for any reason, into the local queue. A
//! submission never reports failure to its caller: the worst outcome is a
//! queued record waiting for the next re-upload pass.

use crate::connectivity::Connectivity;
use crate::model::ObservationRecord;
use crate::remote::{RemoteError, RemoteStore, ResponseInsert};
use crate::storage::{AssignmentCache, LocalQueue};
use scout_common::events::{EventBus, ScoutEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Lifecycle of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionState {
    /// Record and payload assembled
    Built,
    /// Choosing between backend and local queue
    Routing,
    /// Backend accepted the insert
    DeliveredRemote,
    /// Stored in the local queue for later re-upload
    QueuedLocal,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::DeliveredRemote | SubmissionState::QueuedLocal)
    }
}

/// What happened to a submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub submission_id: Uuid,
    /// Always true: delivery problems degrade to queuing
    pub success: bool,
    pub is_local: bool,
    pub state: SubmissionState,
    /// Why the backend path was abandoned, when it was tried
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Send one payload to the backend, logging refusals by natural key
///
/// Shared by first submissions and re-upload passes.
pub async fn deliver_remote(
    remote: &dyn RemoteStore,
    payload: &ResponseInsert,
) -> Result<(), RemoteError> {
    match remote.insert_response(payload).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if e.is_rejection() {
                warn!(
                    variant = %payload.variant,
                    natural_key = %payload.natural_key(),
                    error = %e,
                    "Backend rejected observation; it stays queued and may never be accepted"
                );
            } else {
                debug!(
                    variant = %payload.variant,
                    natural_key = %payload.natural_key(),
                    error = %e,
                    "Backend delivery failed"
                );
            }
            Err(e)
        }
    }
}

pub struct SubmissionCoordinator {
    remote: Arc<dyn RemoteStore>,
    connectivity: Connectivity,
    queue: LocalQueue,
    assignments: AssignmentCache,
    event_bus: EventBus,
}

impl SubmissionCoordinator {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        connectivity: Connectivity,
        queue: LocalQueue,
        assignments: AssignmentCache,
        event_bus: EventBus,
    ) -> Self {
        Self {
            remote,
            connectivity,
            queue,
            assignments,
            event_bus,
        }
    }

    /// Submit a captured observation on behalf of `user_id`
    ///
    /// The backend is always tried first when online; the local queue is
    /// written only if that attempt is skipped or fails. A record without a
    /// scouter is stamped with `user_id`, so a queued copy keeps its author
    /// until it is re-uploaded.
    pub async fn submit(&self, mut record: ObservationRecord, user_id: Option<&str>) -> SubmissionOutcome {
        let submission_id = Uuid::new_v4();
        if record.scouter_id.is_none() {
            record.scouter_id = user_id.map(str::to_string);
        }
        let variant = record.variant();
        let natural_key = record.natural_key();

        let mut state = SubmissionState::Built;
        debug!(%submission_id, variant = %variant, natural_key = %natural_key, ?state, "Submission built");

        state = SubmissionState::Routing;
        let online = self.connectivity.is_online();
        debug!(%submission_id, online, ?state, "Routing submission");

        let mut failure = None;
        if online {
            let payload = ResponseInsert::from_record(&record, record.scouter_id.as_deref());
            match deliver_remote(self.remote.as_ref(), &payload).await {
                Ok(()) => state = SubmissionState::DeliveredRemote,
                Err(e) => failure = Some(e.to_string()),
            }
        }

        if state != SubmissionState::DeliveredRemote {
            state = SubmissionState::QueuedLocal;
            self.enter_queued_local(&record, user_id).await;
        }

        let is_local = state == SubmissionState::QueuedLocal;
        info!(
            %submission_id,
            variant = %variant,
            natural_key = %natural_key,
            team_id = record.team_id.as_deref().unwrap_or_default(),
            ?state,
            "Submission completed"
        );

        self.event_bus.emit_lossy(ScoutEvent::SubmissionCompleted {
            variant,
            team_id: record.team_id.clone(),
            is_local,
            timestamp: scout_common::time::now(),
        });

        SubmissionOutcome {
            submission_id,
            success: true,
            is_local,
            state,
            error: failure,
        }
    }

    async fn enter_queued_local(&self, record: &ObservationRecord, user_id: Option<&str>) {
        if !self.queue.append(record).await {
            error!(
                variant = %record.variant(),
                natural_key = %record.natural_key(),
                "Observation could not be written to the local queue"
            );
        }

        if let (Some(user_id), Some(team_id)) = (user_id, record.team_id.as_deref()) {
            self.assignments.prune_completed(user_id, team_id, record).await;
        }
    }
}
