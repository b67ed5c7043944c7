//! Reupload coordinator
//!
//! Re-delivers everything in the local queue once the backend is reachable.
//! All queued records of a variant go out concurrently; only the entries the
//! backend confirmed are pruned, in a single queue write at the end. Records
//! queued while a pass is in flight are left for the next pass.

use crate::connectivity::Connectivity;
use crate::remote::{RemoteStore, ResponseInsert};
use crate::storage::{LocalQueue, SessionStore};
use crate::submission::deliver_remote;
use futures::future::join_all;
use scout_common::events::{EventBus, ScoutEvent};
use scout_common::Variant;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of one pass over a variant's queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReuploadReport {
    pub variant: Variant,
    pub attempted: usize,
    pub delivered: usize,
    pub remaining: usize,
    pub skipped_offline: bool,
}

pub struct ReuploadCoordinator {
    remote: Arc<dyn RemoteStore>,
    connectivity: Connectivity,
    queue: LocalQueue,
    session: SessionStore,
    event_bus: EventBus,
}

impl ReuploadCoordinator {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        connectivity: Connectivity,
        queue: LocalQueue,
        session: SessionStore,
        event_bus: EventBus,
    ) -> Self {
        Self {
            remote,
            connectivity,
            queue,
            session,
            event_bus,
        }
    }

    /// Attempt delivery of every queued record of `variant`
    ///
    /// Failed records stay in the queue exactly as they were. A pass never
    /// adds anything to the queue and never removes an entry it did not send.
    pub async fn flush(&self, variant: Variant) -> ReuploadReport {
        if !self.connectivity.is_online() {
            let remaining = self.queue.len(variant).await;
            debug!(variant = %variant, remaining, "Offline, skipping re-upload");
            return ReuploadReport {
                variant,
                attempted: 0,
                delivered: 0,
                remaining,
                skipped_offline: true,
            };
        }

        let queued = self.queue.snapshot(variant).await;
        if queued.is_empty() {
            return ReuploadReport {
                variant,
                attempted: 0,
                delivered: 0,
                remaining: self.queue.len(variant).await,
                skipped_offline: false,
            };
        }

        let attempted = queued.len();
        info!(variant = %variant, queued = attempted, "Re-uploading local queue");

        // Entries queued by older builds carry no scouter
        let session_user = self.session.user().await.map(|u| u.id);
        let payloads: Vec<ResponseInsert> = queued
            .iter()
            .map(|(_, record)| {
                let scouter = record.scouter_id.as_deref().or(session_user.as_deref());
                ResponseInsert::from_record(record, scouter)
            })
            .collect();

        let results = join_all(
            payloads
                .iter()
                .map(|payload| deliver_remote(self.remote.as_ref(), payload)),
        )
        .await;

        let delivered_entries: Vec<Value> = queued
            .into_iter()
            .zip(results.iter())
            .filter(|(_, result)| result.is_ok())
            .map(|((entry, _), _)| entry)
            .collect();
        let delivered = delivered_entries.len();
        let failed = attempted - delivered;

        let pruned = self.queue.remove_entries(variant, &delivered_entries).await;
        if pruned < delivered {
            warn!(
                variant = %variant,
                delivered,
                pruned,
                "Delivered records could not be pruned; they will be sent again next pass"
            );
        }

        let remaining = self.queue.len(variant).await;
        info!(variant = %variant, attempted, delivered, failed, remaining, "Re-upload pass finished");

        self.event_bus.emit_lossy(ScoutEvent::QueueFlushed {
            variant,
            delivered,
            remaining,
            timestamp: scout_common::time::now(),
        });

        ReuploadReport {
            variant,
            attempted,
            delivered,
            remaining,
            skipped_offline: false,
        }
    }

    /// Flush both variants
    pub async fn flush_all(&self) -> Vec<ReuploadReport> {
        let mut reports = Vec::with_capacity(Variant::ALL.len());
        for variant in Variant::ALL {
            reports.push(self.flush(variant).await);
        }
        reports
    }

    /// Flush every queue whenever connectivity goes from offline to online
    ///
    /// Also flushes once at start when already online. Runs until aborted.
    pub fn spawn_on_reconnect(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        let mut online_rx = self.connectivity.subscribe();

        tokio::spawn(async move {
            let mut was_online = *online_rx.borrow_and_update();
            if was_online {
                coordinator.flush_all().await;
            }

            while online_rx.changed().await.is_ok() {
                let online = *online_rx.borrow_and_update();
                if online && !was_online {
                    info!("Connectivity restored, flushing local queues");
                    coordinator.flush_all().await;
                }
                was_online = online;
            }
        })
    }
}
