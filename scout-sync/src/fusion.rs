//! Data fusion view
//!
//! Read model over the remote mirror and the local queue: backend rows
//! (fresh or cached) first, then everything still queued on this device
//! converted to the backend shape and flagged `is_local`. No deduplication
//! happens here; a record can show up twice between a successful re-upload
//! and the prune that follows it.

use crate::connectivity::Connectivity;
use crate::model::CanonicalRecord;
use crate::remote::{RemoteStore, ResponseInsert};
use crate::storage::{LocalQueue, RemoteCache};
use scout_common::Variant;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct DataFusionView {
    remote: Arc<dyn RemoteStore>,
    connectivity: Connectivity,
    cache: RemoteCache,
    queue: LocalQueue,
}

impl DataFusionView {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        connectivity: Connectivity,
        cache: RemoteCache,
        queue: LocalQueue,
    ) -> Self {
        Self {
            remote,
            connectivity,
            cache,
            queue,
        }
    }

    /// Fused records for one team, fetching from the backend when online
    pub async fn fused(&self, variant: Variant, team_id: &str) -> Vec<CanonicalRecord> {
        if team_id.is_empty() {
            return Vec::new();
        }
        let mut records = self.refresh_remote(variant, team_id).await;
        records.extend(self.local_as_canonical(variant).await);
        records
    }

    /// Fused records from local state only, for rendering without waiting
    pub async fn snapshot(&self, variant: Variant, team_id: &str) -> Vec<CanonicalRecord> {
        if team_id.is_empty() {
            return Vec::new();
        }
        let mut records = self.cache.get(variant, team_id).await;
        records.extend(self.local_as_canonical(variant).await);
        records
    }

    /// Teams whose backend rows are mirrored locally, with the write time
    pub async fn cached_teams(&self, variant: Variant) -> Vec<(String, String)> {
        self.cache.cached_teams(variant).await
    }

    /// Backend rows for one team, or the cached copy when they can't be fetched
    ///
    /// A successful fetch overwrites the cache.
    pub async fn refresh_remote(&self, variant: Variant, team_id: &str) -> Vec<CanonicalRecord> {
        if !self.connectivity.is_online() {
            debug!(variant = %variant, team_id = %team_id, "Offline, using cached remote rows");
            return self.cache.get(variant, team_id).await;
        }

        match self.remote.select_responses(variant, team_id).await {
            Ok(mut rows) => {
                for row in &mut rows {
                    row.is_local = false;
                }
                self.cache.save(variant, team_id, &rows).await;
                debug!(variant = %variant, team_id = %team_id, rows = rows.len(), "Fetched remote rows");
                rows
            }
            Err(e) => {
                warn!(
                    variant = %variant,
                    team_id = %team_id,
                    error = %e,
                    "Remote fetch failed, using cached rows"
                );
                self.cache.get(variant, team_id).await
            }
        }
    }

    /// Every queued record of the variant in backend shape, flagged local
    pub async fn local_as_canonical(&self, variant: Variant) -> Vec<CanonicalRecord> {
        self.queue
            .get(variant)
            .await
            .iter()
            .map(|record| ResponseInsert::from_record(record, record.scouter_id.as_deref()).to_canonical(true))
            .collect()
    }

    /// Snapshot now, plus a task resolving to the refreshed view
    pub async fn refresh_in_background(
        self: &Arc<Self>,
        variant: Variant,
        team_id: &str,
    ) -> (Vec<CanonicalRecord>, JoinHandle<Vec<CanonicalRecord>>) {
        let snapshot = self.snapshot(variant, team_id).await;

        let view = Arc::clone(self);
        let team_id = team_id.to_string();
        let refresh = tokio::spawn(async move { view.fused(variant, &team_id).await });

        (snapshot, refresh)
    }
}
