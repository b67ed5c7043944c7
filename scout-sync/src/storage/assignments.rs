//! Cached outstanding assignments, per variant, user and team

use super::{assignments_key, read_list, write_json};
use crate::model::{Assignment, ObservationRecord};
use scout_common::db::KvStore;
use scout_common::Variant;
use tracing::debug;

/// Point-in-time copy of the reconciled work list for offline display
#[derive(Clone)]
pub struct AssignmentCache {
    kv: KvStore,
}

impl AssignmentCache {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn get(&self, variant: Variant, user_id: &str, team_id: &str) -> Vec<Assignment> {
        read_list(&self.kv, &assignments_key(variant, user_id, team_id)).await
    }

    /// Overwrite the cached list
    pub async fn save(
        &self,
        variant: Variant,
        user_id: &str,
        team_id: &str,
        assignments: &[Assignment],
    ) -> bool {
        write_json(&self.kv, &assignments_key(variant, user_id, team_id), assignments).await
    }

    /// Drop cached items the given observation completes
    ///
    /// Used when a record is queued locally, so the offline list stops
    /// showing work that is done but not delivered. Returns how many items
    /// were removed.
    pub async fn prune_completed(
        &self,
        user_id: &str,
        team_id: &str,
        record: &ObservationRecord,
    ) -> usize {
        let variant = record.variant();
        let cached = self.get(variant, user_id, team_id).await;
        let before = cached.len();
        let remaining: Vec<Assignment> = cached
            .into_iter()
            .filter(|assignment| !assignment.is_completed_by(record))
            .collect();
        let removed = before - remaining.len();

        if removed > 0 && self.save(variant, user_id, team_id, &remaining).await {
            debug!(
                variant = %variant,
                natural_key = %record.natural_key(),
                removed,
                "Pruned completed assignments from cache"
            );
            return removed;
        }
        0
    }
}
