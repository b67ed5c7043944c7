//! Local durable queue
//!
//! One ordered list of observation records per variant, holding everything
//! captured on this device that the backend has not confirmed yet. Entries
//! are kept as raw JSON while rewriting the list, so an entry this build
//! cannot decode is carried along instead of being dropped.

use super::{local_queue_key, read_list, write_json};
use crate::model::{NaturalKey, ObservationRecord};
use scout_common::db::KvStore;
use scout_common::Variant;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Per-variant queue of undelivered observations
#[derive(Clone)]
pub struct LocalQueue {
    kv: KvStore,
    locks: Arc<VariantLocks>,
}

#[derive(Default)]
struct VariantLocks {
    match_queue: Mutex<()>,
    pit_queue: Mutex<()>,
}

impl LocalQueue {
    pub fn new(kv: KvStore) -> Self {
        Self {
            kv,
            locks: Arc::new(VariantLocks::default()),
        }
    }

    /// Serializes read-modify-write cycles on one variant's slot
    async fn lock(&self, variant: Variant) -> MutexGuard<'_, ()> {
        match variant {
            Variant::Match => self.locks.match_queue.lock().await,
            Variant::Pit => self.locks.pit_queue.lock().await,
        }
    }

    async fn read_raw(&self, variant: Variant) -> Vec<Value> {
        read_list(&self.kv, &local_queue_key(variant)).await
    }

    /// All decodable entries, oldest first
    pub async fn get(&self, variant: Variant) -> Vec<ObservationRecord> {
        self.read_raw(variant)
            .await
            .into_iter()
            .filter_map(|entry| decode_entry(variant, entry))
            .collect()
    }

    /// Decodable entries paired with their stored JSON, oldest first
    ///
    /// The stored form is what [`LocalQueue::remove_entries`] matches on.
    pub async fn snapshot(&self, variant: Variant) -> Vec<(Value, ObservationRecord)> {
        self.read_raw(variant)
            .await
            .into_iter()
            .filter_map(|entry| decode_entry(variant, entry.clone()).map(|record| (entry, record)))
            .collect()
    }

    /// Replace the whole queue
    pub async fn save(&self, variant: Variant, records: &[ObservationRecord]) -> bool {
        let _guard = self.lock(variant).await;
        write_json(&self.kv, &local_queue_key(variant), records).await
    }

    /// Add one record at the end; visible to the next `get`
    pub async fn append(&self, record: &ObservationRecord) -> bool {
        let variant = record.variant();
        let _guard = self.lock(variant).await;

        let entry = match serde_json::to_value(record) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(variant = %variant, error = %e, "Could not encode observation for the local queue");
                return false;
            }
        };

        let mut entries = self.read_raw(variant).await;
        entries.push(entry);
        let written = write_json(&self.kv, &local_queue_key(variant), &entries).await;
        if written {
            debug!(
                variant = %variant,
                natural_key = %record.natural_key(),
                queued = entries.len(),
                "Appended observation to local queue"
            );
        }
        written
    }

    /// Remove every entry whose natural key is in `keys`
    ///
    /// Duplicates of a delivered key go too. Returns how many entries were
    /// removed; 0 when nothing matched or the write failed.
    pub async fn remove_matching(&self, variant: Variant, keys: &HashSet<NaturalKey>) -> usize {
        if keys.is_empty() {
            return 0;
        }
        let _guard = self.lock(variant).await;

        let entries = self.read_raw(variant).await;
        let before = entries.len();
        let kept: Vec<Value> = entries
            .into_iter()
            .filter(|entry| match decode_entry(variant, entry.clone()) {
                Some(record) => !keys.contains(&record.natural_key()),
                None => true,
            })
            .collect();
        let removed = before - kept.len();

        if removed == 0 {
            return 0;
        }
        if !write_json(&self.kv, &local_queue_key(variant), &kept).await {
            return 0;
        }

        info!(variant = %variant, removed, remaining = kept.len(), "Pruned delivered records from local queue");
        removed
    }

    /// Remove one stored occurrence per entry in `entries`
    ///
    /// Matches on the exact stored JSON, oldest occurrence first, so records
    /// appended after `entries` were read stay queued even when they share a
    /// natural key. Returns how many entries were removed.
    pub async fn remove_entries(&self, variant: Variant, entries: &[Value]) -> usize {
        if entries.is_empty() {
            return 0;
        }
        let _guard = self.lock(variant).await;

        let mut stored = self.read_raw(variant).await;
        let mut removed = 0;
        for entry in entries {
            if let Some(pos) = stored.iter().position(|e| e == entry) {
                stored.remove(pos);
                removed += 1;
            }
        }

        if removed == 0 {
            return 0;
        }
        if !write_json(&self.kv, &local_queue_key(variant), &stored).await {
            return 0;
        }

        info!(variant = %variant, removed, remaining = stored.len(), "Pruned delivered records from local queue");
        removed
    }

    /// Drop every queued record for `variant`
    pub async fn clear(&self, variant: Variant) -> bool {
        let _guard = self.lock(variant).await;
        write_json(&self.kv, &local_queue_key(variant), &Vec::<Value>::new()).await
    }

    /// Number of entries in the slot, including ones that do not decode
    pub async fn len(&self, variant: Variant) -> usize {
        self.read_raw(variant).await.len()
    }

    pub async fn is_empty(&self, variant: Variant) -> bool {
        self.len(variant).await == 0
    }
}

fn decode_entry(variant: Variant, entry: Value) -> Option<ObservationRecord> {
    match serde_json::from_value::<ObservationRecord>(entry) {
        Ok(record) if record.variant() == variant => Some(record),
        Ok(record) => {
            warn!(
                variant = %variant,
                natural_key = %record.natural_key(),
                "Queue entry belongs to the other variant, skipping"
            );
            None
        }
        Err(e) => {
            warn!(variant = %variant, error = %e, "Skipping undecodable queue entry");
            None
        }
    }
}
