//! Mirror of backend rows, per variant and team

use super::{read_list, remote_cache_key, write_json};
use crate::model::CanonicalRecord;
use scout_common::db::KvStore;
use scout_common::Variant;
use tracing::error;

/// Last successful remote fetch for each (variant, team)
#[derive(Clone)]
pub struct RemoteCache {
    kv: KvStore,
}

impl RemoteCache {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn get(&self, variant: Variant, team_id: &str) -> Vec<CanonicalRecord> {
        read_list(&self.kv, &remote_cache_key(variant, team_id)).await
    }

    /// Overwrite the mirror with a fresh fetch
    pub async fn save(&self, variant: Variant, team_id: &str, records: &[CanonicalRecord]) -> bool {
        write_json(&self.kv, &remote_cache_key(variant, team_id), records).await
    }

    /// Teams with a cached mirror for `variant`, with when each was last written
    pub async fn cached_teams(&self, variant: Variant) -> Vec<(String, String)> {
        let prefix = remote_cache_key(variant, "");
        match self.kv.entries_with_prefix(&prefix).await {
            Ok(entries) => entries
                .into_iter()
                .filter_map(|e| {
                    let team_id = e.key.strip_prefix(&prefix)?.to_string();
                    (!team_id.is_empty()).then_some((team_id, e.updated_at))
                })
                .collect(),
            Err(e) => {
                error!(prefix = %prefix, error = %e, "Failed to list cached remote rows");
                Vec::new()
            }
        }
    }
}
