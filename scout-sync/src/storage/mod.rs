//! Persisted slots on top of the key-value store
//!
//! Every slot is one JSON blob. Read failures are logged and read as empty,
//! write failures are logged and dropped, so the submission path never fails
//! because local storage did.

pub mod assignments;
pub mod queue;
pub mod remote_cache;
pub mod schema_cache;
pub mod session;

pub use assignments::AssignmentCache;
pub use queue::LocalQueue;
pub use remote_cache::RemoteCache;
pub use schema_cache::SchemaCache;
pub use session::SessionStore;

use scout_common::db::KvStore;
use scout_common::Variant;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

/// Slot holding records queued for delivery
pub fn local_queue_key(variant: Variant) -> String {
    format!("@local_{}_data", variant)
}

/// Slot mirroring the backend rows of one team
pub fn remote_cache_key(variant: Variant, team_id: &str) -> String {
    format!("@remote_{}_data_{}", variant, team_id)
}

/// Slot holding the last reconciled assignment list
pub fn assignments_key(variant: Variant, user_id: &str, team_id: &str) -> String {
    format!("@{}_assignments_{}_{}", variant, user_id, team_id)
}

/// Slot holding the active form schema
pub fn schema_key(variant: Variant) -> String {
    format!("@{}_form_schema", variant)
}

/// Slot holding one team record
pub fn team_key(team_id: &str) -> String {
    format!("@team_{}", team_id)
}

/// Slot holding the teams a user belongs to
pub fn teams_key(user_id: &str) -> String {
    format!("@teams_{}", user_id)
}

pub const SESSION_USER_KEY: &str = "@session_user";
pub const CURRENT_TEAM_KEY: &str = "@current_team";

/// Read a JSON list, treating a missing or unreadable slot as empty
pub(crate) async fn read_list<T: DeserializeOwned>(kv: &KvStore, key: &str) -> Vec<T> {
    read_json(kv, key).await.unwrap_or_default()
}

/// Read a JSON value, logging and swallowing storage errors
pub(crate) async fn read_json<T: DeserializeOwned>(kv: &KvStore, key: &str) -> Option<T> {
    match kv.get_json::<T>(key).await {
        Ok(value) => value,
        Err(e) => {
            error!(key = %key, error = %e, "Failed to read local slot");
            None
        }
    }
}

/// Write a JSON value; returns false (after logging) when the write failed
pub(crate) async fn write_json<T: Serialize + ?Sized>(kv: &KvStore, key: &str, value: &T) -> bool {
    match kv.set_json(key, value).await {
        Ok(()) => true,
        Err(e) => {
            error!(key = %key, error = %e, "Failed to write local slot");
            false
        }
    }
}
