//! Database models

use serde::{Deserialize, Serialize};

/// One stored slot in the key-value table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}
