//! Last known active form schema per variant

use super::{read_json, schema_key, write_json};
use crate::model::FormSchema;
use scout_common::db::KvStore;
use scout_common::Variant;

#[derive(Clone)]
pub struct SchemaCache {
    kv: KvStore,
}

impl SchemaCache {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn get(&self, variant: Variant) -> Option<FormSchema> {
        read_json(&self.kv, &schema_key(variant)).await
    }

    pub async fn save(&self, variant: Variant, schema: &FormSchema) -> bool {
        write_json(&self.kv, &schema_key(variant), schema).await
    }
}
