//! Active form schema lookup

use crate::connectivity::Connectivity;
use crate::model::FormSchema;
use crate::remote::RemoteStore;
use crate::storage::SchemaCache;
use scout_common::Variant;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SchemaService {
    remote: Arc<dyn RemoteStore>,
    connectivity: Connectivity,
    cache: SchemaCache,
}

impl SchemaService {
    pub fn new(remote: Arc<dyn RemoteStore>, connectivity: Connectivity, cache: SchemaCache) -> Self {
        Self {
            remote,
            connectivity,
            cache,
        }
    }

    /// The schema new observations of `variant` are captured with
    ///
    /// Online, the row flagged current wins and is cached; a backend with no
    /// current row yields None. Offline or on failure the cached schema is used.
    pub async fn current_schema(&self, variant: Variant) -> Option<FormSchema> {
        if !self.connectivity.is_online() {
            return self.cache.get(variant).await;
        }

        let row = match self.remote.select_current_schema(variant).await {
            Ok(row) => row,
            Err(e) => {
                warn!(variant = %variant, error = %e, "Schema fetch failed, using cached schema");
                return self.cache.get(variant).await;
            }
        };

        let Some(row) = row else {
            debug!(variant = %variant, "No current schema on the backend");
            return None;
        };

        match row.into_form_schema() {
            Ok(Some(schema)) => {
                let dupes = schema.duplicate_labels();
                if !dupes.is_empty() {
                    warn!(variant = %variant, labels = ?dupes, "Schema has duplicate field labels");
                }
                self.cache.save(variant, &schema).await;
                Some(schema)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(variant = %variant, error = %e, "Schema row is malformed, using cached schema");
                self.cache.get(variant).await
            }
        }
    }
}
