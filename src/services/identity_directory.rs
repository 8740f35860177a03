use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::clients::CrmBackend;
use crate::error::{AppError, AppResult};
use crate::models::identity::Identity;

/// Resolves actor identifiers to display identities through one batched
/// lookup per aggregation call.
///
/// Failure of the user directory never fails an aggregation: the caller
/// gets an empty map and the normalizer degrades to placeholder labels.
pub struct IdentityDirectory {
    backend: Arc<dyn CrmBackend>,
}

impl IdentityDirectory {
    pub fn new(backend: Arc<dyn CrmBackend>) -> Self {
        Self { backend }
    }

    pub async fn resolve(&self, ids: &HashSet<String>) -> HashMap<String, Identity> {
        // Degrades to an empty map; unresolved actors get placeholder labels.
        self.try_resolve(ids).await.unwrap_or_default()
    }

    async fn try_resolve(&self, ids: &HashSet<String>) -> AppResult<HashMap<String, Identity>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        // Stable request ordering keeps upstream logs and mocks deterministic.
        let mut batch: Vec<String> = ids.iter().cloned().collect();
        batch.sort();

        let identities = self.backend.resolve_identities(&batch).await.map_err(|err| {
            AppError::identity_lookup_degraded(format!("{err} ({} ids requested)", batch.len()))
        })?;

        debug!(
            target: "app::identity",
            requested = batch.len(),
            resolved = identities.len(),
            "identity batch resolved"
        );
        Ok(identities)
    }
}
