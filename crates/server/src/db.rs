use shared_types::{AppConfig, PolicyConfig};
use std::sync::Arc;

use crate::repo::ClaimRepo;
use crate::storage::{DocumentStorage, MemoryObjectStore};

/// Shared application state passed to Axum handlers via `State`.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<ClaimRepo>,
    pub storage: Arc<DocumentStorage>,
    pub policy: Arc<PolicyConfig>,
}

impl AppState {
    /// Fresh state with an in-memory object store.
    pub fn in_memory(policy: PolicyConfig) -> Self {
        Self {
            repo: Arc::new(ClaimRepo::new()),
            storage: Arc::new(DocumentStorage::Memory(MemoryObjectStore::new())),
            policy: Arc::new(policy),
        }
    }

    /// State with the object store selected by `config.server.storage_dir`.
    pub async fn from_config(config: &AppConfig) -> Result<Self, String> {
        let storage = DocumentStorage::from_settings(config.server.storage_dir.as_deref()).await?;
        Ok(Self {
            repo: Arc::new(ClaimRepo::new()),
            storage: Arc::new(storage),
            policy: Arc::new(config.policy.clone()),
        })
    }
}
