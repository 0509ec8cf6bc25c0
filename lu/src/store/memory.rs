//! In-process store for tests and ephemeral runs

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ProgressionStore, StoreError};
use crate::domain::LevelData;

/// Map of account id to record; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, LevelData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressionStore for MemoryStore {
    async fn get(&self, account_id: &str) -> Result<Option<LevelData>, StoreError> {
        debug!(%account_id, "MemoryStore::get: called");
        Ok(self.records.read().await.get(account_id).cloned())
    }

    async fn put(&self, account_id: &str, data: &LevelData) -> Result<(), StoreError> {
        debug!(%account_id, level = data.level, "MemoryStore::put: called");
        self.records.write().await.insert(account_id.to_string(), data.clone());
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records.read().await.keys().cloned().collect())
    }
}
