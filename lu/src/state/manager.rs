//! StateManager - actor that owns the keystore Store
//!
//! Processes commands via channels for thread-safe access to persistent state.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::{LevelData, Store};
use crate::store::{ProgressionStore, StoreError};

use super::messages::{StateCommand, StateResponse};

const COMMAND_CAPACITY: usize = 256;

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Spawn a new StateManager actor over the store at `store_path`
    ///
    /// Fails if another process already holds the store.
    pub fn spawn(store_path: impl AsRef<Path>) -> eyre::Result<Self> {
        debug!(store_path = %store_path.as_ref().display(), "spawn: called");
        let store = Store::open(store_path.as_ref())?;
        let accounts = store.ids::<LevelData>()?.len();

        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        tokio::spawn(actor_loop(store, rx));

        info!(accounts, "StateManager spawned");
        Ok(Self { tx })
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(build(reply_tx)).await.map_err(|_| stopped())?;
        reply_rx.await.map_err(|_| stopped())?
    }

    /// Re-index from the logs (picks up lines written by an earlier crash)
    pub async fn sync(&self) -> StateResponse<usize> {
        debug!("sync: called");
        self.request(|reply| StateCommand::Sync { reply }).await
    }

    /// Rewrite the level log with one line per account
    pub async fn compact(&self) -> StateResponse<usize> {
        debug!("compact: called");
        self.request(|reply| StateCommand::Compact { reply }).await
    }

    /// Shutdown the StateManager
    pub async fn shutdown(&self) -> StateResponse<()> {
        debug!("shutdown: called");
        self.tx.send(StateCommand::Shutdown).await.map_err(|_| stopped())
    }
}

#[async_trait]
impl ProgressionStore for StateManager {
    async fn get(&self, account_id: &str) -> Result<Option<LevelData>, StoreError> {
        debug!(%account_id, "get: called");
        let account_id = account_id.to_string();
        self.request(|reply| StateCommand::Get { account_id, reply }).await
    }

    async fn put(&self, account_id: &str, data: &LevelData) -> Result<(), StoreError> {
        debug!(%account_id, level = data.level, "put: called");
        if data.account_id != account_id {
            return Err(StoreError::Backend(format!(
                "record for {} written under key {}",
                data.account_id, account_id
            )));
        }
        let data = Box::new(data.clone());
        self.request(|reply| StateCommand::Put { data, reply }).await
    }

    async fn list_accounts(&self) -> Result<Vec<String>, StoreError> {
        debug!("list_accounts: called");
        self.request(|reply| StateCommand::ListAccounts { reply }).await
    }
}

fn stopped() -> StoreError {
    StoreError::Unavailable("state manager stopped".to_string())
}

fn backend_error(account_id: Option<&str>, err: keystore::StoreError) -> StoreError {
    match (err, account_id) {
        (keystore::StoreError::Serialization(e), Some(id)) => StoreError::Corrupt {
            account_id: id.to_string(),
            reason: e.to_string(),
        },
        (keystore::StoreError::Locked(path), _) => StoreError::Unavailable(format!("{} is locked", path.display())),
        (e, _) => StoreError::Backend(e.to_string()),
    }
}

async fn actor_loop(mut store: Store, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("StateManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::Get { account_id, reply } => {
                debug!(%account_id, "actor_loop: Get command");
                let result = store
                    .get::<LevelData>(&account_id)
                    .map_err(|e| backend_error(Some(&account_id), e));
                let _ = reply.send(result);
            }

            StateCommand::Put { data, reply } => {
                debug!(account_id = %data.account_id, "actor_loop: Put command");
                let result = store
                    .upsert(data.as_ref())
                    .map_err(|e| backend_error(Some(&data.account_id), e));
                if let Err(e) = &result {
                    warn!(account_id = %data.account_id, error = %e, "Failed to persist level data");
                }
                let _ = reply.send(result);
            }

            StateCommand::ListAccounts { reply } => {
                debug!("actor_loop: ListAccounts command");
                let result = store.ids::<LevelData>().map_err(|e| backend_error(None, e));
                let _ = reply.send(result);
            }

            StateCommand::Sync { reply } => {
                debug!("actor_loop: Sync command");
                let result = store.sync().map_err(|e| backend_error(None, e));
                let _ = reply.send(result);
            }

            StateCommand::Compact { reply } => {
                debug!("actor_loop: Compact command");
                let result = store.compact::<LevelData>().map_err(|e| backend_error(None, e));
                let _ = reply.send(result);
            }

            StateCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("StateManager actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(account_id: &str, xp: u64) -> LevelData {
        let mut data = LevelData::new(account_id, 100);
        data.xp = xp;
        data.touch();
        data
    }

    #[tokio::test]
    async fn test_state_manager_put_get() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();

        assert!(manager.get("acct-1").await.unwrap().is_none());

        let data = record("acct-1", 40);
        manager.put("acct-1", &data).await.unwrap();
        assert_eq!(manager.get("acct-1").await.unwrap(), Some(data.clone()));

        let mut updated = data.clone();
        updated.xp = 60;
        manager.put("acct-1", &updated).await.unwrap();
        assert_eq!(manager.get("acct-1").await.unwrap().unwrap().xp, 60);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_state_manager_list_accounts() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();

        for id in ["b", "a"] {
            manager.put(id, &record(id, 0)).await.unwrap();
        }
        assert_eq!(manager.list_accounts().await.unwrap(), vec!["a", "b"]);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_state_manager_rejects_mismatched_key() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();

        let err = manager.put("other", &record("acct-1", 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(manager.get("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_state_manager_persists_across_restart() {
        let temp = tempdir().unwrap();
        {
            let manager = StateManager::spawn(temp.path()).unwrap();
            manager.put("acct-1", &record("acct-1", 75)).await.unwrap();
            manager.shutdown().await.unwrap();
        }
        // the actor drops the store (and its lock) after Shutdown
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let manager = StateManager::spawn(temp.path()).unwrap();
        assert_eq!(manager.get("acct-1").await.unwrap().unwrap().xp, 75);
    }

    #[tokio::test]
    async fn test_state_manager_compact() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();
        for xp in 0..5 {
            manager.put("acct-1", &record("acct-1", xp)).await.unwrap();
        }

        assert_eq!(manager.compact().await.unwrap(), 1);
        assert_eq!(manager.sync().await.unwrap(), 1);
        assert_eq!(manager.get("acct-1").await.unwrap().unwrap().xp, 4);
    }

    #[tokio::test]
    async fn test_calls_after_shutdown_are_unavailable() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();
        manager.shutdown().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let err = manager.get("acct-1").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
