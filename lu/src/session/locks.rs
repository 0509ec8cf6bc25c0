//! Per-account serialization

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::error::SessionError;

/// Idle locks are dropped once the map grows past this
const PRUNE_THRESHOLD: usize = 1_024;

/// One async mutex per account; different accounts never contend
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait up to `timeout` for exclusive access to an account
    pub async fn acquire(&self, account_id: &str, timeout: Duration) -> Result<OwnedMutexGuard<()>, SessionError> {
        debug!(%account_id, "AccountLocks::acquire: called");
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(account_id.to_string()).or_default().clone()
        };

        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| SessionError::LockTimeout {
                account_id: account_id.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    /// Number of accounts with a lock entry
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_account_times_out_while_held() {
        let locks = AccountLocks::new();
        let _held = locks.acquire("a", Duration::from_millis(50)).await.unwrap();

        let err = locks.acquire("a", Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, SessionError::LockTimeout { .. }));
    }

    #[tokio::test]
    async fn test_accounts_are_independent() {
        let locks = AccountLocks::new();
        let _a = locks.acquire("a", Duration::from_millis(50)).await.unwrap();
        assert!(locks.acquire("b", Duration::from_millis(20)).await.is_ok());
        assert_eq!(locks.len().await, 2);
    }

    #[tokio::test]
    async fn test_released_on_drop() {
        let locks = AccountLocks::new();
        drop(locks.acquire("a", Duration::from_millis(50)).await.unwrap());
        assert!(locks.acquire("a", Duration::from_millis(20)).await.is_ok());
    }
}
