//! ProgressionStore - the persistence contract for level records
//!
//! A store holds one [`LevelData`] per account. It knows nothing about
//! progression rules; `SessionController` owns the read-modify-write cycle
//! and serializes it per account.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::LevelData;

/// Errors from store round-trips
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store call timed out after {0}ms")]
    Timeout(u64),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Corrupt record for account {account_id}: {reason}")]
    Corrupt { account_id: String, reason: String },
}

impl StoreError {
    /// Whether re-running the whole get/put round-trip may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Unavailable(_))
    }
}

/// Key-value persistence for level records
#[async_trait]
pub trait ProgressionStore: Send + Sync {
    /// Current record for an account, or `None` if it has never been written
    async fn get(&self, account_id: &str) -> Result<Option<LevelData>, StoreError>;

    /// Atomically replace the record for an account
    async fn put(&self, account_id: &str, data: &LevelData) -> Result<(), StoreError>;

    /// Every account with a stored record, ordered by id
    async fn list_accounts(&self) -> Result<Vec<String>, StoreError>;
}
