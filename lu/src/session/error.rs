//! Session error types

use thiserror::Error;

use crate::engine::EngineError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Timed out after {timeout_ms}ms waiting for account {account_id}")]
    LockTimeout { account_id: String, timeout_ms: u64 },

    #[error("Unknown achievement: {0}")]
    UnknownAchievement(String),
}

impl SessionError {
    /// Whether the caller may safely retry the whole operation
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::LockTimeout { .. } => true,
            Self::Engine(_) | Self::UnknownAchievement(_) => false,
        }
    }
}
