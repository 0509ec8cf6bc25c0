//! Engine error types

use thiserror::Error;

/// Typed failures of progression operations
///
/// A failed operation never yields a partially updated state; the caller's
/// input is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Amount must be non-negative, got {0}")]
    NegativeAmount(i64),

    #[error("Insufficient currency: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("Prestige requires level {required}, account is level {level}")]
    PrestigeLocked { level: u32, required: u32 },

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),
}

/// Validate an amount arriving from outside (CLI, API) as non-negative
pub fn checked_amount(raw: i64) -> Result<u64, EngineError> {
    u64::try_from(raw).map_err(|_| EngineError::NegativeAmount(raw))
}
