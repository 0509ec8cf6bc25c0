//! Career Coins

use tracing::debug;

use super::ProgressionEngine;
use super::error::EngineError;
use crate::domain::LevelData;

impl ProgressionEngine<'_> {
    /// Credit currency
    pub fn add_currency(&self, state: &LevelData, amount: u64) -> Result<LevelData, EngineError> {
        debug!(account_id = %state.account_id, amount, "add_currency: called");
        let mut next = state.clone();
        next.currency = next
            .currency
            .checked_add(amount)
            .ok_or(EngineError::Overflow("currency"))?;
        Ok(next)
    }

    /// Debit currency; fails without touching anything if the balance is short
    pub fn spend_currency(&self, state: &LevelData, amount: u64) -> Result<LevelData, EngineError> {
        debug!(account_id = %state.account_id, amount, balance = state.currency, "spend_currency: called");
        if amount > state.currency {
            return Err(EngineError::InsufficientFunds {
                requested: amount,
                available: state.currency,
            });
        }
        let mut next = state.clone();
        next.currency -= amount;
        Ok(next)
    }
}
