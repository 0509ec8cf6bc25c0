//! Prestige

use tracing::{debug, info};

use super::ProgressionEngine;
use super::error::EngineError;
use super::outcome::PrestigeOutcome;
use crate::domain::LevelData;
use crate::events::ProgressEvent;

impl ProgressionEngine<'_> {
    /// Trade achievement history for a prestige level
    ///
    /// Level, XP, currency, unlocks, streaks and meta-achievements are kept.
    pub fn prestige(&self, state: &LevelData) -> Result<PrestigeOutcome, EngineError> {
        debug!(account_id = %state.account_id, level = state.level, "prestige: called");
        let required = self.rules.prestige_min_level;
        if state.level < required {
            return Err(EngineError::PrestigeLocked {
                level: state.level,
                required,
            });
        }

        let mut next = state.clone();
        next.prestige_level = next
            .prestige_level
            .checked_add(1)
            .ok_or(EngineError::Overflow("prestigeLevel"))?;
        next.achievements.clear();

        info!(account_id = %next.account_id, prestige_level = next.prestige_level, "Prestige");
        let events = vec![ProgressEvent::Prestige {
            account_id: next.account_id.clone(),
            prestige_level: next.prestige_level,
        }];

        Ok(PrestigeOutcome { state: next, events })
    }
}
