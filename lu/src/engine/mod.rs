//! Progression engine - pure state transitions for one account
//!
//! Every operation takes the current [`LevelData`] by reference and returns a
//! new value together with the [`ProgressEvent`]s it implies. Nothing here
//! performs I/O, so a failed store round-trip can always be retried by
//! re-running the operation on freshly loaded state.
//!
//! Cascades (achievement -> XP -> level-up -> feature unlock) are composed
//! inside a single call; callers only ever observe the final state.

mod achievement;
mod currency;
mod error;
mod meta;
mod outcome;
mod prestige;
mod rules;
mod streak;
mod xp;

pub use error::{EngineError, checked_amount};
pub use outcome::{AchievementOutcome, ActivityOutcome, MetaOutcome, PrestigeOutcome, StreakOutcome, XpOutcome};
pub use rules::{EngineRules, MAX_DAILY_BONUS, OVERFLOW_XP_PER_LEVEL, PER_DAY_BONUS, PRESTIGE_MIN_LEVEL, StreakRules};

use tracing::debug;

use crate::achievements::AchievementRegistry;
use crate::catalog::LevelCatalog;
use crate::domain::LevelData;

/// Stateless engine borrowing its static inputs
#[derive(Debug, Clone, Copy)]
pub struct ProgressionEngine<'a> {
    catalog: &'a LevelCatalog,
    achievements: &'a AchievementRegistry,
    rules: &'a EngineRules,
}

impl<'a> ProgressionEngine<'a> {
    pub fn new(catalog: &'a LevelCatalog, achievements: &'a AchievementRegistry, rules: &'a EngineRules) -> Self {
        Self {
            catalog,
            achievements,
            rules,
        }
    }

    pub fn catalog(&self) -> &'a LevelCatalog {
        self.catalog
    }

    pub fn achievements(&self) -> &'a AchievementRegistry {
        self.achievements
    }

    pub fn rules(&self) -> &'a EngineRules {
        self.rules
    }

    /// Default record for an account seen for the first time
    pub fn initial_state(&self, account_id: &str) -> LevelData {
        debug!(%account_id, "initial_state: called");
        let mut state = LevelData::new(account_id, self.xp_to_next(1));
        state.unlocked_features = self.catalog.unlocks_through(1);
        state
    }

    /// XP needed to leave `level`; flat increment once past the table
    fn xp_to_next(&self, level: u32) -> u64 {
        self.catalog.xp_to_next(level, self.flat_increment())
    }

    fn flat_increment(&self) -> u64 {
        // zero would never let the level loop terminate
        self.rules.overflow_xp_per_level.max(1)
    }
}
