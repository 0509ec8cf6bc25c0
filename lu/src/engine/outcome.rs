//! Results of engine operations

use crate::catalog::LevelCatalogEntry;
use crate::domain::LevelData;
use crate::events::ProgressEvent;

/// Result of adding XP
#[derive(Debug, Clone)]
pub struct XpOutcome {
    pub state: LevelData,
    pub leveled_up: bool,
    /// Catalog entries for every level crossed, in order
    pub rewards: Vec<LevelCatalogEntry>,
    pub events: Vec<ProgressEvent>,
}

/// Result of granting an achievement
#[derive(Debug, Clone)]
pub struct AchievementOutcome {
    pub state: LevelData,
    /// False when the account already held the achievement (state unchanged)
    pub is_new: bool,
    pub leveled_up: bool,
    pub events: Vec<ProgressEvent>,
}

/// Result of a streak update
#[derive(Debug, Clone)]
pub struct StreakOutcome {
    pub state: LevelData,
    pub streak_bonus: u64,
    /// Milestone achievement granted by this update, if any
    pub milestone: Option<String>,
    pub events: Vec<ProgressEvent>,
}

/// Result of recording a day of activity (streak update plus bonus XP)
#[derive(Debug, Clone)]
pub struct ActivityOutcome {
    pub state: LevelData,
    pub streak_bonus: u64,
    pub milestone: Option<String>,
    pub leveled_up: bool,
    pub events: Vec<ProgressEvent>,
}

/// Result of a successful prestige
#[derive(Debug, Clone)]
pub struct PrestigeOutcome {
    pub state: LevelData,
    pub events: Vec<ProgressEvent>,
}

/// Result of evaluating meta-achievements
#[derive(Debug, Clone)]
pub struct MetaOutcome {
    pub state: LevelData,
    pub newly_granted: Vec<String>,
    pub events: Vec<ProgressEvent>,
}
