//! Event types for progression notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::LevelCatalogEntry;
use crate::domain::Achievement;

/// Everything a progression transaction can announce
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
    /// One or more levels gained; `rewards` holds every catalog entry crossed
    LevelUp {
        account_id: String,
        new_level: u32,
        rewards: Vec<LevelCatalogEntry>,
    },
    AchievementUnlocked {
        account_id: String,
        achievement: Achievement,
    },
    StreakBonus {
        account_id: String,
        amount: u64,
        streak_days: u32,
    },
    Prestige {
        account_id: String,
        prestige_level: u32,
    },
    MetaAchievementUnlocked {
        account_id: String,
        meta_id: String,
    },
}

impl ProgressEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::LevelUp { .. } => "LevelUp",
            Self::AchievementUnlocked { .. } => "AchievementUnlocked",
            Self::StreakBonus { .. } => "StreakBonus",
            Self::Prestige { .. } => "Prestige",
            Self::MetaAchievementUnlocked { .. } => "MetaAchievementUnlocked",
        }
    }

    pub fn account_id(&self) -> &str {
        match self {
            Self::LevelUp { account_id, .. }
            | Self::AchievementUnlocked { account_id, .. }
            | Self::StreakBonus { account_id, .. }
            | Self::Prestige { account_id, .. }
            | Self::MetaAchievementUnlocked { account_id, .. } => account_id,
        }
    }
}

/// A logged event with its id and timestamp
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ProgressEvent,
}

impl EventLogEntry {
    pub fn new(event: ProgressEvent) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
