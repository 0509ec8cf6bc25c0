//! Achievement registry: known achievements, streak milestones, meta rules

mod builtin;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Achievement, LevelData};

/// Streak length that grants an achievement the day it is reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakMilestone {
    pub days: u32,
    pub achievement_id: String,
}

/// Long-horizon aggregate a meta rule measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetaMetric {
    TotalStreakDays,
    #[serde(rename = "totalXP")]
    TotalXp,
    Level,
    PrestigeLevel,
    AchievementCount,
}

impl MetaMetric {
    pub fn measure(&self, state: &LevelData) -> u64 {
        match self {
            Self::TotalStreakDays => state.total_streak_days as u64,
            Self::TotalXp => state.total_xp,
            Self::Level => state.level as u64,
            Self::PrestigeLevel => state.prestige_level as u64,
            Self::AchievementCount => state.achievements.len() as u64,
        }
    }
}

/// A meta-achievement granted once `metric >= threshold`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRule {
    pub id: String,
    pub title: String,
    pub metric: MetaMetric,
    pub threshold: u64,
}

impl MetaRule {
    pub fn is_satisfied(&self, state: &LevelData) -> bool {
        self.metric.measure(state) >= self.threshold
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Streak milestone at {days} days references unknown achievement {achievement_id}")]
    UnknownMilestoneAchievement { days: u32, achievement_id: String },

    #[error("Duplicate streak milestone at {0} days")]
    DuplicateMilestone(u32),

    #[error("Duplicate meta rule {0}")]
    DuplicateMetaRule(String),
}

/// Every achievement the platform knows how to grant
#[derive(Debug, Clone, Default)]
pub struct AchievementRegistry {
    achievements: HashMap<String, Achievement>,
    milestones: Vec<StreakMilestone>,
    meta_rules: Vec<MetaRule>,
}

impl AchievementRegistry {
    pub fn new(
        achievements: Vec<Achievement>,
        mut milestones: Vec<StreakMilestone>,
        meta_rules: Vec<MetaRule>,
    ) -> Result<Self, RegistryError> {
        let achievements: HashMap<String, Achievement> =
            achievements.into_iter().map(|a| (a.id.clone(), a)).collect();

        milestones.sort_by_key(|m| m.days);
        for pair in milestones.windows(2) {
            if pair[0].days == pair[1].days {
                return Err(RegistryError::DuplicateMilestone(pair[0].days));
            }
        }
        for m in &milestones {
            if !achievements.contains_key(&m.achievement_id) {
                return Err(RegistryError::UnknownMilestoneAchievement {
                    days: m.days,
                    achievement_id: m.achievement_id.clone(),
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for rule in &meta_rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(RegistryError::DuplicateMetaRule(rule.id.clone()));
            }
        }

        Ok(Self {
            achievements,
            milestones,
            meta_rules,
        })
    }

    /// Bundled student/employer achievements, 7/30/100-day streak milestones
    /// and the long-horizon meta rules
    pub fn builtin() -> Self {
        Self {
            achievements: builtin::achievements().into_iter().map(|a| (a.id.clone(), a)).collect(),
            milestones: builtin::milestones(),
            meta_rules: builtin::meta_rules(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.get(id)
    }

    /// All achievements sorted by id
    pub fn all(&self) -> Vec<&Achievement> {
        let mut all: Vec<_> = self.achievements.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn milestones(&self) -> &[StreakMilestone] {
        &self.milestones
    }

    /// Milestone reached exactly at this streak length
    pub fn milestone_at(&self, streak_days: u32) -> Option<&StreakMilestone> {
        self.milestones.iter().find(|m| m.days == streak_days)
    }

    pub fn meta_rules(&self) -> &[MetaRule] {
        &self.meta_rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_consistent() {
        let builtin = AchievementRegistry::builtin();
        let rebuilt = AchievementRegistry::new(
            builtin::achievements(),
            builtin::milestones(),
            builtin::meta_rules(),
        )
        .unwrap();
        assert_eq!(rebuilt.all().len(), builtin.all().len());
        assert_eq!(builtin.milestone_at(7).unwrap().achievement_id, "streak_7");
        assert!(builtin.milestone_at(8).is_none());
    }

    #[test]
    fn test_rejects_milestone_for_unknown_achievement() {
        let err = AchievementRegistry::new(
            vec![],
            vec![StreakMilestone {
                days: 7,
                achievement_id: "missing".to_string(),
            }],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownMilestoneAchievement { days: 7, .. }));
    }

    #[test]
    fn test_rejects_duplicate_meta_rules() {
        let rule = MetaRule {
            id: "m".to_string(),
            title: "M".to_string(),
            metric: MetaMetric::Level,
            threshold: 1,
        };
        let err = AchievementRegistry::new(vec![], vec![], vec![rule.clone(), rule]).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateMetaRule("m".to_string()));
    }

    #[test]
    fn test_meta_metric_measures_state() {
        let mut state = LevelData::new("acct", 100);
        state.total_streak_days = 400;
        state.prestige_level = 2;
        state.total_xp = 1234;

        assert_eq!(MetaMetric::TotalStreakDays.measure(&state), 400);
        assert_eq!(MetaMetric::PrestigeLevel.measure(&state), 2);
        assert_eq!(MetaMetric::TotalXp.measure(&state), 1234);
        assert_eq!(MetaMetric::Level.measure(&state), 1);
        assert_eq!(MetaMetric::AchievementCount.measure(&state), 0);
    }
}
