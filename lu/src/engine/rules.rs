//! Tunable progression rules

use serde::{Deserialize, Serialize};

/// Minimum level required to prestige
pub const PRESTIGE_MIN_LEVEL: u32 = 20;

/// XP per level once past the end of the catalog
pub const OVERFLOW_XP_PER_LEVEL: u64 = 5_000;

/// Streak bonus XP per consecutive day
pub const PER_DAY_BONUS: u64 = 10;

/// Cap on the daily streak bonus
pub const MAX_DAILY_BONUS: u64 = 100;

/// Progression rules (the `progression:` config section)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineRules {
    #[serde(rename = "prestige-min-level")]
    pub prestige_min_level: u32,

    #[serde(rename = "overflow-xp-per-level")]
    pub overflow_xp_per_level: u64,

    pub streak: StreakRules,
}

impl Default for EngineRules {
    fn default() -> Self {
        Self {
            prestige_min_level: PRESTIGE_MIN_LEVEL,
            overflow_xp_per_level: OVERFLOW_XP_PER_LEVEL,
            streak: StreakRules::default(),
        }
    }
}

/// Streak bonus rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakRules {
    #[serde(rename = "per-day-bonus")]
    pub per_day_bonus: u64,

    #[serde(rename = "max-daily-bonus")]
    pub max_daily_bonus: u64,
}

impl Default for StreakRules {
    fn default() -> Self {
        Self {
            per_day_bonus: PER_DAY_BONUS,
            max_daily_bonus: MAX_DAILY_BONUS,
        }
    }
}

impl StreakRules {
    /// Bonus for a streak of `streak_days`, capped at the daily maximum
    pub fn bonus_for(&self, streak_days: u32) -> u64 {
        (streak_days as u64)
            .saturating_mul(self.per_day_bonus)
            .min(self.max_daily_bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bonus_is_capped() {
        let rules = StreakRules::default();
        assert_eq!(rules.bonus_for(0), 0);
        assert_eq!(rules.bonus_for(3), 30);
        assert_eq!(rules.bonus_for(10), 100);
        assert_eq!(rules.bonus_for(u32::MAX), 100);
    }

    #[test]
    fn test_rules_parse_kebab_case() {
        let rules: EngineRules = serde_yaml::from_str("prestige-min-level: 30\nstreak:\n  per-day-bonus: 5\n").unwrap();
        assert_eq!(rules.prestige_min_level, 30);
        assert_eq!(rules.overflow_xp_per_level, OVERFLOW_XP_PER_LEVEL);
        assert_eq!(rules.streak.per_day_bonus, 5);
        assert_eq!(rules.streak.max_daily_bonus, MAX_DAILY_BONUS);
    }
}
