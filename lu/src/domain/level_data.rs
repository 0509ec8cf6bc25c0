//! Per-account progression record

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::achievement::Achievement;
use keystore::Record;

/// Account identifier (opaque, assigned by the platform)
pub type AccountId = String;

/// Progression state for one account
///
/// Mutated only through `ProgressionEngine` operations; the engine returns a
/// fresh value instead of editing in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
    pub account_id: AccountId,

    /// Current level (>= 1)
    pub level: u32,

    /// Progress within the current level, always < xp_to_next
    pub xp: u64,

    /// XP needed to leave the current level (> 0)
    pub xp_to_next: u64,

    /// Sum of every XP grant ever applied
    #[serde(rename = "totalXP")]
    pub total_xp: u64,

    pub currency: u64,

    /// Achievements keyed by id; persisted as a flat list
    #[serde(with = "achievement_list", default)]
    pub achievements: BTreeMap<String, Achievement>,

    #[serde(default)]
    pub unlocked_features: BTreeSet<String>,

    #[serde(default)]
    pub streak_days: u32,

    /// Longest streak ever reached
    #[serde(default)]
    pub total_streak_days: u32,

    #[serde(default)]
    pub prestige_level: u32,

    #[serde(default)]
    pub meta_achievements: BTreeSet<String>,

    /// Last write time (unix ms), set by the session on persist
    #[serde(default)]
    pub updated_at: i64,
}

impl LevelData {
    /// Fresh level-1 record
    pub fn new(account_id: impl Into<AccountId>, xp_to_next: u64) -> Self {
        Self {
            account_id: account_id.into(),
            level: 1,
            xp: 0,
            xp_to_next,
            total_xp: 0,
            currency: 0,
            achievements: BTreeMap::new(),
            unlocked_features: BTreeSet::new(),
            streak_days: 0,
            total_streak_days: 0,
            prestige_level: 0,
            meta_achievements: BTreeSet::new(),
            updated_at: 0,
        }
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.contains_key(id)
    }

    pub fn has_feature(&self, feature_id: &str) -> bool {
        self.unlocked_features.contains(feature_id)
    }

    /// Progress through the current level as a percentage (0.0 - 100.0)
    pub fn progress_percentage(&self) -> f64 {
        if self.xp_to_next == 0 {
            return 0.0;
        }
        (self.xp as f64 / self.xp_to_next as f64 * 100.0).min(100.0)
    }

    /// Stamp the record with a write time
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

impl Record for LevelData {
    fn id(&self) -> &str {
        &self.account_id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "level_data"
    }
}

/// Serialize the id-keyed achievement map as a list of achievements
mod achievement_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::Achievement;

    pub fn serialize<S: Serializer>(map: &BTreeMap<String, Achievement>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<String, Achievement>, D::Error> {
        let list = Vec::<Achievement>::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for achievement in list {
            // first occurrence wins
            map.entry(achievement.id.clone()).or_insert(achievement);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let data = LevelData::new("acct-1", 100);
        assert_eq!(data.level, 1);
        assert_eq!(data.xp, 0);
        assert_eq!(data.xp_to_next, 100);
        assert_eq!(data.total_xp, 0);
        assert!(data.achievements.is_empty());
        assert_eq!(data.id(), "acct-1");
    }

    #[test]
    fn test_progress_percentage() {
        let mut data = LevelData::new("acct-1", 200);
        data.xp = 50;
        assert!((data.progress_percentage() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_persisted_field_names_are_stable() {
        let mut data = LevelData::new("acct-1", 100);
        data.achievements
            .insert("a".to_string(), Achievement::new("a", "A").with_xp_reward(10));
        data.unlocked_features.insert("profile".to_string());

        let json = serde_json::to_value(&data).unwrap();
        for key in [
            "accountId",
            "level",
            "xp",
            "xpToNext",
            "totalXP",
            "currency",
            "achievements",
            "unlockedFeatures",
            "streakDays",
            "totalStreakDays",
            "prestigeLevel",
            "metaAchievements",
        ] {
            assert!(json.get(key).is_some(), "missing field {}", key);
        }
        assert!(json["achievements"].is_array());
        assert_eq!(json["achievements"][0]["id"], "a");
    }

    #[test]
    fn test_duplicate_achievements_in_record_collapse() {
        let json = serde_json::json!({
            "accountId": "acct-1",
            "level": 1,
            "xp": 0,
            "xpToNext": 100,
            "totalXP": 0,
            "currency": 0,
            "achievements": [
                {"id": "a", "title": "First", "description": "", "icon": ""},
                {"id": "a", "title": "Second", "description": "", "icon": ""}
            ]
        });
        let data: LevelData = serde_json::from_value(json).unwrap();
        assert_eq!(data.achievements.len(), 1);
        assert_eq!(data.achievements["a"].title, "First");
    }
}
