//! Achievements granted to an account

use serde::{Deserialize, Serialize};

/// Audience an achievement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Student,
    Employer,
    #[default]
    General,
}

impl std::fmt::Display for AchievementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Employer => write!(f, "employer"),
            Self::General => write!(f, "general"),
        }
    }
}

impl std::str::FromStr for AchievementCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "employer" => Ok(Self::Employer),
            "general" => Ok(Self::General),
            _ => Err(format!("Unknown achievement category: {}", s)),
        }
    }
}

/// A one-time accomplishment, unique by id within an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    /// XP granted when first unlocked
    #[serde(default)]
    pub xp_reward: u64,
    #[serde(default)]
    pub category: AchievementCategory,
}

impl Achievement {
    /// Create an achievement with no XP reward in the general category
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            icon: String::new(),
            xp_reward: 0,
            category: AchievementCategory::General,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_xp_reward(mut self, xp_reward: u64) -> Self {
        self.xp_reward = xp_reward;
        self
    }

    pub fn with_category(mut self, category: AchievementCategory) -> Self {
        self.category = category;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip_strings() {
        for category in [
            AchievementCategory::Student,
            AchievementCategory::Employer,
            AchievementCategory::General,
        ] {
            let parsed: AchievementCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("recruiter".parse::<AchievementCategory>().is_err());
    }

    #[test]
    fn test_achievement_builder() {
        let a = Achievement::new("first_job", "First Job")
            .with_xp_reward(250)
            .with_category(AchievementCategory::Student);
        assert_eq!(a.xp_reward, 250);
        assert_eq!(a.category, AchievementCategory::Student);
        assert!(a.description.is_empty());
    }

    #[test]
    fn test_achievement_serializes_camel_case() {
        let a = Achievement::new("x", "X").with_xp_reward(5);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["xpReward"], 5);
        assert_eq!(json["category"], "general");
    }
}
