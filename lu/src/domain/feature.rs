//! Feature definitions gated by progression

use serde::{Deserialize, Serialize};

/// Kind of platform capability a feature unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureCategory {
    Core,
    Social,
    Premium,
    Cosmetic,
}

impl std::fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => write!(f, "core"),
            Self::Social => write!(f, "social"),
            Self::Premium => write!(f, "premium"),
            Self::Cosmetic => write!(f, "cosmetic"),
        }
    }
}

/// A gated feature and the level at which it becomes available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDefinition {
    pub id: String,
    pub name: String,
    pub level_required: u32,
    pub category: FeatureCategory,
}

impl FeatureDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, level_required: u32, category: FeatureCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level_required,
            category,
        }
    }
}
