//! Domain types for levelup
//!
//! Core domain types: LevelData (one per account), Achievement, FeatureDefinition.
//! LevelData implements the keystore Record trait for persistence.
//!
//! Persisted field names are camelCase and must stay stable across versions.

mod achievement;
mod feature;
mod level_data;

pub use achievement::{Achievement, AchievementCategory};
pub use feature::{FeatureCategory, FeatureDefinition};
pub use level_data::{AccountId, LevelData};

// Re-export keystore types for convenience
pub use keystore::{Record, Store};
