//! Feature gating
//!
//! Answers "may this account use feature X". Membership in the account's
//! unlocked set is checked first; the feature's level requirement is the
//! fallback for records whose unlock bookkeeping drifted from their level.

mod builtin;

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::catalog::LevelCatalog;
use crate::domain::{FeatureDefinition, LevelData};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Level {level} unlocks unknown feature {feature_id}")]
    UnknownFeature { level: u32, feature_id: String },

    #[error("Feature {feature_id} requires level {required} but the catalog unlocks it at level {level}")]
    LevelMismatch {
        feature_id: String,
        required: u32,
        level: u32,
    },
}

/// Known gated features, keyed by id
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: HashMap<String, FeatureDefinition>,
}

impl FeatureRegistry {
    pub fn new(features: Vec<FeatureDefinition>) -> Self {
        Self {
            features: features.into_iter().map(|f| (f.id.clone(), f)).collect(),
        }
    }

    /// Student and employer features matching the builtin catalog
    pub fn builtin() -> Self {
        Self::new(builtin::features())
    }

    pub fn get(&self, id: &str) -> Option<&FeatureDefinition> {
        self.features.get(id)
    }

    /// All features ordered by level requirement, then id
    pub fn all(&self) -> Vec<&FeatureDefinition> {
        let mut all: Vec<_> = self.features.values().collect();
        all.sort_by(|a, b| a.level_required.cmp(&b.level_required).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Check every catalog unlock names a known feature and agrees on its level
    pub fn validate_catalog(&self, catalog: &LevelCatalog) -> Result<(), GateError> {
        for entry in catalog.entries() {
            for feature_id in &entry.unlocks {
                let def = self.get(feature_id).ok_or_else(|| GateError::UnknownFeature {
                    level: entry.level,
                    feature_id: feature_id.clone(),
                })?;
                if def.level_required != entry.level {
                    return Err(GateError::LevelMismatch {
                        feature_id: feature_id.clone(),
                        required: def.level_required,
                        level: entry.level,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Read-only feature checks against a level record
#[derive(Debug, Clone, Copy)]
pub struct FeatureGate<'a> {
    registry: &'a FeatureRegistry,
}

impl<'a> FeatureGate<'a> {
    pub fn new(registry: &'a FeatureRegistry) -> Self {
        Self { registry }
    }

    /// Plain membership in the unlocked set
    pub fn is_feature_unlocked(&self, state: &LevelData, feature_id: &str) -> bool {
        state.has_feature(feature_id)
    }

    /// Membership, or a level at or above the feature's requirement
    ///
    /// Unknown feature ids are only accessible through membership.
    pub fn can_access_feature(&self, state: &LevelData, feature_id: &str) -> bool {
        if state.has_feature(feature_id) {
            return true;
        }
        let allowed = self
            .registry
            .get(feature_id)
            .is_some_and(|def| state.level >= def.level_required);
        debug!(account_id = %state.account_id, feature_id, allowed, "can_access_feature: level fallback");
        allowed
    }

    pub fn accessible_features(&self, state: &LevelData) -> Vec<&'a FeatureDefinition> {
        self.registry
            .all()
            .into_iter()
            .filter(|def| self.can_access_feature(state, &def.id))
            .collect()
    }

    /// Features still out of reach, nearest first
    pub fn locked_features(&self, state: &LevelData) -> Vec<&'a FeatureDefinition> {
        self.registry
            .all()
            .into_iter()
            .filter(|def| !self.can_access_feature(state, &def.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureCategory;

    fn state_at(level: u32) -> LevelData {
        let mut state = LevelData::new("acct-1", 100);
        state.level = level;
        state
    }

    #[test]
    fn test_builtin_features_match_builtin_catalog() {
        let registry = FeatureRegistry::builtin();
        registry.validate_catalog(&LevelCatalog::builtin()).unwrap();
        assert_eq!(registry.all().len(), LevelCatalog::builtin().all_unlocks().len());
    }

    #[test]
    fn test_validate_catalog_rejects_unknown_feature() {
        let registry = FeatureRegistry::new(vec![]);
        let err = registry.validate_catalog(&LevelCatalog::builtin()).unwrap_err();
        assert!(matches!(err, GateError::UnknownFeature { level: 1, .. }));
    }

    #[test]
    fn test_membership_check() {
        let registry = FeatureRegistry::builtin();
        let gate = FeatureGate::new(&registry);
        let mut state = state_at(1);
        state.unlocked_features.insert("mentor_chat".to_string());

        assert!(gate.is_feature_unlocked(&state, "mentor_chat"));
        assert!(!gate.is_feature_unlocked(&state, "resume_builder"));
    }

    #[test]
    fn test_level_fallback_when_unlocks_drifted() {
        let registry = FeatureRegistry::builtin();
        let gate = FeatureGate::new(&registry);
        let state = state_at(10);

        assert!(!gate.is_feature_unlocked(&state, "portfolio_showcase"));
        assert!(gate.can_access_feature(&state, "portfolio_showcase"));
        assert!(!gate.can_access_feature(&state, "candidate_search"));
    }

    #[test]
    fn test_unknown_feature_needs_membership() {
        let registry = FeatureRegistry::builtin();
        let gate = FeatureGate::new(&registry);
        let mut state = state_at(99);

        assert!(!gate.can_access_feature(&state, "beta_lab"));
        state.unlocked_features.insert("beta_lab".to_string());
        assert!(gate.can_access_feature(&state, "beta_lab"));
    }

    #[test]
    fn test_accessible_and_locked_partition() {
        let registry = FeatureRegistry::new(vec![
            FeatureDefinition::new("a", "A", 1, FeatureCategory::Core),
            FeatureDefinition::new("c", "C", 9, FeatureCategory::Premium),
            FeatureDefinition::new("b", "B", 5, FeatureCategory::Social),
        ]);
        let gate = FeatureGate::new(&registry);
        let state = state_at(4);

        let accessible: Vec<_> = gate.accessible_features(&state).iter().map(|f| f.id.as_str()).collect();
        let locked: Vec<_> = gate.locked_features(&state).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(accessible, vec!["a"]);
        assert_eq!(locked, vec!["b", "c"]);
    }
}
