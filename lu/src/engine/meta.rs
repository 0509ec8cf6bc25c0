//! Meta-achievement evaluation

use tracing::{debug, info};

use super::ProgressionEngine;
use super::outcome::MetaOutcome;
use crate::domain::LevelData;
use crate::events::ProgressEvent;

impl ProgressionEngine<'_> {
    /// Grant every meta rule the state now satisfies and does not yet hold
    ///
    /// Meta-achievements never carry rewards and survive prestige, so this
    /// cannot fail. Evaluating unchanged state twice grants nothing the second
    /// time.
    pub fn check_meta_achievements(&self, state: &LevelData) -> MetaOutcome {
        debug!(account_id = %state.account_id, "check_meta_achievements: called");
        let mut next = state.clone();
        let mut newly_granted = Vec::new();
        let mut events = Vec::new();

        for rule in self.achievements.meta_rules() {
            if next.meta_achievements.contains(&rule.id) || !rule.is_satisfied(state) {
                continue;
            }
            info!(account_id = %next.account_id, meta_id = %rule.id, "Meta-achievement unlocked");
            next.meta_achievements.insert(rule.id.clone());
            newly_granted.push(rule.id.clone());
            events.push(ProgressEvent::MetaAchievementUnlocked {
                account_id: next.account_id.clone(),
                meta_id: rule.id.clone(),
            });
        }

        MetaOutcome {
            state: next,
            newly_granted,
            events,
        }
    }
}
