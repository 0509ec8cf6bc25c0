//! Achievement grants

use tracing::{debug, info};

use super::ProgressionEngine;
use super::error::EngineError;
use super::outcome::AchievementOutcome;
use crate::domain::{Achievement, LevelData};
use crate::events::ProgressEvent;

impl ProgressionEngine<'_> {
    /// Grant an achievement once
    ///
    /// Re-granting an id the account already holds returns `is_new = false`
    /// and the state unchanged. A new achievement with an XP reward is applied
    /// together with any level-ups that reward causes.
    pub fn unlock_achievement(
        &self,
        state: &LevelData,
        achievement: &Achievement,
    ) -> Result<AchievementOutcome, EngineError> {
        debug!(account_id = %state.account_id, achievement_id = %achievement.id, "unlock_achievement: called");
        if state.has_achievement(&achievement.id) {
            debug!(achievement_id = %achievement.id, "unlock_achievement: already held");
            return Ok(AchievementOutcome {
                state: state.clone(),
                is_new: false,
                leveled_up: false,
                events: Vec::new(),
            });
        }

        let mut next = state.clone();
        next.achievements.insert(achievement.id.clone(), achievement.clone());
        info!(account_id = %next.account_id, achievement_id = %achievement.id, "Achievement unlocked");

        let mut events = vec![ProgressEvent::AchievementUnlocked {
            account_id: next.account_id.clone(),
            achievement: achievement.clone(),
        }];
        let mut leveled_up = false;

        if achievement.xp_reward > 0 {
            let xp = self.add_xp(&next, achievement.xp_reward)?;
            next = xp.state;
            leveled_up = xp.leveled_up;
            events.extend(xp.events);
        }

        Ok(AchievementOutcome {
            state: next,
            is_new: true,
            leveled_up,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;

    #[test]
    fn test_unlock_is_idempotent() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let achievement = Achievement::new("first_step", "First Step").with_xp_reward(20);

        let first = engine.unlock_achievement(&fx.fresh(), &achievement).unwrap();
        assert!(first.is_new);
        assert!(first.state.has_achievement("first_step"));
        assert_eq!(first.state.total_xp, 20);

        let second = engine.unlock_achievement(&first.state, &achievement).unwrap();
        assert!(!second.is_new);
        assert_eq!(second.state, first.state);
        assert!(second.events.is_empty());
    }

    #[test]
    fn test_reward_cascades_into_level_up() {
        let fx = Fixture::new();
        let mut state = fx.fresh();
        state.xp = 90;
        let achievement = fx.achievements.get("first_application").unwrap().clone();

        let out = fx.engine().unlock_achievement(&state, &achievement).unwrap();

        assert!(out.is_new);
        assert!(out.leveled_up);
        assert_eq!(out.state.level, 2);
        assert_eq!(out.state.xp, 90);
        assert!(out.state.unlocked_features.contains("resume_builder"));
        assert_eq!(out.events.len(), 2);
        assert_eq!(out.events[0].event_type(), "AchievementUnlocked");
        assert_eq!(out.events[1].event_type(), "LevelUp");
    }

    #[test]
    fn test_zero_reward_adds_no_xp() {
        let fx = Fixture::new();
        let achievement = Achievement::new("badge", "Badge");
        let out = fx.engine().unlock_achievement(&fx.fresh(), &achievement).unwrap();
        assert!(out.is_new);
        assert_eq!(out.state.total_xp, 0);
        assert_eq!(out.events.len(), 1);
    }

    #[test]
    fn test_failed_reward_leaves_no_partial_grant() {
        let fx = Fixture::new();
        let mut state = fx.fresh();
        state.total_xp = u64::MAX;
        let achievement = Achievement::new("big", "Big").with_xp_reward(1);

        let err = fx.engine().unlock_achievement(&state, &achievement).unwrap_err();
        assert_eq!(err, EngineError::Overflow("totalXP"));
        assert!(!state.has_achievement("big"));
    }
}
