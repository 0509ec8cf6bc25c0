//! Daily activity streaks

use tracing::debug;

use super::ProgressionEngine;
use super::error::EngineError;
use super::outcome::{ActivityOutcome, StreakOutcome};
use crate::domain::LevelData;
use crate::events::ProgressEvent;

impl ProgressionEngine<'_> {
    /// Advance or reset the streak for one day
    ///
    /// An active day extends the streak, raises the high-water mark and
    /// computes the capped bonus; reaching a milestone grants its achievement
    /// (idempotently). An inactive day resets the streak to zero.
    pub fn update_streak(&self, state: &LevelData, active_today: bool) -> Result<StreakOutcome, EngineError> {
        debug!(account_id = %state.account_id, active_today, streak = state.streak_days, "update_streak: called");
        let mut next = state.clone();

        if !active_today {
            next.streak_days = 0;
            return Ok(StreakOutcome {
                state: next,
                streak_bonus: 0,
                milestone: None,
                events: Vec::new(),
            });
        }

        next.streak_days = next
            .streak_days
            .checked_add(1)
            .ok_or(EngineError::Overflow("streakDays"))?;
        next.total_streak_days = next.total_streak_days.max(next.streak_days);

        let streak_bonus = self.rules.streak.bonus_for(next.streak_days);
        let mut events = Vec::new();
        if streak_bonus > 0 {
            events.push(ProgressEvent::StreakBonus {
                account_id: next.account_id.clone(),
                amount: streak_bonus,
                streak_days: next.streak_days,
            });
        }

        let mut milestone = None;
        if let Some(m) = self.achievements.milestone_at(next.streak_days)
            && let Some(achievement) = self.achievements.get(&m.achievement_id)
        {
            let granted = self.unlock_achievement(&next, achievement)?;
            if granted.is_new {
                milestone = Some(achievement.id.clone());
            }
            next = granted.state;
            events.extend(granted.events);
        }

        Ok(StreakOutcome {
            state: next,
            streak_bonus,
            milestone,
            events,
        })
    }

    /// Record a day: update the streak, then credit the bonus as XP
    pub fn record_activity(&self, state: &LevelData, active_today: bool) -> Result<ActivityOutcome, EngineError> {
        debug!(account_id = %state.account_id, active_today, "record_activity: called");
        let streak = self.update_streak(state, active_today)?;
        let mut events = streak.events;
        let mut next = streak.state;

        if streak.streak_bonus > 0 {
            let xp = self.add_xp(&next, streak.streak_bonus)?;
            next = xp.state;
            events.extend(xp.events);
        }
        let leveled_up = next.level > state.level;

        Ok(ActivityOutcome {
            state: next,
            streak_bonus: streak.streak_bonus,
            milestone: streak.milestone,
            leveled_up,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;

    #[test]
    fn test_active_day_extends_streak() {
        let fx = Fixture::new();
        let out = fx.engine().update_streak(&fx.fresh(), true).unwrap();
        assert_eq!(out.state.streak_days, 1);
        assert_eq!(out.state.total_streak_days, 1);
        assert_eq!(out.streak_bonus, 10);
        assert!(out.milestone.is_none());
    }

    #[test]
    fn test_bonus_capped() {
        let fx = Fixture::new();
        let mut state = fx.fresh();
        state.streak_days = 40;
        state.total_streak_days = 40;
        let out = fx.engine().update_streak(&state, true).unwrap();
        assert_eq!(out.streak_bonus, fx.rules.streak.max_daily_bonus);
    }

    #[test]
    fn test_seven_day_milestone_granted_once() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let mut state = fx.fresh();
        state.streak_days = 6;
        state.total_streak_days = 6;

        let day7 = engine.update_streak(&state, true).unwrap();
        assert_eq!(day7.state.streak_days, 7);
        assert_eq!(day7.milestone.as_deref(), Some("streak_7"));
        assert!(day7.state.has_achievement("streak_7"));
        let count = day7.state.achievements.len();

        let day8 = engine.update_streak(&day7.state, true).unwrap();
        assert_eq!(day8.state.streak_days, 8);
        assert!(day8.milestone.is_none());
        assert_eq!(day8.state.achievements.len(), count);
    }

    #[test]
    fn test_milestone_not_regranted_on_second_streak() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let mut state = fx.fresh();
        state.streak_days = 6;

        let first = engine.update_streak(&state, true).unwrap().state;
        let mut again = engine.update_streak(&first, false).unwrap().state;
        again.streak_days = 6;

        let out = engine.update_streak(&again, true).unwrap();
        assert!(out.milestone.is_none());
        assert_eq!(out.state.total_xp, first.total_xp);
    }

    #[test]
    fn test_inactive_day_resets_streak() {
        let fx = Fixture::new();
        let mut state = fx.fresh();
        state.streak_days = 5;
        state.total_streak_days = 12;

        let out = fx.engine().update_streak(&state, false).unwrap();
        assert_eq!(out.state.streak_days, 0);
        assert_eq!(out.state.total_streak_days, 12);
        assert_eq!(out.streak_bonus, 0);
        assert!(out.events.is_empty());
    }

    #[test]
    fn test_high_water_mark_not_lowered() {
        let fx = Fixture::new();
        let mut state = fx.fresh();
        state.streak_days = 2;
        state.total_streak_days = 20;
        let out = fx.engine().update_streak(&state, true).unwrap();
        assert_eq!(out.state.total_streak_days, 20);
    }

    #[test]
    fn test_record_activity_credits_bonus_xp() {
        let fx = Fixture::new();
        let out = fx.engine().record_activity(&fx.fresh(), true).unwrap();
        assert_eq!(out.streak_bonus, 10);
        assert_eq!(out.state.total_xp, 10);
        assert_eq!(out.state.xp, 10);
    }

    #[test]
    fn test_record_activity_milestone_and_bonus_compose() {
        let fx = Fixture::new();
        let mut state = fx.fresh();
        state.streak_days = 6;

        let out = fx.engine().record_activity(&state, true).unwrap();
        let reward = fx.achievements.get("streak_7").unwrap().xp_reward;
        assert_eq!(out.streak_bonus, 70);
        assert_eq!(out.state.total_xp, reward + 70);
        assert!(out.leveled_up);
        assert_eq!(out.state.level, 2);
    }

    #[test]
    fn test_record_inactive_adds_nothing() {
        let fx = Fixture::new();
        let out = fx.engine().record_activity(&fx.fresh(), false).unwrap();
        assert_eq!(out.streak_bonus, 0);
        assert_eq!(out.state.total_xp, 0);
        assert!(out.events.is_empty());
    }
}
