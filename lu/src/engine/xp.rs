//! XP and level-up resolution

use tracing::{debug, info};

use super::error::EngineError;
use super::outcome::XpOutcome;
use super::ProgressionEngine;
use crate::domain::LevelData;
use crate::events::ProgressEvent;

impl ProgressionEngine<'_> {
    /// Add XP, resolving every level threshold crossed in one call
    ///
    /// Each new level found in the catalog pays its currency reward and
    /// unlocks its features. Past the end of the catalog, levels cost the flat
    /// overflow increment so progression never stalls.
    pub fn add_xp(&self, state: &LevelData, amount: u64) -> Result<XpOutcome, EngineError> {
        debug!(account_id = %state.account_id, amount, level = state.level, "add_xp: called");
        let mut next = state.clone();
        next.xp = next.xp.checked_add(amount).ok_or(EngineError::Overflow("xp"))?;
        next.total_xp = next
            .total_xp
            .checked_add(amount)
            .ok_or(EngineError::Overflow("totalXP"))?;

        let flat = self.flat_increment();
        let max_level = self.catalog.max_level();
        let mut rewards = Vec::new();
        let start_level = next.level;

        while next.xp >= next.xp_to_next {
            if next.level >= max_level && next.xp_to_next == flat {
                // nothing left in the table: resolve the remaining levels at once
                let jumps = u32::try_from(next.xp / flat).map_err(|_| EngineError::Overflow("level"))?;
                next.level = next.level.checked_add(jumps).ok_or(EngineError::Overflow("level"))?;
                next.xp %= flat;
                break;
            }

            next.xp -= next.xp_to_next;
            next.level = next.level.checked_add(1).ok_or(EngineError::Overflow("level"))?;

            if let Some(entry) = self.catalog.lookup(next.level) {
                next.currency = next
                    .currency
                    .checked_add(entry.currency_reward)
                    .ok_or(EngineError::Overflow("currency"))?;
                next.unlocked_features.extend(entry.unlocks.iter().cloned());
                rewards.push(entry.clone());
            }

            next.xp_to_next = self.xp_to_next(next.level);
        }

        let leveled_up = next.level > start_level;
        let mut events = Vec::new();
        if leveled_up {
            info!(
                account_id = %next.account_id,
                from = start_level,
                to = next.level,
                rewards = rewards.len(),
                "Level up"
            );
            events.push(ProgressEvent::LevelUp {
                account_id: next.account_id.clone(),
                new_level: next.level,
                rewards: rewards.clone(),
            });
        }

        Ok(XpOutcome {
            state: next,
            leveled_up,
            rewards,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::catalog::{LevelCatalog, LevelCatalogEntry};
    use proptest::prelude::*;

    #[test]
    fn test_add_xp_below_threshold() {
        let fx = Fixture::new();
        let out = fx.engine().add_xp(&fx.fresh(), 75).unwrap();

        assert!(!out.leveled_up);
        assert_eq!(out.state.level, 1);
        assert_eq!(out.state.xp, 75);
        assert_eq!(out.state.total_xp, 75);
        assert!(out.events.is_empty());
    }

    #[test]
    fn test_single_level_up_exact_threshold() {
        let fx = Fixture::new();
        let state = fx.fresh();
        let out = fx.engine().add_xp(&state, state.xp_to_next).unwrap();

        assert!(out.leveled_up);
        assert_eq!(out.state.level, 2);
        assert_eq!(out.state.xp, 0);
        assert_eq!(out.state.xp_to_next, 150);
        for feature in &fx.catalog.lookup(2).unwrap().unlocks {
            assert!(out.state.unlocked_features.contains(feature));
        }
        assert_eq!(out.rewards.len(), 1);
    }

    #[test]
    fn test_multi_level_jump() {
        let fx = Fixture::new();
        let state = fx.fresh();
        let out = fx.engine().add_xp(&state, 260).unwrap();

        let level2 = fx.catalog.lookup(2).unwrap();
        let level3 = fx.catalog.lookup(3).unwrap();
        assert_eq!(out.state.level, 3);
        assert_eq!(out.state.xp, 10);
        assert_eq!(
            out.state.currency,
            state.currency + level2.currency_reward + level3.currency_reward
        );
        assert_eq!(out.rewards.iter().map(|r| r.level).collect::<Vec<_>>(), vec![2, 3]);

        match &out.events[..] {
            [ProgressEvent::LevelUp { new_level, rewards, .. }] => {
                assert_eq!(*new_level, 3);
                assert_eq!(rewards.len(), 2);
            }
            other => panic!("Expected one LevelUp event, got {:?}", other),
        }
    }

    #[test]
    fn test_input_state_untouched() {
        let fx = Fixture::new();
        let state = fx.fresh();
        let before = state.clone();
        let _ = fx.engine().add_xp(&state, 10_000).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_past_catalog_uses_flat_increment() {
        let fx = Fixture::new();
        let state = fx.at_level(25);
        assert_eq!(state.xp_to_next, fx.rules.overflow_xp_per_level);

        let out = fx.engine().add_xp(&state, 12_345).unwrap();
        assert_eq!(out.state.level, 27);
        assert_eq!(out.state.xp, 2_345);
        assert_eq!(out.state.xp_to_next, 5_000);
        assert!(out.rewards.is_empty());
        assert!(out.leveled_up);
    }

    #[test]
    fn test_crossing_end_of_catalog_in_one_grant() {
        let fx = Fixture::new();
        let state = fx.at_level(24);
        let to_25 = state.xp_to_next;

        let out = fx.engine().add_xp(&state, to_25 + 5_000 + 1).unwrap();
        assert_eq!(out.state.level, 26);
        assert_eq!(out.state.xp, 1);
        assert_eq!(out.rewards.len(), 1);
        assert!(out.state.unlocked_features.contains("legend_frame"));
    }

    #[test]
    fn test_custom_catalog_levels_through_every_row() {
        let row = |level: u32, total: u64, delta: u64| LevelCatalogEntry {
            level,
            total_xp_needed: total,
            xp_for_this_level: delta,
            title: format!("Level {}", level),
            currency_reward: 10,
            unlocks: Vec::new(),
            special_rewards: Vec::new(),
        };
        let fx = Fixture {
            catalog: LevelCatalog::new(vec![row(1, 0, 0), row(2, 100, 100), row(3, 400, 300)]).unwrap(),
            ..Fixture::new()
        };

        let short = fx.engine().add_xp(&fx.fresh(), 399).unwrap();
        assert_eq!(short.state.level, 2);
        assert_eq!(short.state.xp, 299);
        assert_eq!(short.state.xp_to_next, 300);

        let exact = fx.engine().add_xp(&fx.fresh(), 400).unwrap();
        assert_eq!(exact.state.level, 3);
        assert_eq!(exact.state.xp, 0);
        assert_eq!(exact.state.xp_to_next, fx.rules.overflow_xp_per_level);
        assert_eq!(exact.state.currency, 20);
    }

    #[test]
    fn test_huge_grant_terminates() {
        let fx = Fixture::new();
        let out = fx.engine().add_xp(&fx.fresh(), 1_000_000_000_000).unwrap();
        assert!(out.state.xp < out.state.xp_to_next);
        assert!(out.state.level > 100_000_000);
    }

    #[test]
    fn test_level_overflow_is_error() {
        let fx = Fixture::new();
        let err = fx.engine().add_xp(&fx.fresh(), u64::MAX / 2).unwrap_err();
        assert_eq!(err, EngineError::Overflow("level"));
    }

    #[test]
    fn test_total_xp_overflow_is_error() {
        let fx = Fixture::new();
        let mut state = fx.fresh();
        state.total_xp = u64::MAX;
        let err = fx.engine().add_xp(&state, 1).unwrap_err();
        assert_eq!(err, EngineError::Overflow("totalXP"));
    }

    proptest! {
        #[test]
        fn prop_total_xp_is_sum_of_grants(amounts in proptest::collection::vec(0u64..20_000, 0..40)) {
            let fx = Fixture::new();
            let engine = fx.engine();
            let mut state = fx.fresh();
            let mut sum = 0u64;

            for amount in amounts {
                let before = state.total_xp;
                state = engine.add_xp(&state, amount).unwrap().state;
                sum += amount;
                prop_assert!(state.total_xp >= before);
                prop_assert_eq!(state.total_xp, sum);
                prop_assert!(state.xp < state.xp_to_next);
                let expected = fx.catalog.unlocks_through(state.level);
                prop_assert!(state.unlocked_features.is_superset(&expected));
            }
        }
    }
}
