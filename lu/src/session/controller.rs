//! SessionController - the only writer of level records

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use super::error::SessionError;
use super::locks::AccountLocks;
use crate::achievements::AchievementRegistry;
use crate::catalog::{LevelCatalog, LevelCatalogEntry};
use crate::config::Config;
use crate::domain::LevelData;
use crate::engine::{EngineError, EngineRules, ProgressionEngine, checked_amount};
use crate::events::{EventBus, ProgressEvent};
use crate::gate::{FeatureGate, FeatureRegistry};
use crate::store::{ProgressionStore, StoreError};

pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 50;

/// Timeouts and retry policy for store round-trips
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub store_timeout_ms: u64,
    pub lock_timeout_ms: u64,
    pub max_retries: u32,
    /// Backoff before retry n is n * this
    pub retry_backoff_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

/// Display view of one account's progression
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub account_id: String,
    pub level: u32,
    pub title: Option<String>,
    pub xp: u64,
    pub xp_to_next: u64,
    pub progress_percentage: f64,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub currency: u64,
    pub streak_days: u32,
    pub total_streak_days: u32,
    pub prestige_level: u32,
    pub achievements: Vec<String>,
    pub meta_achievements: Vec<String>,
    pub unlocked_features: Vec<String>,
    pub next_level: Option<LevelCatalogEntry>,
}

/// What one engine step wants written
struct Transition<T> {
    /// None when the operation changed nothing
    state: Option<LevelData>,
    events: Vec<ProgressEvent>,
    value: T,
}

impl<T> Transition<T> {
    fn write(state: LevelData, events: Vec<ProgressEvent>, value: T) -> Self {
        Self {
            state: Some(state),
            events,
            value,
        }
    }

    fn unchanged(value: T) -> Self {
        Self {
            state: None,
            events: Vec::new(),
            value,
        }
    }
}

/// A write whose put failed without telling us whether it landed
struct Unacknowledged<T> {
    state: LevelData,
    events: Vec<ProgressEvent>,
    value: T,
}

/// Applies inbound operations to stored level records
pub struct SessionController {
    store: Arc<dyn ProgressionStore>,
    catalog: Arc<LevelCatalog>,
    achievements: Arc<AchievementRegistry>,
    features: Arc<FeatureRegistry>,
    rules: EngineRules,
    config: SessionConfig,
    events: Arc<EventBus>,
    locks: AccountLocks,
}

impl SessionController {
    /// Controller over `store` with the builtin catalog, registries and rules
    pub fn new(store: Arc<dyn ProgressionStore>, events: Arc<EventBus>) -> Self {
        debug!("SessionController::new: called");
        Self {
            store,
            catalog: Arc::new(LevelCatalog::builtin()),
            achievements: Arc::new(AchievementRegistry::builtin()),
            features: Arc::new(FeatureRegistry::builtin()),
            rules: EngineRules::default(),
            config: SessionConfig::default(),
            events,
            locks: AccountLocks::new(),
        }
    }

    /// Controller wired from configuration: catalog file, rules and store policy
    pub fn from_config(config: &Config, store: Arc<dyn ProgressionStore>, events: Arc<EventBus>) -> eyre::Result<Self> {
        debug!(catalog = ?config.catalog.path, "SessionController::from_config: called");
        let catalog = match &config.catalog.path {
            Some(path) => LevelCatalog::load(path)?,
            None => LevelCatalog::builtin(),
        };
        let features = FeatureRegistry::builtin();
        if let Err(e) = features.validate_catalog(&catalog) {
            warn!(error = %e, "Catalog unlocks disagree with the feature registry");
        }

        Ok(Self::new(store, events)
            .with_catalog(Arc::new(catalog))
            .with_features(Arc::new(features))
            .with_rules(config.progression.clone())
            .with_config(config.storage.session_config()))
    }

    pub fn with_catalog(mut self, catalog: Arc<LevelCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_achievements(mut self, achievements: Arc<AchievementRegistry>) -> Self {
        self.achievements = achievements;
        self
    }

    pub fn with_features(mut self, features: Arc<FeatureRegistry>) -> Self {
        self.features = features;
        self
    }

    pub fn with_rules(mut self, rules: EngineRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn achievements(&self) -> &AchievementRegistry {
        &self.achievements
    }

    pub fn rules(&self) -> &EngineRules {
        &self.rules
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn feature_gate(&self) -> FeatureGate<'_> {
        FeatureGate::new(&self.features)
    }

    fn engine(&self) -> ProgressionEngine<'_> {
        ProgressionEngine::new(&self.catalog, &self.achievements, &self.rules)
    }

    // === Inbound operations ===

    /// Add XP; returns whether the account leveled up
    pub async fn grant_xp(&self, account_id: &str, amount: i64) -> Result<bool, SessionError> {
        debug!(%account_id, amount, "grant_xp: called");
        let amount = checked_amount(amount)?;
        self.transact(account_id, |engine, state| {
            let out = engine.add_xp(state, amount)?;
            Ok(Transition::write(out.state, out.events, out.leveled_up))
        })
        .await
    }

    /// Credit currency; returns the new balance
    pub async fn grant_currency(&self, account_id: &str, amount: i64) -> Result<u64, SessionError> {
        debug!(%account_id, amount, "grant_currency: called");
        let amount = checked_amount(amount)?;
        self.transact(account_id, |engine, state| {
            let next = engine.add_currency(state, amount)?;
            let balance = next.currency;
            Ok(Transition::write(next, Vec::new(), balance))
        })
        .await
    }

    /// Debit currency; false (and nothing written) if the balance is short
    pub async fn spend_currency(&self, account_id: &str, amount: i64) -> Result<bool, SessionError> {
        debug!(%account_id, amount, "spend_currency: called");
        let amount = checked_amount(amount)?;
        self.transact(account_id, |engine, state| match engine.spend_currency(state, amount) {
            Ok(next) => Ok(Transition::write(next, Vec::new(), true)),
            Err(EngineError::InsufficientFunds { requested, available }) => {
                debug!(requested, available, "spend_currency: insufficient funds");
                Ok(Transition::unchanged(false))
            }
            Err(e) => Err(e.into()),
        })
        .await
    }

    /// Grant a registered achievement; returns whether it was new
    pub async fn unlock_achievement(&self, account_id: &str, achievement_id: &str) -> Result<bool, SessionError> {
        debug!(%account_id, %achievement_id, "unlock_achievement: called");
        let achievement = self
            .achievements
            .get(achievement_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownAchievement(achievement_id.to_string()))?;

        self.transact(account_id, |engine, state| {
            let out = engine.unlock_achievement(state, &achievement)?;
            if !out.is_new {
                return Ok(Transition::unchanged(false));
            }
            Ok(Transition::write(out.state, out.events, true))
        })
        .await
    }

    /// Record one day of (in)activity; returns the streak bonus credited as XP
    pub async fn record_daily_activity(&self, account_id: &str, active: bool) -> Result<u64, SessionError> {
        debug!(%account_id, active, "record_daily_activity: called");
        self.transact(account_id, |engine, state| {
            let out = engine.record_activity(state, active)?;
            Ok(Transition::write(out.state, out.events, out.streak_bonus))
        })
        .await
    }

    /// Prestige if the account is eligible; false (and nothing written) if not
    pub async fn request_prestige(&self, account_id: &str) -> Result<bool, SessionError> {
        debug!(%account_id, "request_prestige: called");
        self.transact(account_id, |engine, state| match engine.prestige(state) {
            Ok(out) => Ok(Transition::write(out.state, out.events, true)),
            Err(EngineError::PrestigeLocked { level, required }) => {
                debug!(level, required, "request_prestige: below threshold");
                Ok(Transition::unchanged(false))
            }
            Err(e) => Err(e.into()),
        })
        .await
    }

    /// Grant any newly satisfied meta-achievements; returns their ids
    pub async fn evaluate_meta(&self, account_id: &str) -> Result<Vec<String>, SessionError> {
        debug!(%account_id, "evaluate_meta: called");
        self.transact(account_id, |engine, state| {
            let out = engine.check_meta_achievements(state);
            if out.newly_granted.is_empty() {
                return Ok(Transition::unchanged(Vec::new()));
            }
            Ok(Transition::write(out.state, out.events, out.newly_granted))
        })
        .await
    }

    // === Read-only queries (unlocked, may be stale) ===

    /// Stored record, or the default for an unseen account (not persisted)
    pub async fn level_data(&self, account_id: &str) -> Result<LevelData, SessionError> {
        debug!(%account_id, "level_data: called");
        self.load(account_id).await
    }

    pub async fn progress_percentage(&self, account_id: &str) -> Result<f64, SessionError> {
        Ok(self.load(account_id).await?.progress_percentage())
    }

    /// Catalog row for the account's level; None once past the table
    pub async fn current_level_entry(&self, account_id: &str) -> Result<Option<LevelCatalogEntry>, SessionError> {
        let state = self.load(account_id).await?;
        Ok(self.catalog.lookup(state.level).cloned())
    }

    pub async fn next_level_entry(&self, account_id: &str) -> Result<Option<LevelCatalogEntry>, SessionError> {
        let state = self.load(account_id).await?;
        Ok(self.catalog.next(state.level).cloned())
    }

    pub async fn snapshot(&self, account_id: &str) -> Result<ProgressSnapshot, SessionError> {
        debug!(%account_id, "snapshot: called");
        let state = self.load(account_id).await?;
        // past the table the last title carries over
        let title = self
            .catalog
            .entries()
            .iter()
            .rev()
            .find(|e| e.level <= state.level)
            .map(|e| e.title.clone());

        Ok(ProgressSnapshot {
            progress_percentage: state.progress_percentage(),
            next_level: self.catalog.next(state.level).cloned(),
            title,
            level: state.level,
            xp: state.xp,
            xp_to_next: state.xp_to_next,
            total_xp: state.total_xp,
            currency: state.currency,
            streak_days: state.streak_days,
            total_streak_days: state.total_streak_days,
            prestige_level: state.prestige_level,
            achievements: state.achievements.keys().cloned().collect(),
            meta_achievements: state.meta_achievements.iter().cloned().collect(),
            unlocked_features: state.unlocked_features.iter().cloned().collect(),
            account_id: state.account_id,
        })
    }

    pub async fn is_feature_unlocked(&self, account_id: &str, feature_id: &str) -> Result<bool, SessionError> {
        let state = self.load(account_id).await?;
        Ok(self.feature_gate().is_feature_unlocked(&state, feature_id))
    }

    pub async fn can_access_feature(&self, account_id: &str, feature_id: &str) -> Result<bool, SessionError> {
        let state = self.load(account_id).await?;
        Ok(self.feature_gate().can_access_feature(&state, feature_id))
    }

    pub async fn list_accounts(&self) -> Result<Vec<String>, SessionError> {
        debug!("list_accounts: called");
        Ok(self.bounded(self.store.list_accounts()).await?)
    }

    // === Transaction plumbing ===

    /// Run `op` against the account's record under its lock, retrying
    /// retryable store failures of the whole round-trip
    ///
    /// A put that fails may still have landed. The retry rereads the record
    /// and, if it is exactly the state that put carried, finishes with that
    /// attempt's result instead of applying `op` a second time.
    async fn transact<T, F>(&self, account_id: &str, op: F) -> Result<T, SessionError>
    where
        F: Fn(&ProgressionEngine<'_>, &LevelData) -> Result<Transition<T>, SessionError>,
    {
        let lock_timeout = Duration::from_millis(self.config.lock_timeout_ms);
        let _guard = self.locks.acquire(account_id, lock_timeout).await?;

        let mut unacked = None;
        let mut attempt = 0u32;
        loop {
            match self.round_trip(account_id, &op, &mut unacked).await {
                Err(SessionError::Store(e)) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(%account_id, attempt, error = %e, "Store round-trip failed, retrying");
                    let backoff = self.config.retry_backoff_ms.saturating_mul(attempt as u64);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                result => return result,
            }
        }
    }

    async fn round_trip<T, F>(
        &self,
        account_id: &str,
        op: &F,
        unacked: &mut Option<Unacknowledged<T>>,
    ) -> Result<T, SessionError>
    where
        F: Fn(&ProgressionEngine<'_>, &LevelData) -> Result<Transition<T>, SessionError>,
    {
        let current = self.load(account_id).await?;
        if let Some(prior) = unacked.take()
            && prior.state == current
        {
            debug!(%account_id, "round_trip: unacknowledged write had landed");
            self.events.emit_all(prior.events);
            return Ok(prior.value);
        }

        let Transition { state, events, value } = op(&self.engine(), &current)?;

        if let Some(mut next) = state {
            next.touch();
            if let Err(e) = self.bounded(self.store.put(account_id, &next)).await {
                *unacked = Some(Unacknowledged {
                    state: next,
                    events,
                    value,
                });
                return Err(e.into());
            }
            self.events.emit_all(events);
        }
        Ok(value)
    }

    async fn load(&self, account_id: &str) -> Result<LevelData, SessionError> {
        let stored = self.bounded(self.store.get(account_id)).await?;
        Ok(stored.unwrap_or_else(|| self.engine().initial_state(account_id)))
    }

    /// Bound a store call by the configured timeout
    async fn bounded<T>(&self, call: impl Future<Output = Result<T, StoreError>>) -> Result<T, StoreError> {
        let ms = self.config.store_timeout_ms;
        tokio::time::timeout(Duration::from_millis(ms), call)
            .await
            .map_err(|_| StoreError::Timeout(ms))?
    }
}
