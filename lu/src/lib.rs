//! LevelUp - progression engine for a career platform
//!
//! Tracks experience points, levels, achievements, daily streaks, Career
//! Coins, feature unlocks and prestige for student and employer accounts.
//!
//! # Core Concepts
//!
//! - **Pure Engine**: every rule is a function from state to new state plus events
//! - **One Writer Per Account**: the session serializes read-modify-write per account
//! - **Events After Commit**: notifications are published only once the write lands
//! - **Progress Never Stalls**: past the catalog, levels cost a flat increment
//!
//! # Modules
//!
//! - [`catalog`] - Validated level table
//! - [`achievements`] - Achievement registry, streak milestones, meta rules
//! - [`engine`] - Pure progression transitions
//! - [`gate`] - Feature access checks
//! - [`store`] - Persistence contract and in-memory store
//! - [`state`] - Actor over the durable keystore
//! - [`session`] - Serialized transactions over the store
//! - [`sweeper`] - Background meta-achievement evaluation
//! - [`events`] - Outbound notifications and event log
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod achievements;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod events;
pub mod gate;
pub mod session;
pub mod state;
pub mod store;
pub mod sweeper;

// Re-export commonly used types
pub use achievements::{AchievementRegistry, MetaMetric, MetaRule, RegistryError, StreakMilestone};
pub use catalog::{CatalogError, LevelCatalog, LevelCatalogEntry};
pub use config::Config;
pub use domain::{AccountId, Achievement, AchievementCategory, FeatureCategory, FeatureDefinition, LevelData};
pub use engine::{EngineError, EngineRules, ProgressionEngine, StreakRules, checked_amount};
pub use gate::{FeatureGate, FeatureRegistry, GateError};
pub use session::{ProgressSnapshot, SessionConfig, SessionController, SessionError};
pub use state::StateManager;
pub use store::{MemoryStore, ProgressionStore, StoreError};
pub use sweeper::{MetaSweeper, SweepStats};

// Events module re-exports
pub use events::{
    EventBus, EventLogEntry, EventLogger, ProgressEvent, create_event_bus, read_account_events, spawn_event_logger,
};
