//! LevelUp configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::EngineRules;
use crate::events::DEFAULT_CHANNEL_CAPACITY;
use crate::session::{
    DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_STORE_TIMEOUT_MS, SessionConfig,
};
use crate::sweeper::DEFAULT_SWEEP_INTERVAL_SECS;

const LOCAL_CONFIG: &str = ".levelup.yml";

/// Main LevelUp configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Storage and store round-trip policy
    pub storage: StorageConfig,

    /// Progression rules
    pub progression: EngineRules,

    /// Level catalog source
    pub catalog: CatalogConfig,

    /// Event bus and event log
    pub events: EventsConfig,

    /// Background meta-achievement sweeps
    pub sweeper: SweeperConfig,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.storage.store_timeout_ms == 0 {
            return Err(eyre::eyre!("storage.store-timeout-ms must be greater than 0"));
        }
        if self.storage.lock_timeout_ms == 0 {
            return Err(eyre::eyre!("storage.lock-timeout-ms must be greater than 0"));
        }
        if self.progression.overflow_xp_per_level == 0 {
            return Err(eyre::eyre!("progression.overflow-xp-per-level must be greater than 0"));
        }
        if self.progression.prestige_min_level == 0 {
            return Err(eyre::eyre!("progression.prestige-min-level must be greater than 0"));
        }
        if self.sweeper.enabled && self.sweeper.interval_secs == 0 {
            return Err(eyre::eyre!("sweeper.interval-secs must be greater than 0"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is set up
    ///
    /// Never fails: an unreadable or invalid file yields None.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        #[derive(Deserialize)]
        struct LogLevelOnly {
            #[serde(rename = "log-level")]
            log_level: Option<String>,
        }

        let read = |path: &Path| -> Option<String> {
            let content = fs::read_to_string(path).ok()?;
            serde_yaml::from_str::<LogLevelOnly>(&content).ok()?.log_level
        };

        match config_path {
            Some(path) => read(path),
            None => Self::candidates()
                .into_iter()
                .find(|p| p.exists())
                .and_then(|p| read(&p)),
        }
    }

    /// Project-local config, then the user config
    fn candidates() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG)];
        // ~/.config/levelup/levelup.yml
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("levelup").join("levelup.yml"));
        }
        candidates
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the level store
    pub path: String,

    /// Bound on each store call in milliseconds
    #[serde(rename = "store-timeout-ms")]
    pub store_timeout_ms: u64,

    /// Bound on waiting for an account's lock in milliseconds
    #[serde(rename = "lock-timeout-ms")]
    pub lock_timeout_ms: u64,

    /// Retries of a failed round-trip (retryable errors only)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Linear backoff step between retries in milliseconds
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/levelup on Linux)
        let path = dirs::data_dir()
            .map(|d| d.join("levelup"))
            .unwrap_or_else(|| PathBuf::from(".levelup"))
            .to_string_lossy()
            .into_owned();

        Self {
            path,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl StorageConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            store_timeout_ms: self.store_timeout_ms,
            lock_timeout_ms: self.lock_timeout_ms,
            max_retries: self.max_retries,
            retry_backoff_ms: self.retry_backoff_ms,
        }
    }
}

/// Level catalog source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// YAML catalog file; the bundled catalog is used when unset
    pub path: Option<PathBuf>,
}

/// Event bus and event log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Directory for per-account event logs
    #[serde(rename = "log-dir")]
    pub log_dir: String,

    /// Broadcast channel capacity
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        let log_dir = dirs::data_dir()
            .map(|d| d.join("levelup").join("events"))
            .unwrap_or_else(|| PathBuf::from(".levelup/events"))
            .to_string_lossy()
            .into_owned();

        Self {
            log_dir,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Background sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweeperConfig {
    pub enabled: bool,

    #[serde(rename = "interval-secs")]
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}
