//! Level catalog - the static table of level thresholds and rewards
//!
//! Validated once when constructed; immutable afterwards.

mod builtin;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use eyre::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// One row of the level table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCatalogEntry {
    pub level: u32,

    /// Cumulative XP required to reach this level
    #[serde(rename = "totalXPNeeded")]
    pub total_xp_needed: u64,

    /// XP required to go from the previous level to this one
    pub xp_for_this_level: u64,

    pub title: String,

    #[serde(default)]
    pub currency_reward: u64,

    /// Feature ids unlocked on reaching this level
    #[serde(default)]
    pub unlocks: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub special_rewards: Vec<String>,
}

/// Errors found while validating a catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Catalog has no levels")]
    Empty,

    #[error("Catalog must start at level 1, found {0}")]
    FirstLevelNotOne(u32),

    #[error("Level 1 must need 0 XP, found {0}")]
    FirstThresholdNotZero(u64),

    #[error("Level {level} does not follow level {previous}")]
    LevelsNotConsecutive { previous: u32, level: u32 },

    #[error("Level {level} totalXPNeeded does not increase")]
    ThresholdsNotIncreasing { level: u32 },

    #[error("Level {level} xpForThisLevel is {found}, expected {expected}")]
    DeltaMismatch { level: u32, expected: u64, found: u64 },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    levels: Vec<LevelCatalogEntry>,
}

/// Validated, immutable level table
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    entries: Vec<LevelCatalogEntry>,
}

impl LevelCatalog {
    /// Validate and build a catalog
    pub fn new(entries: Vec<LevelCatalogEntry>) -> Result<Self, CatalogError> {
        debug!(count = entries.len(), "LevelCatalog::new: called");
        let first = entries.first().ok_or(CatalogError::Empty)?;
        if first.level != 1 {
            return Err(CatalogError::FirstLevelNotOne(first.level));
        }
        if first.total_xp_needed != 0 {
            return Err(CatalogError::FirstThresholdNotZero(first.total_xp_needed));
        }

        for pair in entries.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            // every level up to max_level needs its own row
            if prev.level.checked_add(1) != Some(cur.level) {
                return Err(CatalogError::LevelsNotConsecutive {
                    previous: prev.level,
                    level: cur.level,
                });
            }
            if cur.total_xp_needed <= prev.total_xp_needed {
                return Err(CatalogError::ThresholdsNotIncreasing { level: cur.level });
            }
            let expected = cur.total_xp_needed - prev.total_xp_needed;
            if cur.xp_for_this_level != expected {
                return Err(CatalogError::DeltaMismatch {
                    level: cur.level,
                    expected,
                    found: cur.xp_for_this_level,
                });
            }
        }

        Ok(Self { entries })
    }

    /// The bundled career catalog (levels 1-25)
    pub fn builtin() -> Self {
        Self {
            entries: builtin::entries(),
        }
    }

    /// Load a catalog from a YAML file with a top-level `levels:` list
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context(format!("Failed to read catalog {}", path.display()))?;
        let file: CatalogFile = serde_yaml::from_str(&content).context("Failed to parse catalog")?;
        let catalog = Self::new(file.levels).context(format!("Invalid catalog {}", path.display()))?;
        info!(path = %path.display(), max_level = catalog.max_level(), "Loaded level catalog");
        Ok(catalog)
    }

    /// Entry for exactly this level
    pub fn lookup(&self, level: u32) -> Option<&LevelCatalogEntry> {
        self.entries
            .binary_search_by_key(&level, |e| e.level)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// First entry above this level
    pub fn next(&self, level: u32) -> Option<&LevelCatalogEntry> {
        let idx = self.entries.partition_point(|e| e.level <= level);
        self.entries.get(idx)
    }

    pub fn first(&self) -> &LevelCatalogEntry {
        // non-empty by construction
        &self.entries[0]
    }

    pub fn max_level(&self) -> u32 {
        self.entries.last().map(|e| e.level).unwrap_or(1)
    }

    pub fn entries(&self) -> &[LevelCatalogEntry] {
        &self.entries
    }

    /// XP needed to leave `level`, or `fallback` when level + 1 is not in the table
    pub fn xp_to_next(&self, level: u32, fallback: u64) -> u64 {
        level
            .checked_add(1)
            .and_then(|l| self.lookup(l))
            .map(|e| e.xp_for_this_level)
            .unwrap_or(fallback)
    }

    /// Union of catalog unlocks for every level up to and including `level`
    pub fn unlocks_through(&self, level: u32) -> BTreeSet<String> {
        self.entries
            .iter()
            .take_while(|e| e.level <= level)
            .flat_map(|e| e.unlocks.iter().cloned())
            .collect()
    }

    /// Every feature id referenced by any level
    pub fn all_unlocks(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .flat_map(|e| e.unlocks.iter().map(String::as_str))
            .collect()
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
