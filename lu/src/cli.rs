//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

/// LevelUp - progression engine for career platform accounts
#[derive(Parser)]
#[command(
    name = "lu",
    about = "XP, levels, achievements, streaks and feature unlocks",
    version,
    after_help = after_help()
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Keep state in memory only (nothing is persisted)
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Grant XP to an account
    Xp {
        account: String,

        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },

    /// Grant or spend Career Coins
    Coins {
        #[command(subcommand)]
        command: CoinsCommand,
    },

    /// Unlock an achievement for an account
    Achieve {
        account: String,

        /// Achievement id (see `lu catalog --achievements`)
        achievement: String,
    },

    /// Record a day of activity (or inactivity) for an account
    Activity {
        account: String,

        /// Record an inactive day (resets the streak)
        #[arg(long)]
        inactive: bool,
    },

    /// Prestige an account (clears achievements, keeps progress)
    Prestige { account: String },

    /// Show an account's progression
    Status {
        account: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show which features an account can use
    Features { account: String },

    /// Show the level catalog
    Catalog {
        /// List achievements and meta rules instead of levels
        #[arg(long)]
        achievements: bool,
    },

    /// List accounts with stored progression
    Accounts,

    /// Evaluate meta-achievements for every account
    Sweep {
        /// Keep sweeping on the configured interval until Ctrl-C
        #[arg(long)]
        watch: bool,
    },

    /// Show an account's event history
    Events {
        account: String,

        /// Number of most recent events to show
        #[arg(short = 'n', long, default_value = "20")]
        lines: usize,
    },
}

/// Currency subcommands
#[derive(Debug, Subcommand)]
pub enum CoinsCommand {
    /// Credit coins
    Grant {
        account: String,

        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },

    /// Debit coins (fails if the balance is short)
    Spend {
        account: String,

        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },
}

/// Output format for status
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

/// Get the path to the log file
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("levelup")
        .join("logs")
        .join("levelup.log")
}

fn after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}
