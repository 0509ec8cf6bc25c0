//! LevelUp CLI
//!
//! Applies progression operations to stored accounts and reports on them.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use levelup::cli::{Cli, CoinsCommand, Command, OutputFormat, get_log_path};
use levelup::config::Config;
use levelup::events::{EventBus, read_account_events, spawn_event_logger};
use levelup::gate::FeatureRegistry;
use levelup::session::SessionController;
use levelup::state::StateManager;
use levelup::store::{MemoryStore, ProgressionStore};
use levelup::sweeper::MetaSweeper;
use levelup::{AchievementRegistry, LevelCatalog};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Store, session and event logger for one CLI invocation
struct Runtime {
    session: Arc<SessionController>,
    state: Option<StateManager>,
    logger: JoinHandle<()>,
}

impl Runtime {
    async fn open(config: &Config, ephemeral: bool) -> Result<Self> {
        debug!(ephemeral, "Runtime::open: called");
        let bus = Arc::new(EventBus::new(config.events.capacity));
        let logger = spawn_event_logger(bus.clone(), &config.events.log_dir).context("Failed to start event logger")?;

        let state = if ephemeral {
            None
        } else {
            let state = StateManager::spawn(&config.storage.path)
                .context(format!("Failed to open store at {}", config.storage.path))?;
            Some(state)
        };
        let store: Arc<dyn ProgressionStore> = match &state {
            Some(state) => Arc::new(state.clone()),
            None => Arc::new(MemoryStore::new()),
        };

        let session = SessionController::from_config(config, store, bus)?;
        Ok(Self {
            session: Arc::new(session),
            state,
            logger,
        })
    }

    /// Stop the store actor and wait for the event log to flush
    async fn close(self) -> Result<()> {
        debug!("Runtime::close: called");
        if let Some(state) = &self.state {
            state.shutdown().await?;
        }
        // dropping the last session handle closes the bus, which ends the logger
        drop(self.session);
        self.logger.await.context("Event logger task failed")?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Catalog { achievements } => cmd_catalog(&config, achievements),
        Command::Events { account, lines } => cmd_events(&config, &account, lines),
        command => {
            let runtime = Runtime::open(&config, cli.ephemeral).await?;
            let result = dispatch(&runtime.session, &config, command).await;
            runtime.close().await?;
            result
        }
    }
}

async fn dispatch(session: &Arc<SessionController>, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Xp { account, amount } => cmd_xp(session, &account, amount).await,
        Command::Coins { command } => cmd_coins(session, command).await,
        Command::Achieve { account, achievement } => cmd_achieve(session, &account, &achievement).await,
        Command::Activity { account, inactive } => cmd_activity(session, &account, !inactive).await,
        Command::Prestige { account } => cmd_prestige(session, &account).await,
        Command::Status { account, format } => cmd_status(session, &account, format).await,
        Command::Features { account } => cmd_features(session, &account).await,
        Command::Accounts => cmd_accounts(session).await,
        Command::Sweep { watch } => cmd_sweep(session, config, watch).await,
        Command::Catalog { .. } | Command::Events { .. } => Ok(()),
    }
}

async fn cmd_xp(session: &SessionController, account: &str, amount: i64) -> Result<()> {
    debug!(%account, amount, "cmd_xp: called");
    let before = session.level_data(account).await?.level;
    let leveled_up = session.grant_xp(account, amount).await?;
    let state = session.level_data(account).await?;

    println!("+{} XP for {}", amount, account);
    if leveled_up {
        println!(
            "{}",
            format!("Level up! {} -> {}", before, state.level).bright_green().bold()
        );
    }
    println!("Level {} ({}/{} XP)", state.level, state.xp, state.xp_to_next);
    Ok(())
}

async fn cmd_coins(session: &SessionController, command: CoinsCommand) -> Result<()> {
    match command {
        CoinsCommand::Grant { account, amount } => {
            debug!(%account, amount, "cmd_coins: grant");
            let balance = session.grant_currency(&account, amount).await?;
            println!("+{} coins for {} (balance {})", amount, account, balance);
        }
        CoinsCommand::Spend { account, amount } => {
            debug!(%account, amount, "cmd_coins: spend");
            if session.spend_currency(&account, amount).await? {
                let balance = session.level_data(&account).await?.currency;
                println!("-{} coins for {} (balance {})", amount, account, balance);
            } else {
                let balance = session.level_data(&account).await?.currency;
                println!("{}", format!("Insufficient coins: balance is {}", balance).yellow());
            }
        }
    }
    Ok(())
}

async fn cmd_achieve(session: &SessionController, account: &str, achievement_id: &str) -> Result<()> {
    debug!(%account, %achievement_id, "cmd_achieve: called");
    if session.unlock_achievement(account, achievement_id).await? {
        let title = session
            .achievements()
            .get(achievement_id)
            .map(|a| a.title.clone())
            .unwrap_or_else(|| achievement_id.to_string());
        println!("{}", format!("Achievement unlocked: {}", title).bright_cyan().bold());
    } else {
        println!("{} already has {}", account, achievement_id);
    }
    Ok(())
}

async fn cmd_activity(session: &SessionController, account: &str, active: bool) -> Result<()> {
    debug!(%account, active, "cmd_activity: called");
    let bonus = session.record_daily_activity(account, active).await?;
    let state = session.level_data(account).await?;
    if active {
        println!("Streak: {} days (+{} XP bonus)", state.streak_days, bonus);
    } else {
        println!("Streak reset (best: {} days)", state.total_streak_days);
    }
    Ok(())
}

async fn cmd_prestige(session: &SessionController, account: &str) -> Result<()> {
    debug!(%account, "cmd_prestige: called");
    if session.request_prestige(account).await? {
        let state = session.level_data(account).await?;
        println!(
            "{}",
            format!("Prestige {} reached", state.prestige_level).bright_magenta().bold()
        );
    } else {
        let level = session.level_data(account).await?.level;
        println!(
            "{}",
            format!(
                "Prestige requires level {} (currently {})",
                session.rules().prestige_min_level,
                level
            )
            .yellow()
        );
    }
    Ok(())
}

async fn cmd_status(session: &SessionController, account: &str, format: OutputFormat) -> Result<()> {
    debug!(%account, ?format, "cmd_status: called");
    let snapshot = session.snapshot(account).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        OutputFormat::Text => {
            println!("{}", snapshot.account_id.bold());
            println!(
                "  Level {} {}",
                snapshot.level,
                snapshot.title.as_deref().unwrap_or_default().bright_cyan()
            );
            println!(
                "  XP:        {}/{} ({:.1}%)",
                snapshot.xp, snapshot.xp_to_next, snapshot.progress_percentage
            );
            println!("  Total XP:  {}", snapshot.total_xp);
            println!("  Coins:     {}", snapshot.currency);
            println!(
                "  Streak:    {} days (best {})",
                snapshot.streak_days, snapshot.total_streak_days
            );
            if snapshot.prestige_level > 0 {
                println!("  Prestige:  {}", snapshot.prestige_level);
            }
            println!("  Achievements: {}", snapshot.achievements.len());
            for id in &snapshot.meta_achievements {
                println!("    * {}", id.bright_yellow());
            }
            if let Some(next) = &snapshot.next_level {
                println!(
                    "  Next: level {} {} (+{} coins{})",
                    next.level,
                    next.title,
                    next.currency_reward,
                    if next.unlocks.is_empty() {
                        String::new()
                    } else {
                        format!(", unlocks {}", next.unlocks.join(", "))
                    }
                );
            }
        }
    }
    Ok(())
}

async fn cmd_features(session: &SessionController, account: &str) -> Result<()> {
    debug!(%account, "cmd_features: called");
    let state = session.level_data(account).await?;
    let gate = session.feature_gate();

    for feature in gate.accessible_features(&state) {
        println!("  {} {} ({})", "✓".green(), feature.name, feature.category);
    }
    for feature in gate.locked_features(&state) {
        println!(
            "  {} {} ({}, level {})",
            "✗".red(),
            feature.name.dimmed(),
            feature.category,
            feature.level_required
        );
    }
    Ok(())
}

async fn cmd_accounts(session: &SessionController) -> Result<()> {
    debug!("cmd_accounts: called");
    let accounts = session.list_accounts().await?;
    if accounts.is_empty() {
        println!("No accounts found");
    }
    for account in accounts {
        let state = session.level_data(&account).await?;
        println!("{:<24} level {:>3}  {:>8} XP", account, state.level, state.total_xp);
    }
    Ok(())
}

async fn cmd_sweep(session: &Arc<SessionController>, config: &Config, watch: bool) -> Result<()> {
    debug!(watch, "cmd_sweep: called");
    let sweeper = MetaSweeper::new(session.clone(), Duration::from_secs(config.sweeper.interval_secs));

    if !watch {
        let stats = sweeper.sweep_once().await?;
        println!(
            "Swept {} accounts: {} meta-achievements granted, {} failed",
            stats.accounts, stats.granted, stats.failed
        );
        return Ok(());
    }

    if !config.sweeper.enabled {
        println!("Sweeper is disabled in config (sweeper.enabled: false)");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(()).await;
        }
    });

    println!(
        "Sweeping every {}s, Ctrl-C to stop",
        config.sweeper.interval_secs
    );
    sweeper.run(shutdown_rx).await;
    Ok(())
}

fn cmd_catalog(config: &Config, achievements: bool) -> Result<()> {
    debug!(achievements, "cmd_catalog: called");
    if achievements {
        let registry = AchievementRegistry::builtin();
        println!("{}", "Achievements".bold());
        for a in registry.all() {
            println!("  {:<20} {:<20} {:>5} XP  {}", a.id, a.title, a.xp_reward, a.category);
        }
        println!("{}", "Streak milestones".bold());
        for m in registry.milestones() {
            println!("  {:>4} days  {}", m.days, m.achievement_id);
        }
        println!("{}", "Meta-achievements".bold());
        for rule in registry.meta_rules() {
            println!("  {:<20} {:?} >= {}", rule.id, rule.metric, rule.threshold);
        }
        return Ok(());
    }

    let catalog = match &config.catalog.path {
        Some(path) => LevelCatalog::load(path)?,
        None => LevelCatalog::builtin(),
    };
    if let Err(e) = FeatureRegistry::builtin().validate_catalog(&catalog) {
        println!("{}", format!("Warning: {}", e).yellow());
    }

    for entry in catalog.entries() {
        println!(
            "  {:>3}  {:<20} {:>7} XP  {:>5} coins  {}",
            entry.level,
            entry.title,
            entry.total_xp_needed,
            entry.currency_reward,
            entry.unlocks.join(", ")
        );
    }
    println!(
        "  Past level {}: {} XP per level",
        catalog.max_level(),
        config.progression.overflow_xp_per_level
    );
    Ok(())
}

fn cmd_events(config: &Config, account: &str, lines: usize) -> Result<()> {
    debug!(%account, lines, "cmd_events: called");
    let entries = read_account_events(PathBuf::from(&config.events.log_dir), account)?;
    if entries.is_empty() {
        println!("No events for {}", account);
        return Ok(());
    }

    let skip = entries.len().saturating_sub(lines);
    for entry in entries.into_iter().skip(skip) {
        println!(
            "{}  {:<24} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.event.event_type(),
            serde_json::to_string(&entry.event)?
        );
    }
    Ok(())
}
