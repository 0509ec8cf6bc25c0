//! Event Logger - persists progression events to JSONL files
//!
//! The EventLogger subscribes to the EventBus and appends every event to a
//! per-account `events.jsonl` file for history and auditing.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use super::bus::EventBus;
use super::types::{EventLogEntry, ProgressEvent};

/// Writers beyond this count are flushed and dropped
const MAX_OPEN_WRITERS: usize = 256;

/// Event logger that writes events to `{log_dir}/{account}/events.jsonl`
pub struct EventLogger {
    log_dir: PathBuf,
    writers: HashMap<String, BufWriter<File>>,
}

impl EventLogger {
    pub fn new(log_dir: impl AsRef<Path>) -> Self {
        let log_dir = log_dir.as_ref().to_path_buf();
        debug!(?log_dir, "EventLogger::new: creating logger");
        Self {
            log_dir,
            writers: HashMap::new(),
        }
    }

    /// Append an event to its account's log file
    pub fn write_event(&mut self, event: &ProgressEvent) -> eyre::Result<()> {
        let account_dir = account_dir_name(event.account_id());
        debug!(%account_dir, event_type = event.event_type(), "EventLogger::write_event");

        if !self.writers.contains_key(&account_dir) {
            if self.writers.len() >= MAX_OPEN_WRITERS {
                self.flush_all();
            }
            let dir = self.log_dir.join(&account_dir);
            fs::create_dir_all(&dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("events.jsonl"))?;
            self.writers.insert(account_dir.clone(), BufWriter::new(file));
        }

        let Some(writer) = self.writers.get_mut(&account_dir) else {
            return Ok(());
        };
        let entry = EventLogEntry::new(event.clone());
        writeln!(writer, "{}", serde_json::to_string(&entry)?)?;
        writer.flush()?;

        Ok(())
    }

    fn flush_all(&mut self) {
        for (account, mut writer) in self.writers.drain() {
            debug!(%account, "EventLogger: flushing writer");
            let _ = writer.flush();
        }
    }

    /// Consume events from the bus until it closes
    pub async fn run(self, event_bus: Arc<EventBus>) {
        debug!("EventLogger::run: starting event logger");
        let rx = event_bus.subscribe();
        // the bus must not be kept alive by its own logger
        drop(event_bus);
        self.consume(rx).await;
    }

    /// Write events from an existing subscription until the bus closes
    pub async fn consume(mut self, mut rx: broadcast::Receiver<ProgressEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = self.write_event(&event) {
                        error!(account_id = event.account_id(), error = %e, "EventLogger: failed to write event");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "EventLogger: lagged behind, missed events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("EventLogger: channel closed, shutting down");
                    break;
                }
            }
        }

        self.flush_all();
    }
}

/// Account ids are opaque; keep only path-safe characters for directory names
///
/// Distinct ids can share a directory (`a.b` and `a_b`), so readers filter
/// entries by account id.
fn account_dir_name(account_id: &str) -> String {
    let name: String = account_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() { "_".to_string() } else { name }
}

/// Read every logged event for an account
pub fn read_account_events(log_dir: impl AsRef<Path>, account_id: &str) -> eyre::Result<Vec<EventLogEntry>> {
    let log_path = log_dir.as_ref().join(account_dir_name(account_id)).join("events.jsonl");
    debug!(?log_path, "read_account_events: reading log file");

    if !log_path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&log_path)?;
    let mut entries = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<EventLogEntry>(line) {
            Ok(entry) if entry.event.account_id() == account_id => entries.push(entry),
            Ok(_) => {}
            Err(e) => {
                warn!(line, error = %e, "read_account_events: failed to parse line");
            }
        }
    }

    Ok(entries)
}

/// Spawn the event logger as a background task
pub fn spawn_event_logger(event_bus: Arc<EventBus>, log_dir: impl AsRef<Path>) -> eyre::Result<tokio::task::JoinHandle<()>> {
    fs::create_dir_all(log_dir.as_ref())?;
    let logger = EventLogger::new(log_dir);
    // subscribe before returning so no event emitted after this call is missed
    let rx = event_bus.subscribe();
    drop(event_bus);
    Ok(tokio::spawn(logger.consume(rx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn bonus(account: &str, amount: u64) -> ProgressEvent {
        ProgressEvent::StreakBonus {
            account_id: account.to_string(),
            amount,
            streak_days: 1,
        }
    }

    #[test]
    fn test_write_and_read_events() {
        let temp = tempdir().unwrap();
        let mut logger = EventLogger::new(temp.path());

        logger.write_event(&bonus("acct-1", 10)).unwrap();
        logger
            .write_event(&ProgressEvent::Prestige {
                account_id: "acct-1".to_string(),
                prestige_level: 1,
            })
            .unwrap();

        let entries = read_account_events(temp.path(), "acct-1").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event.event_type(), "StreakBonus");
        assert_eq!(entries[1].event.event_type(), "Prestige");
    }

    #[test]
    fn test_accounts_get_separate_files() {
        let temp = tempdir().unwrap();
        let mut logger = EventLogger::new(temp.path());

        logger.write_event(&bonus("acct-1", 10)).unwrap();
        logger.write_event(&bonus("acct-2", 20)).unwrap();

        assert!(temp.path().join("acct-1").join("events.jsonl").exists());
        assert!(temp.path().join("acct-2").join("events.jsonl").exists());
    }

    #[test]
    fn test_account_id_cannot_escape_log_dir() {
        let temp = tempdir().unwrap();
        let mut logger = EventLogger::new(temp.path());

        logger.write_event(&bonus("../escape", 10)).unwrap();

        assert!(temp.path().join("___escape").join("events.jsonl").exists());
        assert_eq!(read_account_events(temp.path(), "../escape").unwrap().len(), 1);
    }

    #[test]
    fn test_colliding_directory_names_stay_separate() {
        let temp = tempdir().unwrap();
        let mut logger = EventLogger::new(temp.path());

        logger.write_event(&bonus("a.b", 10)).unwrap();
        logger.write_event(&bonus("a_b", 20)).unwrap();
        logger.write_event(&bonus("a.b", 30)).unwrap();

        let dotted = read_account_events(temp.path(), "a.b").unwrap();
        assert_eq!(dotted.len(), 2);
        assert!(dotted.iter().all(|e| e.event.account_id() == "a.b"));

        let underscored = read_account_events(temp.path(), "a_b").unwrap();
        assert_eq!(underscored.len(), 1);
        assert!(matches!(underscored[0].event, ProgressEvent::StreakBonus { amount: 20, .. }));
    }

    #[test]
    fn test_read_unknown_account() {
        let temp = tempdir().unwrap();
        assert!(read_account_events(temp.path(), "nobody").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logger_drains_bus_until_closed() {
        let temp = tempdir().unwrap();
        let bus = Arc::new(EventBus::new(16));
        let handle = spawn_event_logger(bus.clone(), temp.path()).unwrap();

        assert_eq!(bus.subscriber_count(), 1);
        bus.emit(bonus("acct-1", 10));
        drop(bus);

        handle.await.unwrap();
        assert_eq!(read_account_events(temp.path(), "acct-1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_subscribes_itself() {
        let temp = tempdir().unwrap();
        let bus = Arc::new(EventBus::new(16));
        let handle = tokio::spawn(EventLogger::new(temp.path()).run(bus.clone()));

        while bus.subscriber_count() == 0 {
            tokio::task::yield_now().await;
        }
        bus.emit(bonus("acct-2", 30));
        drop(bus);

        handle.await.unwrap();
        let entries = read_account_events(temp.path(), "acct-2").unwrap();
        assert_eq!(entries.len(), 1);
    }
}
