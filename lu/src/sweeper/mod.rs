//! MetaSweeper - periodic meta-achievement evaluation
//!
//! Walks every stored account on an interval and runs
//! `SessionController::evaluate_meta`, so it takes the same per-account lock
//! as foreground operations.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::session::{SessionController, SessionError};

/// Default seconds between sweeps
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3_600;

/// Accounts evaluated at once during a sweep
const SWEEP_CONCURRENCY: usize = 8;

/// Outcome of one pass over the accounts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    pub accounts: usize,
    /// Meta-achievements granted across all accounts
    pub granted: usize,
    pub failed: usize,
}

pub struct MetaSweeper {
    session: Arc<SessionController>,
    interval: Duration,
}

impl MetaSweeper {
    pub fn new(session: Arc<SessionController>, interval: Duration) -> Self {
        debug!(interval_secs = interval.as_secs(), "MetaSweeper::new: called");
        Self { session, interval }
    }

    /// Evaluate every account once, a few accounts at a time
    ///
    /// A failing account is logged and counted; the sweep moves on.
    pub async fn sweep_once(&self) -> Result<SweepStats, SessionError> {
        debug!("sweep_once: called");
        let accounts = self.session.list_accounts().await?;
        let mut stats = SweepStats {
            accounts: accounts.len(),
            ..Default::default()
        };

        let mut results = stream::iter(accounts)
            .map(|account_id| async move {
                let result = self.session.evaluate_meta(&account_id).await;
                (account_id, result)
            })
            .buffer_unordered(SWEEP_CONCURRENCY);

        while let Some((account_id, result)) = results.next().await {
            match result {
                Ok(granted) => stats.granted += granted.len(),
                Err(e) => {
                    warn!(%account_id, error = %e, "Meta evaluation failed");
                    stats.failed += 1;
                }
            }
        }

        info!(
            accounts = stats.accounts,
            granted = stats.granted,
            failed = stats.failed,
            "Meta sweep complete"
        );
        Ok(stats)
    }

    /// Sweep on every tick until a shutdown signal arrives
    ///
    /// The first tick fires immediately.
    pub async fn run(&self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(interval_secs = self.interval.as_secs(), "MetaSweeper starting");
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        warn!(error = %e, "Meta sweep failed");
                    }
                }

                _ = shutdown_rx.recv() => {
                    debug!("run: shutdown signal received");
                    break;
                }
            }
        }

        info!("MetaSweeper stopped");
    }
}
