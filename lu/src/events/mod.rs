//! Outbound progression notifications
//!
//! Engine operations describe their effects as [`ProgressEvent`] values. The
//! session publishes them on the [`EventBus`] after the state write succeeds;
//! UI and analytics consumers subscribe. Delivery is fire-and-forget and is
//! not part of progression correctness.
//!
//! ```text
//!  SessionController ──emit──▶ EventBus (broadcast) ──▶ EventLogger (.jsonl)
//!                                                   └──▶ UI / analytics
//! ```

mod bus;
mod logger;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, create_event_bus};
pub use logger::{EventLogger, read_account_events, spawn_event_logger};
pub use types::{EventLogEntry, ProgressEvent};
