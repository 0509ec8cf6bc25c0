//! Session layer - serialized read-modify-write over the store
//!
//! Every inbound operation is one transaction: lock the account, load its
//! record (or start a fresh one), run the pure engine, persist, then publish
//! the resulting events.

mod controller;
mod error;
mod locks;

pub use controller::{
    DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_STORE_TIMEOUT_MS,
    ProgressSnapshot, SessionConfig, SessionController,
};
pub use error::SessionError;
pub use locks::AccountLocks;
