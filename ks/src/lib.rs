//! KeyStore - durable per-key record storage
//!
//! Records are appended to per-collection JSONL logs (the source of truth) and
//! mirrored into a SQLite index holding only the latest version of each record.
//! The index can always be rebuilt from the logs.
//!
//! # Layout
//!
//! ```text
//! {store}/
//! ├── .lock               # exclusive writer lock (one process at a time)
//! ├── index.db            # SQLite: latest record per (collection, id)
//! └── {collection}.jsonl  # append-only log of every write
//! ```
//!
//! # Example
//!
//! ```ignore
//! use keystore::{Record, Store};
//!
//! let mut store = Store::open(".levelup/store")?;
//! store.upsert(&record)?;
//! let loaded: Option<MyRecord> = store.get("account-1")?;
//! ```

mod error;
mod record;
mod store;

pub use error::{Result, StoreError};
pub use record::Record;
pub use store::{LogLine, Store};
