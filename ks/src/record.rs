//! The Record trait implemented by every persisted type

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A type that can be persisted in a [`Store`](crate::Store)
///
/// Records are keyed by `id()` within their collection. The collection name
/// doubles as the JSONL file stem, so it must be a plain identifier.
pub trait Record: Serialize + DeserializeOwned {
    /// Unique key within the collection
    fn id(&self) -> &str;

    /// Last modification time (unix ms)
    fn updated_at(&self) -> i64;

    /// Collection this record type lives in
    fn collection_name() -> &'static str;
}
