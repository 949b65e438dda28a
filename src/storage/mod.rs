//! Key-value persistence for validated scores.
//!
//! Score payloads live under a reserved key prefix. [`GuardedStore`] sits
//! in front of any [`KeyValueStore`] and re-validates every write to that
//! prefix before it reaches the backend.

mod guarded;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use guarded::GuardedStore;
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use crate::RadarResult;

/// String key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> RadarResult<Option<String>>;

    /// Inserts or replaces `key`.
    fn set(&mut self, key: &str, value: &str) -> RadarResult<()>;

    /// Removes `key`. Returns whether it existed.
    fn remove(&mut self, key: &str) -> RadarResult<bool>;

    /// All keys starting with `prefix`, sorted.
    fn keys(&self, prefix: &str) -> RadarResult<Vec<String>>;
}
