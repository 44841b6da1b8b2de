//! Cache Module
//!
//! Fixed-slot object cache with per-slot reader/writer locking and
//! insert-driven priority aging.

mod entry;
mod slot_lock;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, SlotSnapshot};
pub use slot_lock::{SlotLock, SlotReadGuard, SlotWriteGuard};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{CacheStore, InsertOutcome};

// == Public Constants ==
/// Number of slots in the default store
pub const DEFAULT_SLOT_COUNT: usize = 10;

/// Largest object that will be cached, in bytes
pub const MAX_OBJECT_SIZE: usize = 100 * 1024;

/// Priority assigned to a freshly inserted entry
pub const MAX_PRIORITY: i64 = 9999;
