//! Cache Entry Module
//!
//! Defines the contents of one cache slot.

use serde::Serialize;

use crate::cache::MAX_PRIORITY;

// == Cache Entry ==
/// Contents of a single cache slot.
///
/// When `occupied` is false the other fields carry no meaning.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    /// Request URI the payload was fetched for
    pub key: String,
    /// Raw bytes relayed to the client for `key`
    pub payload: Vec<u8>,
    /// Recency score, higher means inserted more recently
    pub priority: i64,
    /// Whether the slot holds an entry
    pub occupied: bool,
}

impl CacheEntry {
    // == Fill ==
    /// Overwrites the slot with a fresh entry at maximum priority.
    pub fn fill(&mut self, key: String, payload: Vec<u8>) {
        self.key = key;
        self.payload = payload;
        self.priority = MAX_PRIORITY;
        self.occupied = true;
    }

    // == Matches ==
    /// Returns true if the slot is occupied by `key`.
    pub fn matches(&self, key: &str) -> bool {
        self.occupied && self.key == key
    }

    // == Age ==
    /// Lowers the priority of an occupied slot by one.
    pub fn age(&mut self) {
        if self.occupied {
            self.priority = self.priority.saturating_sub(1);
        }
    }
}

// == Slot Snapshot ==
/// Point-in-time view of one slot, without the payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSnapshot {
    pub index: usize,
    pub occupied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub priority: i64,
    pub size: usize,
}

impl SlotSnapshot {
    pub fn of(index: usize, entry: &CacheEntry) -> Self {
        if entry.occupied {
            Self {
                index,
                occupied: true,
                key: Some(entry.key.clone()),
                priority: entry.priority,
                size: entry.payload.len(),
            }
        } else {
            Self {
                index,
                occupied: false,
                key: None,
                priority: 0,
                size: 0,
            }
        }
    }
}
