//! Cache Store Module
//!
//! Fixed array of slots, each behind its own `SlotLock`. Eviction picks the
//! first empty slot, or else the slot with the lowest priority; every insert
//! ages all other occupied slots by one.

use tokio::sync::Mutex;

use crate::cache::{CacheEntry, CacheStats, SlotLock, SlotSnapshot};
use crate::error::CacheError;

// == Insert Outcome ==
/// Where an insert landed and what it displaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Slot that now holds the entry
    pub index: usize,
    /// Key of the entry that was overwritten, if the slot held a different key
    pub evicted: Option<String>,
}

// == Cache Store ==
/// Shared object cache with a fixed number of independently locked slots.
///
/// No lock is ever held on more than one slot at a time, so scans are not
/// snapshots: a concurrent insert may be observed half-way through aging.
pub struct CacheStore {
    /// Slot storage
    slots: Box<[SlotLock<CacheEntry>]>,
    /// Serializes inserts among themselves, lookups never take it
    inserting: Mutex<()>,
    /// Performance statistics
    stats: CacheStats,
    /// Largest payload accepted
    max_object_size: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store with `slot_count` empty slots.
    ///
    /// # Arguments
    /// * `slot_count` - Number of slots, at least one is always created
    /// * `max_object_size` - Largest payload, in bytes, an entry may hold
    pub fn new(slot_count: usize, max_object_size: usize) -> Self {
        let slots = (0..slot_count.max(1))
            .map(|_| SlotLock::default())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            slots,
            inserting: Mutex::new(()),
            stats: CacheStats::new(),
            max_object_size,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Largest payload the store accepts.
    pub fn max_object_size(&self) -> usize {
        self.max_object_size
    }

    /// Shared statistics counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    // == Lookup ==
    /// Returns the index of the first slot holding `key`, scanning in slot order.
    pub async fn lookup(&self, key: &str) -> Result<Option<usize>, CacheError> {
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.read().await?.matches(key) {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    // == Get ==
    /// Returns a copy of the payload cached for `key`.
    ///
    /// The copy is taken in the same read window in which the key matched.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        for slot in self.slots.iter() {
            let entry = slot.read().await?;
            if entry.matches(key) {
                let payload = entry.payload.clone();
                drop(entry);
                self.stats.record_hit();
                return Ok(Some(payload));
            }
        }

        self.stats.record_miss();
        Ok(None)
    }

    // == Select Victim ==
    /// Picks the slot the next insert will overwrite.
    ///
    /// The first empty slot wins outright. Otherwise the lowest priority wins,
    /// ties going to the lowest index.
    pub async fn select_victim(&self) -> Result<usize, CacheError> {
        let mut victim: Option<(usize, i64)> = None;

        for (index, slot) in self.slots.iter().enumerate() {
            let entry = slot.read().await?;
            if !entry.occupied {
                return Ok(index);
            }
            match victim {
                Some((_, lowest)) if entry.priority >= lowest => {}
                _ => victim = Some((index, entry.priority)),
            }
        }

        Ok(victim.map(|(index, _)| index).unwrap_or(0))
    }

    // == Insert ==
    /// Stores `payload` under `key`, evicting if needed, then ages every other slot.
    ///
    /// An existing slot for the same key is reused, so a key occupies at most
    /// one slot.
    pub async fn insert(&self, key: String, payload: Vec<u8>) -> Result<InsertOutcome, CacheError> {
        if payload.len() > self.max_object_size {
            return Err(CacheError::ObjectTooLarge {
                size: payload.len(),
                limit: self.max_object_size,
            });
        }

        let _inserting = self.inserting.lock().await;

        let index = match self.lookup(&key).await? {
            Some(index) => index,
            None => self.select_victim().await?,
        };

        let evicted = {
            let mut entry = self.slots[index].write().await?;
            let evicted = if entry.occupied && entry.key != key {
                Some(std::mem::take(&mut entry.key))
            } else {
                None
            };
            entry.fill(key, payload);
            evicted
        };

        self.stats.record_insertion();
        if evicted.is_some() {
            self.stats.record_eviction();
        }

        self.age_except(index).await?;

        Ok(InsertOutcome { index, evicted })
    }

    // == Age ==
    /// Lowers the priority of every occupied slot except `target`, one slot at a time.
    async fn age_except(&self, target: usize) -> Result<(), CacheError> {
        for (index, slot) in self.slots.iter().enumerate() {
            if index != target {
                slot.write().await?.age();
            }
        }
        Ok(())
    }

    // == Occupied Length ==
    /// Number of occupied slots.
    pub async fn occupied_len(&self) -> Result<usize, CacheError> {
        let mut count = 0;
        for slot in self.slots.iter() {
            if slot.read().await?.occupied {
                count += 1;
            }
        }
        Ok(count)
    }

    // == Snapshot ==
    /// Reads every slot's metadata, one slot at a time.
    pub async fn snapshot(&self) -> Result<Vec<SlotSnapshot>, CacheError> {
        let mut snapshots = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            snapshots.push(SlotSnapshot::of(index, &*slot.read().await?));
        }
        Ok(snapshots)
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("capacity", &self.slots.len())
            .field("max_object_size", &self.max_object_size)
            .field("stats", &self.stats)
            .finish()
    }
}
