//! Slot Lock Module
//!
//! First-reader/last-reader lock guarding one cache slot.
//!
//! Any number of readers may hold a slot at the same time. The first reader
//! to arrive takes the slot's exclusive lock on behalf of every reader and
//! the last reader to leave gives it back, so a writer excludes all readers
//! and all other writers on that slot. The exclusive lock is a single-permit
//! semaphore because it is released by whichever reader happens to leave
//! last, not necessarily the one that acquired it.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex as StdMutex;

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};

use crate::error::CacheError;

// == Slot Lock ==
/// Reader/writer lock for a single value, using the classic reader-count
/// discipline.
pub struct SlotLock<T> {
    /// Serializes arriving readers while the first one waits for `exclusive`
    arrivals: Mutex<()>,
    /// Number of readers currently inside the slot
    readers: StdMutex<usize>,
    /// The slot's exclusive lock
    exclusive: Semaphore,
    data: UnsafeCell<T>,
}

// SAFETY: `data` is only reachable through `SlotReadGuard` (shared access,
// issued while the readers collectively hold the single `exclusive` permit)
// and `SlotWriteGuard` (unique access, issued while one writer holds it).
unsafe impl<T: Send + Sync> Sync for SlotLock<T> {}

impl<T> SlotLock<T> {
    // == Constructor ==
    pub fn new(value: T) -> Self {
        Self {
            arrivals: Mutex::new(()),
            readers: StdMutex::new(0),
            exclusive: Semaphore::new(1),
            data: UnsafeCell::new(value),
        }
    }

    // == Read ==
    /// Acquires shared access to the slot.
    ///
    /// Only the first of a group of overlapping readers waits on the
    /// exclusive lock; later readers just bump the reader count.
    pub async fn read(&self) -> Result<SlotReadGuard<'_, T>, CacheError> {
        let _arrival = self.arrivals.lock().await;

        {
            let mut readers = self.lock_readers();
            if *readers > 0 {
                *readers += 1;
                return Ok(SlotReadGuard { lock: self });
            }
        }

        // No readers inside, and none can arrive while `_arrival` is held,
        // so the count stays at zero until this reader records itself.
        let permit = self
            .exclusive
            .acquire()
            .await
            .map_err(|_| CacheError::LockClosed)?;
        permit.forget();
        *self.lock_readers() = 1;

        Ok(SlotReadGuard { lock: self })
    }

    // == Write ==
    /// Acquires exclusive access to the slot.
    pub async fn write(&self) -> Result<SlotWriteGuard<'_, T>, CacheError> {
        let permit = self
            .exclusive
            .acquire()
            .await
            .map_err(|_| CacheError::LockClosed)?;

        Ok(SlotWriteGuard {
            lock: self,
            _permit: permit,
        })
    }

    fn release_read(&self) {
        let mut readers = self.lock_readers();
        *readers -= 1;
        if *readers == 0 {
            self.exclusive.add_permits(1);
        }
    }

    fn lock_readers(&self) -> std::sync::MutexGuard<'_, usize> {
        // The count is a plain integer, a poisoned guard still holds a valid value
        self.readers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current number of readers inside the slot.
    pub fn reader_count(&self) -> usize {
        *self.lock_readers()
    }
}

impl<T: Default> Default for SlotLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// == Guards ==
/// Shared access to a slot; the last guard dropped releases the slot.
pub struct SlotReadGuard<'a, T> {
    lock: &'a SlotLock<T>,
}

impl<T> Deref for SlotReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: readers hold the exclusive permit collectively, no writer can exist
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for SlotReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// Exclusive access to a slot, released on drop.
pub struct SlotWriteGuard<'a, T> {
    lock: &'a SlotLock<T>,
    _permit: SemaphorePermit<'a>,
}

impl<T> Deref for SlotWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: this guard owns the only exclusive permit
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SlotWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: this guard owns the only exclusive permit
        unsafe { &mut *self.lock.data.get() }
    }
}
