//! Per-instance memoization with explicit invalidation.
//!
//! Each cached operation owns a [`Memo`] slot that lives and dies with its owner
//! (a `Database`, `Table` or `Join`). There is no process-wide cache; `forget()` only
//! ever touches the slots of the instance it is called on.

use crate::error::OrmResult;
use std::sync::{Mutex, PoisonError};

/// A lazily computed, clearable value.
#[derive(Debug)]
pub struct Memo<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Memo<T> {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T: Clone> Memo<T> {
    /// Return the cached value, computing it with `init` on a miss.
    ///
    /// The lock is not held while `init` runs, so `init` may consult other memos of the
    /// same owner. If two callers race, the value stored first wins and both get it.
    /// A failed `init` caches nothing.
    pub fn get_or_try_init<F>(&self, init: F) -> OrmResult<T>
    where
        F: FnOnce() -> OrmResult<T>,
    {
        if let Some(hit) = self.get() {
            return Ok(hit);
        }

        let computed = init()?;

        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.get_or_insert(computed).clone())
    }

    /// The cached value, if any.
    pub fn get(&self) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a value is currently cached.
    pub fn is_cached(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drop the cached value; the next access recomputes it.
    pub fn forget(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
