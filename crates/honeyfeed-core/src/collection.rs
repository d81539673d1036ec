//! Concurrency-safe ordered collection with optional oldest-first eviction.
//!
//! [`BoundedCollection`] backs the rolling aggregates: the capacity-bounded
//! variant holds the event history, the unbounded one holds country counters.
//! Appends from the pipeline and snapshot reads from session attach may run
//! concurrently; every operation takes the internal lock once, so iteration
//! and serialization always observe a consistent point-in-time view.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Serialize, Serializer};

/// Ordered list with optional capacity, safe to share across tasks.
#[derive(Debug)]
pub struct BoundedCollection<T> {
    items: RwLock<VecDeque<T>>,
    limit: Option<usize>,
}

impl<T> BoundedCollection<T> {
    /// Collection that never evicts.
    pub fn unbounded() -> Self {
        Self {
            items: RwLock::new(VecDeque::new()),
            limit: None,
        }
    }

    /// Collection that evicts its oldest element once it holds more than
    /// `limit` elements. A limit of zero is treated as one.
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            items: RwLock::new(VecDeque::with_capacity(limit)),
            limit: Some(limit),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Append `item`, returning the evicted oldest element if capacity was exceeded.
    pub fn append(&self, item: T) -> Option<T> {
        let mut items = self.write();
        items.push_back(item);
        match self.limit {
            Some(limit) if items.len() > limit => items.pop_front(),
            _ => None,
        }
    }

    /// Visit elements oldest first until `f` returns `false`.
    pub fn range<F>(&self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        for item in self.read().iter() {
            if !f(item) {
                break;
            }
        }
    }

    /// Visit elements mutably, oldest first, until `f` returns `false`.
    pub fn range_mut<F>(&self, mut f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        for item in self.write().iter_mut() {
            if !f(item) {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> BoundedCollection<T> {
    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.read().iter().cloned().collect()
    }
}

impl<T> Default for BoundedCollection<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T: Serialize> Serialize for BoundedCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.read().iter())
    }
}
