//! Explicit membership tracking for collection subscriptions.
//!
//! Each tracked element carries an occurrence count; the per-element listener
//! is attached when the count leaves zero and detached when it returns to
//! zero. Once closed, the set refuses every transition so late membership
//! batches cannot re-attach anything.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::notify::{Detachable, Notifiable};

struct Entry<T> {
    item: Weak<T>,
    count: usize,
}

struct MemberState<T> {
    /// Keyed by element address. The `Weak` keeps the allocation alive, so
    /// an address cannot be reused while its entry exists.
    entries: HashMap<usize, Entry<T>>,
    closed: bool,
}

/// Multiset of collection members, keyed by element identity.
pub(crate) struct MemberSet<T> {
    state: Mutex<MemberState<T>>,
}

fn address<T>(item: &Arc<T>) -> usize {
    Arc::as_ptr(item) as usize
}

impl<T> MemberSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(MemberState {
                entries: HashMap::new(),
                closed: false,
            }),
        }
    }

    /// Record one occurrence of `item` entering.
    ///
    /// Returns true when the listener must be attached.
    pub(crate) fn enter(&self, item: &Arc<T>) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }

        match state.entries.get_mut(&address(item)) {
            Some(entry) => {
                entry.count += 1;
                false
            }
            None => {
                state.entries.insert(
                    address(item),
                    Entry {
                        item: Arc::downgrade(item),
                        count: 1,
                    },
                );
                true
            }
        }
    }

    /// Record one occurrence of `item` leaving.
    ///
    /// Returns true when the listener must be detached.
    pub(crate) fn leave(&self, item: &Arc<T>) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }

        let key = address(item);
        let entry = match state.entries.get_mut(&key) {
            Some(entry) => entry,
            None => return false,
        };
        entry.count -= 1;
        if entry.count == 0 {
            state.entries.remove(&key);
            true
        } else {
            false
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// Type-erased view used by the collection handle at teardown.
pub(crate) trait MemberTracker: Send + Sync {
    /// Close the set and hand back every element still attached.
    fn close(&self) -> Vec<Weak<dyn Detachable>>;

    /// Number of distinct attached elements that are still alive.
    fn len(&self) -> usize;
}

impl<T: Notifiable> MemberTracker for MemberSet<T> {
    fn close(&self) -> Vec<Weak<dyn Detachable>> {
        let entries = {
            let mut state = self.state.lock();
            state.closed = true;
            std::mem::take(&mut state.entries)
        };
        entries
            .into_values()
            .filter(|entry| entry.item.strong_count() > 0)
            .map(|entry| {
                let item: Weak<dyn Detachable> = entry.item;
                item
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.state
            .lock()
            .entries
            .values()
            .filter(|entry| entry.item.strong_count() > 0)
            .count()
    }
}
