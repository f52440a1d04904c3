//! Observable collections.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::listener::{ListenerId, MembershipChange, MembershipListener};
use crate::notify::Notifiable;

/// An ordered container that reports membership changes.
pub trait ObservableCollection: Send + Sync + 'static {
    /// Element type.
    type Item: Notifiable;

    /// Current members in iteration order.
    fn members(&self) -> Vec<Arc<Self::Item>>;

    /// Attach a membership listener.
    fn add_membership_listener(&self, listener: MembershipListener<Self::Item>);

    /// Detach a membership listener. Unknown ids are ignored.
    fn remove_membership_listener(&self, id: ListenerId);
}

/// Type-erased membership detach, mirroring `notify::Detachable`.
pub(crate) trait MembershipDetach: Send + Sync {
    fn detach_membership(&self, id: ListenerId);
}

impl<C: ObservableCollection> MembershipDetach for C {
    fn detach_membership(&self, id: ListenerId) {
        self.remove_membership_listener(id);
    }
}

/// A `Vec` of shared elements that emits a [`MembershipChange`] on every
/// mutation.
///
/// Changes are delivered after the internal lock is released, one batch per
/// mutating call.
pub struct ObservableVec<T> {
    items: Mutex<Vec<Arc<T>>>,
    listeners: Mutex<Vec<MembershipListener<T>>>,
}

impl<T> ObservableVec<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    /// Create a collection with initial members. No change is emitted.
    pub fn from_items(items: Vec<Arc<T>>) -> Self {
        Self {
            items: Mutex::new(items),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Append an element.
    pub fn push(&self, item: Arc<T>) {
        self.items.lock().push(Arc::clone(&item));
        self.emit(MembershipChange::added(vec![item]));
    }

    /// Insert an element at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, item: Arc<T>) {
        {
            let mut items = self.items.lock();
            let index = index.min(items.len());
            items.insert(index, Arc::clone(&item));
        }
        self.emit(MembershipChange::added(vec![item]));
    }

    /// Remove the first occurrence of `item` (by identity).
    ///
    /// Returns whether an element was removed.
    pub fn remove(&self, item: &Arc<T>) -> bool {
        let removed = {
            let mut items = self.items.lock();
            items
                .iter()
                .position(|candidate| Arc::ptr_eq(candidate, item))
                .map(|pos| items.remove(pos))
        };
        match removed {
            Some(removed) => {
                self.emit(MembershipChange::removed(vec![removed]));
                true
            }
            None => false,
        }
    }

    /// Remove the element at `index`, if any.
    pub fn remove_at(&self, index: usize) -> Option<Arc<T>> {
        let removed = {
            let mut items = self.items.lock();
            (index < items.len()).then(|| items.remove(index))
        }?;
        self.emit(MembershipChange::removed(vec![Arc::clone(&removed)]));
        Some(removed)
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn replace(&self, index: usize, item: Arc<T>) -> Option<Arc<T>> {
        let old = {
            let mut items = self.items.lock();
            let slot = items.get_mut(index)?;
            std::mem::replace(slot, Arc::clone(&item))
        };
        self.emit(MembershipChange::replaced(Arc::clone(&old), item));
        Some(old)
    }

    /// Remove every element.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.items.lock());
        self.emit(MembershipChange::removed(removed));
    }

    /// Whether `item` (by identity) is a member.
    pub fn contains(&self, item: &Arc<T>) -> bool {
        self.items
            .lock()
            .iter()
            .any(|candidate| Arc::ptr_eq(candidate, item))
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Number of attached membership listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn emit(&self, change: MembershipChange<T>) {
        if change.is_empty() {
            return;
        }
        let snapshot: Vec<MembershipListener<T>> = self.listeners.lock().clone();
        for listener in snapshot {
            listener.notify(&change);
        }
    }
}

impl<T> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<Arc<T>> for ObservableVec<T> {
    fn from_iter<I: IntoIterator<Item = Arc<T>>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}

impl<T: Notifiable> ObservableCollection for ObservableVec<T> {
    type Item = T;

    fn members(&self) -> Vec<Arc<T>> {
        self.items.lock().clone()
    }

    fn add_membership_listener(&self, listener: MembershipListener<T>) {
        self.listeners.lock().push(listener);
    }

    fn remove_membership_listener(&self, id: ListenerId) {
        self.listeners.lock().retain(|l| l.id() != id);
    }
}
