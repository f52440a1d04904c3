//! Listener objects handed to publishers and collections.
//!
//! A listener pairs a callback with a [`ListenerId`]. Publishers store the
//! listener and later remove it by id, so the registry only has to remember
//! the id to detach.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of an attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate a fresh listener id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

type ChangeFn<T> = dyn Fn(&T, &str) + Send + Sync;

/// Listener for attribute changes on a publisher of type `T`.
///
/// Invoked with the emitting object and the name of the changed attribute.
pub struct ChangeListener<T: ?Sized> {
    id: ListenerId,
    callback: Arc<ChangeFn<T>>,
}

impl<T: ?Sized> ChangeListener<T> {
    /// Wrap a callback, allocating a new id.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T, &str) + Send + Sync + 'static,
    {
        Self {
            id: ListenerId::next(),
            callback: Arc::new(callback),
        }
    }

    /// Id used to remove this listener.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Deliver a change notification.
    pub fn notify(&self, emitter: &T, attribute: &str) {
        (self.callback)(emitter, attribute)
    }
}

impl<T: ?Sized> Clone for ChangeListener<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ChangeListener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeListener")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// One membership change of an observable collection.
///
/// `added` and `removed` list the affected elements in the order the
/// collection presents them; either may be empty.
#[derive(Debug)]
pub struct MembershipChange<T> {
    /// Elements that entered the collection.
    pub added: Vec<Arc<T>>,
    /// Elements that left the collection.
    pub removed: Vec<Arc<T>>,
}

impl<T> MembershipChange<T> {
    /// A batch of added elements.
    pub fn added(items: Vec<Arc<T>>) -> Self {
        Self {
            added: items,
            removed: Vec::new(),
        }
    }

    /// A batch of removed elements.
    pub fn removed(items: Vec<Arc<T>>) -> Self {
        Self {
            added: Vec::new(),
            removed: items,
        }
    }

    /// A replacement: `old` left and `new` entered.
    pub fn replaced(old: Arc<T>, new: Arc<T>) -> Self {
        Self {
            added: vec![new],
            removed: vec![old],
        }
    }

    /// True when neither batch carries elements.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl<T> Clone for MembershipChange<T> {
    fn clone(&self) -> Self {
        Self {
            added: self.added.clone(),
            removed: self.removed.clone(),
        }
    }
}

type MembershipFn<T> = dyn Fn(&MembershipChange<T>) + Send + Sync;

/// Listener for membership changes of a collection of `T`.
pub struct MembershipListener<T> {
    id: ListenerId,
    callback: Arc<MembershipFn<T>>,
}

impl<T> MembershipListener<T> {
    /// Wrap a callback, allocating a new id.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&MembershipChange<T>) + Send + Sync + 'static,
    {
        Self {
            id: ListenerId::next(),
            callback: Arc::new(callback),
        }
    }

    /// Id used to remove this listener.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Deliver a membership change.
    pub fn notify(&self, change: &MembershipChange<T>) {
        (self.callback)(change)
    }
}

impl<T> Clone for MembershipListener<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for MembershipListener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MembershipListener")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
