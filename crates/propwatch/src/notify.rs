//! The publisher capability and an embeddable listener list.
//!
//! # Usage
//!
//! ```
//! use parking_lot::Mutex;
//! use propwatch::{ChangeListener, ChangeNotifier, ListenerId, Notifiable};
//!
//! struct User {
//!     name: Mutex<String>,
//!     changes: ChangeNotifier<User>,
//! }
//!
//! impl User {
//!     fn set_name(&self, name: &str) {
//!         *self.name.lock() = name.to_string();
//!         self.changes.notify(self, "name");
//!     }
//! }
//!
//! impl Notifiable for User {
//!     fn add_change_listener(&self, listener: ChangeListener<Self>) {
//!         self.changes.add(listener);
//!     }
//!
//!     fn remove_change_listener(&self, id: ListenerId) {
//!         self.changes.remove(id);
//!     }
//! }
//! ```

use parking_lot::Mutex;

use crate::listener::{ChangeListener, ListenerId};

/// An object that emits attribute change notifications.
///
/// Any number of listeners may be attached. Removing an id that is not
/// attached must be a no-op.
pub trait Notifiable: Send + Sync + 'static {
    /// Attach a listener.
    fn add_change_listener(&self, listener: ChangeListener<Self>);

    /// Detach the listener with the given id.
    fn remove_change_listener(&self, id: ListenerId);
}

/// Type-erased detach capability, so handles can hold publishers of any type.
pub(crate) trait Detachable: Send + Sync {
    fn detach(&self, id: ListenerId);
}

impl<T: Notifiable> Detachable for T {
    fn detach(&self, id: ListenerId) {
        self.remove_change_listener(id);
    }
}

/// Listener list for implementing [`Notifiable`].
///
/// Listeners run in registration order. The list is snapshotted before
/// emission and the lock is released while callbacks run, so a callback may
/// attach or detach listeners on the same notifier.
pub struct ChangeNotifier<T: ?Sized> {
    listeners: Mutex<Vec<ChangeListener<T>>>,
}

impl<T: ?Sized> ChangeNotifier<T> {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Attach a listener.
    pub fn add(&self, listener: ChangeListener<T>) {
        self.listeners.lock().push(listener);
    }

    /// Detach a listener by id. Returns whether it was attached.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| l.id() != id);
        listeners.len() != before
    }

    /// Notify every attached listener that `attribute` changed on `emitter`.
    pub fn notify(&self, emitter: &T, attribute: &str) {
        let snapshot: Vec<ChangeListener<T>> = self.listeners.lock().clone();
        for listener in snapshot {
            listener.notify(emitter, attribute);
        }
    }

    /// Number of attached listeners.
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Whether no listener is attached.
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl<T: ?Sized> Default for ChangeNotifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for ChangeNotifier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.len())
            .finish()
    }
}
