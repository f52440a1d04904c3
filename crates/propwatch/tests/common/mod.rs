//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use parking_lot::Mutex;
use propwatch::{ChangeListener, ChangeNotifier, IdentitySource, ListenerId, Notifiable};

/// Install a test tracing subscriber once, honoring `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "propwatch=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A notifying record with two attributes.
pub struct User {
    first_name: Mutex<String>,
    last_name: Mutex<String>,
    changes: ChangeNotifier<User>,
}

impl User {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            first_name: Mutex::new(String::new()),
            last_name: Mutex::new(String::new()),
            changes: ChangeNotifier::new(),
        })
    }

    pub fn first_name(&self) -> String {
        self.first_name.lock().clone()
    }

    /// Notifies only when the value actually changes.
    pub fn set_first_name(&self, value: &str) {
        if Self::replace(&self.first_name, value) {
            self.changes.notify(self, "first_name");
        }
    }

    pub fn set_last_name(&self, value: &str) {
        if Self::replace(&self.last_name, value) {
            self.changes.notify(self, "last_name");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.changes.len()
    }

    fn replace(slot: &Mutex<String>, value: &str) -> bool {
        let mut current = slot.lock();
        if *current == value {
            return false;
        }
        *current = value.to_string();
        true
    }
}

impl Notifiable for User {
    fn add_change_listener(&self, listener: ChangeListener<Self>) {
        self.changes.add(listener);
    }

    fn remove_change_listener(&self, id: ListenerId) {
        self.changes.remove(id);
    }
}

/// A subscriber identified by a name.
pub struct Screen {
    pub name: String,
}

impl IdentitySource for Screen {
    fn identity(&self) -> &str {
        &self.name
    }
}

/// Shared counter with a convenience reader.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
