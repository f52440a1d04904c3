//! Callbacks for collection subscriptions.

use std::fmt;
use std::sync::Arc;

pub(crate) type ChangeCallback<T> = Arc<dyn Fn(&T, &str) + Send + Sync>;
pub(crate) type MemberCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Optional callbacks for [`Registry::subscribe_collection`].
///
/// Omitted callbacks are no-ops.
///
/// [`Registry::subscribe_collection`]: super::Registry::subscribe_collection
pub struct CollectionCallbacks<T> {
    pub(crate) on_change: Option<ChangeCallback<T>>,
    pub(crate) on_add: Option<MemberCallback<T>>,
    pub(crate) on_remove: Option<MemberCallback<T>>,
}

impl<T> CollectionCallbacks<T> {
    /// No callbacks.
    pub fn new() -> Self {
        Self {
            on_change: None,
            on_add: None,
            on_remove: None,
        }
    }

    /// Called with `(element, attribute)` for every change of a member.
    pub fn with_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T, &str) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    /// Called for every element entering the collection.
    pub fn with_add<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_add = Some(Arc::new(callback));
        self
    }

    /// Called for every element leaving the collection.
    pub fn with_remove<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_remove = Some(Arc::new(callback));
        self
    }
}

impl<T> Default for CollectionCallbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CollectionCallbacks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionCallbacks")
            .field("on_change", &self.on_change.is_some())
            .field("on_add", &self.on_add.is_some())
            .field("on_remove", &self.on_remove.is_some())
            .finish()
    }
}
