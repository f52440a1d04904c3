//! Subscription registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::collection::{MembershipDetach, ObservableCollection};
use crate::config::{RegistryConfig, ShutdownPolicy};
use crate::identity::{IdentitySource, SubscriptionId};
use crate::listener::{ChangeListener, MembershipChange, MembershipListener};
use crate::notify::{Detachable, Notifiable};

use super::callbacks::CollectionCallbacks;
use super::handle::{Handle, SubscriptionKind};
use super::members::{MemberSet, MemberTracker};
use super::stats::{Counters, RegistryStats};

type Table = HashMap<String, HashMap<SubscriptionId, Handle>>;

/// Registry of change subscriptions, grouped by subscriber.
///
/// Every `subscribe*` call attaches listeners and returns a fresh
/// [`SubscriptionId`]. A subscriber tears down all of its listeners with one
/// [`unsubscribe`](Registry::unsubscribe) call, or a single subscription with
/// [`unsubscribe_one`](Registry::unsubscribe_one).
///
/// The table lock is held only while the table itself is read or modified.
/// Attaching, detaching and callbacks all run outside it, so callbacks may
/// call back into the registry.
pub struct Registry {
    /// Subscriber id -> subscription id -> handle.
    table: Mutex<Table>,
    config: RegistryConfig,
    counters: Counters,
}

impl Registry {
    /// Create a registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with the given configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            config,
            counters: Counters::default(),
        }
    }

    /// The registry's configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Subscribe to changes of a single publisher.
    ///
    /// `on_change` receives the publisher and the name of the changed
    /// attribute.
    pub fn subscribe<S, T, F>(&self, subscriber: &S, publisher: &Arc<T>, on_change: F) -> SubscriptionId
    where
        S: IdentitySource + ?Sized,
        T: Notifiable,
        F: Fn(&T, &str) + Send + Sync + 'static,
    {
        let listener = ChangeListener::new(on_change);
        let listener_id = listener.id();
        publisher.add_change_listener(listener);

        let publisher: Weak<dyn Detachable> = Arc::downgrade(publisher) as Weak<T>;
        self.insert(
            subscriber.identity(),
            Handle::Single {
                publisher,
                listener: listener_id,
            },
        )
    }

    /// Subscribe to an observable collection and, through it, to each member.
    ///
    /// Members present now and members added later get the change listener;
    /// members that leave lose it. `on_add`/`on_remove` run once per element
    /// of each membership batch, added elements first.
    ///
    /// The membership listener is attached before the current members are
    /// read, so no addition is missed. An element added concurrently in that
    /// window is counted twice; it then keeps the change listener after
    /// leaving the collection, until this subscription is torn down.
    pub fn subscribe_collection<S, C>(
        &self,
        subscriber: &S,
        collection: &Arc<C>,
        callbacks: CollectionCallbacks<C::Item>,
    ) -> SubscriptionId
    where
        S: IdentitySource + ?Sized,
        C: ObservableCollection,
    {
        let CollectionCallbacks {
            on_change,
            on_add,
            on_remove,
        } = callbacks;

        let element_listener = ChangeListener::new(move |item: &C::Item, attribute: &str| {
            if let Some(on_change) = &on_change {
                on_change(item, attribute);
            }
        });
        let element_id = element_listener.id();
        let members = Arc::new(MemberSet::<C::Item>::new());

        let membership_listener = {
            let members = Arc::clone(&members);
            let element_listener = element_listener.clone();
            MembershipListener::new(move |change: &MembershipChange<C::Item>| {
                for item in &change.added {
                    if members.is_closed() {
                        return;
                    }
                    if members.enter(item) {
                        item.add_change_listener(element_listener.clone());
                        trace!(listener = %element_id, "attached to added member");
                    }
                    if let Some(on_add) = &on_add {
                        on_add(item);
                    }
                }
                for item in &change.removed {
                    if members.is_closed() {
                        return;
                    }
                    if members.leave(item) {
                        item.remove_change_listener(element_id);
                        trace!(listener = %element_id, "detached from removed member");
                    }
                    if let Some(on_remove) = &on_remove {
                        on_remove(item);
                    }
                }
            })
        };
        let membership_id = membership_listener.id();
        collection.add_membership_listener(membership_listener);

        for item in collection.members() {
            if members.enter(&item) {
                item.add_change_listener(element_listener.clone());
            }
        }
        trace!(
            listener = %element_id,
            members = members.len(),
            "attached to initial members"
        );

        let collection: Weak<dyn MembershipDetach> = Arc::downgrade(collection) as Weak<C>;
        let members: Arc<dyn MemberTracker> = members;
        self.insert(
            subscriber.identity(),
            Handle::Collection {
                collection,
                membership_listener: membership_id,
                element_listener: element_id,
                members,
            },
        )
    }

    /// Subscribe to every element of `items` as it is right now.
    ///
    /// The sequence is copied at call time. Elements added to or removed from
    /// the source afterwards are not tracked: only the copied elements
    /// notify, until the subscription is torn down.
    pub fn subscribe_snapshot<S, T, I, F>(&self, subscriber: &S, items: I, on_change: F) -> SubscriptionId
    where
        S: IdentitySource + ?Sized,
        T: Notifiable,
        I: IntoIterator<Item = Arc<T>>,
        F: Fn(&T, &str) + Send + Sync + 'static,
    {
        let snapshot: Vec<Arc<T>> = items.into_iter().collect();
        let listener = ChangeListener::new(on_change);
        let listener_id = listener.id();
        for item in &snapshot {
            item.add_change_listener(listener.clone());
        }

        let items = snapshot
            .iter()
            .map(|item| {
                let item: Weak<dyn Detachable> = Arc::downgrade(item) as Weak<T>;
                item
            })
            .collect();
        self.insert(
            subscriber.identity(),
            Handle::Snapshot {
                items,
                listener: listener_id,
            },
        )
    }

    /// Tear down every subscription of `subscriber`.
    ///
    /// Returns the number of subscriptions removed; unknown subscribers
    /// yield 0.
    pub fn unsubscribe<S>(&self, subscriber: &S) -> usize
    where
        S: IdentitySource + ?Sized,
    {
        let key = subscriber.identity();
        let removed = self.table.lock().remove(key).unwrap_or_default();
        let count = removed.len();
        for (id, handle) in removed {
            self.detach(key, &id, handle);
        }
        if count > 0 {
            debug!(subscriber = key, count, "subscriber removed");
        }
        count
    }

    /// Tear down one subscription.
    ///
    /// Returns whether it existed. Unknown subscribers and ids are ignored.
    pub fn unsubscribe_one<S>(&self, subscriber: &S, subscription: &SubscriptionId) -> bool
    where
        S: IdentitySource + ?Sized,
    {
        let key = subscriber.identity();
        let handle = {
            let mut table = self.table.lock();
            let inner = match table.get_mut(key) {
                Some(inner) => inner,
                None => return false,
            };
            let handle = inner.remove(subscription);
            if inner.is_empty() {
                table.remove(key);
            }
            handle
        };

        match handle {
            Some(handle) => {
                self.detach(key, subscription, handle);
                true
            }
            None => false,
        }
    }

    /// Tear down every subscription of every subscriber.
    pub fn unsubscribe_all(&self) -> usize {
        let table = std::mem::take(&mut *self.table.lock());
        let mut count = 0;
        for (subscriber, subscriptions) in table {
            for (id, handle) in subscriptions {
                self.detach(&subscriber, &id, handle);
                count += 1;
            }
        }
        count
    }

    /// Dispose of the registry, detaching everything regardless of the
    /// configured shutdown policy.
    pub fn close(self) -> usize {
        let count = self.unsubscribe_all();
        info!(detached = count, "registry closed");
        count
    }

    /// Number of subscribers with live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.table.lock().len()
    }

    /// Number of live subscriptions across all subscribers.
    pub fn subscription_count(&self) -> usize {
        self.table.lock().values().map(HashMap::len).sum()
    }

    /// Live subscription ids of `subscriber`, sorted.
    pub fn subscriptions_of<S>(&self, subscriber: &S) -> Vec<SubscriptionId>
    where
        S: IdentitySource + ?Sized,
    {
        let mut ids: Vec<SubscriptionId> = self
            .table
            .lock()
            .get(subscriber.identity())
            .map(|inner| inner.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Whether the subscription is live.
    pub fn contains<S>(&self, subscriber: &S, subscription: &SubscriptionId) -> bool
    where
        S: IdentitySource + ?Sized,
    {
        self.kind_of(subscriber, subscription).is_some()
    }

    /// Strategy of a live subscription.
    pub fn kind_of<S>(&self, subscriber: &S, subscription: &SubscriptionId) -> Option<SubscriptionKind>
    where
        S: IdentitySource + ?Sized,
    {
        self.table
            .lock()
            .get(subscriber.identity())
            .and_then(|inner| inner.get(subscription))
            .map(Handle::kind)
    }

    /// Current statistics.
    pub fn stats(&self) -> RegistryStats {
        let (active, subscribers) = {
            let table = self.table.lock();
            (table.values().map(HashMap::len).sum(), table.len())
        };
        RegistryStats {
            created: self.counters.created(),
            detached: self.counters.detached(),
            active,
            subscribers,
        }
    }

    fn insert(&self, subscriber: &str, handle: Handle) -> SubscriptionId {
        let id = SubscriptionId::generate(self.config.id_prefix.as_deref());
        let kind = handle.kind();
        self.table
            .lock()
            .entry(subscriber.to_string())
            .or_default()
            .insert(id.clone(), handle);
        self.counters.record_created();

        debug!(subscriber, subscription = %id, %kind, "subscription created");
        id
    }

    fn detach(&self, subscriber: &str, id: &SubscriptionId, handle: Handle) {
        let kind = handle.kind();
        let targets = handle.detach();
        self.counters.record_detached(1);

        debug!(subscriber, subscription = %id, %kind, targets, "subscription removed");
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        match self.config.shutdown {
            ShutdownPolicy::Drain => {
                let count = self.unsubscribe_all();
                if count > 0 {
                    info!(detached = count, "registry dropped, subscriptions drained");
                }
            }
            ShutdownPolicy::Leak => {
                let table = std::mem::take(self.table.get_mut());
                let count: usize = table.values().map(HashMap::len).sum();
                if count > 0 {
                    warn!(
                        leaked = count,
                        "registry dropped with live subscriptions, listeners left attached"
                    );
                }
            }
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("Registry")
            .field("subscribers", &stats.subscribers)
            .field("subscriptions", &stats.active)
            .field("shutdown", &self.config.shutdown)
            .finish()
    }
}

/// Shared registry handle.
pub type SharedRegistry = Arc<Registry>;

/// Create a new shared registry with default configuration.
pub fn new_shared_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ObservableVec;
    use crate::listener::ListenerId;
    use crate::notify::ChangeNotifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Cell {
        changes: ChangeNotifier<Cell>,
    }

    impl Cell {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                changes: ChangeNotifier::new(),
            })
        }

        fn touch(&self, attribute: &str) {
            self.changes.notify(self, attribute);
        }
    }

    impl Notifiable for Cell {
        fn add_change_listener(&self, listener: ChangeListener<Self>) {
            self.changes.add(listener);
        }

        fn remove_change_listener(&self, id: ListenerId) {
            self.changes.remove(id);
        }
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&Cell, &str) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        (count, move |_: &Cell, _: &str| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_subscribe_unsubscribe() {
        let registry = Registry::new();
        let cell = Cell::new();
        let (count, on_change) = counter();

        let id = registry.subscribe("view", &cell, on_change);
        assert_eq!(registry.subscription_count(), 1);
        assert_eq!(registry.subscriptions_of("view"), vec![id.clone()]);
        assert_eq!(registry.kind_of("view", &id), Some(SubscriptionKind::Single));

        cell.touch("a");
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(registry.unsubscribe_one("view", &id));
        assert!(!registry.unsubscribe_one("view", &id));
        assert_eq!(registry.subscriber_count(), 0);
        assert!(cell.changes.is_empty());

        cell.touch("a");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resubscribe_is_additive() {
        let registry = Registry::new();
        let cell = Cell::new();
        let (count, on_change) = counter();
        let (_, other) = counter();

        let first = registry.subscribe("view", &cell, on_change);
        let second = registry.subscribe("view", &cell, other);
        assert_ne!(first, second);
        assert_eq!(registry.subscriptions_of("view").len(), 2);

        registry.unsubscribe_one("view", &second);
        cell.touch("a");
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.contains("view", &first));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let registry = Registry::new();
        let cell = Cell::new();
        let (_, on_change) = counter();
        registry.subscribe("view", &cell, on_change);

        assert_eq!(registry.unsubscribe("nobody"), 0);
        assert!(!registry.unsubscribe_one("nobody", &SubscriptionId::from("x")));
        assert!(!registry.unsubscribe_one("view", &SubscriptionId::from("x")));
        assert_eq!(registry.subscription_count(), 1);
    }

    #[test]
    fn test_stats() {
        let registry = Registry::new();
        let a = Cell::new();
        let b = Cell::new();

        registry.subscribe("one", &a, |_: &Cell, _: &str| {});
        registry.subscribe("two", &b, |_: &Cell, _: &str| {});
        registry.subscribe_snapshot("two", vec![Arc::clone(&a)], |_: &Cell, _: &str| {});
        registry.unsubscribe("one");

        assert_eq!(
            registry.stats(),
            RegistryStats {
                created: 3,
                detached: 1,
                active: 2,
                subscribers: 1,
            }
        );
    }

    #[test]
    fn test_drop_drains_by_default() {
        let cell = Cell::new();
        {
            let registry = Registry::new();
            registry.subscribe("view", &cell, |_: &Cell, _: &str| {});
            assert_eq!(cell.changes.len(), 1);
        }
        assert!(cell.changes.is_empty());
    }

    #[test]
    fn test_drop_with_leak_policy() {
        let cell = Cell::new();
        {
            let registry =
                Registry::with_config(RegistryConfig::new().with_shutdown(ShutdownPolicy::Leak));
            registry.subscribe("view", &cell, |_: &Cell, _: &str| {});
        }
        assert_eq!(cell.changes.len(), 1);
    }

    #[test]
    fn test_close_ignores_leak_policy() {
        let cell = Cell::new();
        let registry =
            Registry::with_config(RegistryConfig::new().with_shutdown(ShutdownPolicy::Leak));
        registry.subscribe("view", &cell, |_: &Cell, _: &str| {});
        registry.subscribe("other", &cell, |_: &Cell, _: &str| {});

        assert_eq!(registry.close(), 2);
        assert!(cell.changes.is_empty());
    }

    #[test]
    fn test_id_prefix() {
        let registry = Registry::with_config(RegistryConfig::new().with_id_prefix("panel"));
        let cell = Cell::new();
        let id = registry.subscribe("view", &cell, |_: &Cell, _: &str| {});
        assert!(id.as_str().starts_with("panel-"));
    }

    #[test]
    fn test_collection_teardown_detaches_members_and_collection() {
        let registry = Registry::new();
        let a = Cell::new();
        let b = Cell::new();
        let coll = Arc::new(ObservableVec::from_items(vec![Arc::clone(&a)]));

        let id = registry.subscribe_collection("view", &coll, CollectionCallbacks::new());
        coll.push(Arc::clone(&b));
        assert_eq!(a.changes.len(), 1);
        assert_eq!(b.changes.len(), 1);
        assert_eq!(coll.listener_count(), 1);
        assert_eq!(registry.kind_of("view", &id), Some(SubscriptionKind::Collection));

        registry.unsubscribe("view");
        assert!(a.changes.is_empty());
        assert!(b.changes.is_empty());
        assert_eq!(coll.listener_count(), 0);
    }

    #[test]
    fn test_callback_may_reenter_registry() {
        let registry = new_shared_registry();
        let cell = Cell::new();

        let inner = Arc::clone(&registry);
        registry.subscribe("view", &cell, move |_: &Cell, _: &str| {
            inner.unsubscribe("view");
        });

        cell.touch("a");
        assert_eq!(registry.subscription_count(), 0);
        assert!(cell.changes.is_empty());
    }
}
