//! Unsubscribe handles.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::collection::MembershipDetach;
use crate::listener::ListenerId;
use crate::notify::Detachable;

use super::members::MemberTracker;

/// The strategy a subscription was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// One publisher.
    Single,
    /// An observable collection, following its membership.
    Collection,
    /// A fixed snapshot of elements.
    Snapshot,
}

impl SubscriptionKind {
    /// Lower-case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionKind::Single => "single",
            SubscriptionKind::Collection => "collection",
            SubscriptionKind::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to detach one subscription.
///
/// References are weak: a handle never keeps a publisher alive, and a
/// publisher that is already gone needs no detaching.
pub(crate) enum Handle {
    Single {
        publisher: Weak<dyn Detachable>,
        listener: ListenerId,
    },
    Collection {
        collection: Weak<dyn MembershipDetach>,
        membership_listener: ListenerId,
        element_listener: ListenerId,
        members: Arc<dyn MemberTracker>,
    },
    Snapshot {
        items: Vec<Weak<dyn Detachable>>,
        listener: ListenerId,
    },
}

impl Handle {
    pub(crate) fn kind(&self) -> SubscriptionKind {
        match self {
            Handle::Single { .. } => SubscriptionKind::Single,
            Handle::Collection { .. } => SubscriptionKind::Collection,
            Handle::Snapshot { .. } => SubscriptionKind::Snapshot,
        }
    }

    /// Detach every listener this subscription attached.
    ///
    /// Returns the number of live objects a listener was removed from.
    pub(crate) fn detach(self) -> usize {
        match self {
            Handle::Single {
                publisher,
                listener,
            } => detach_all(std::iter::once(publisher), listener),
            Handle::Collection {
                collection,
                membership_listener,
                element_listener,
                members,
            } => {
                let mut detached = detach_all(members.close(), element_listener);
                if let Some(collection) = collection.upgrade() {
                    collection.detach_membership(membership_listener);
                    detached += 1;
                }
                detached
            }
            Handle::Snapshot { items, listener } => detach_all(items, listener),
        }
    }
}

fn detach_all<I>(targets: I, listener: ListenerId) -> usize
where
    I: IntoIterator<Item = Weak<dyn Detachable>>,
{
    let mut detached = 0;
    for target in targets {
        if let Some(target) = target.upgrade() {
            target.detach(listener);
            detached += 1;
        }
    }
    detached
}
