//! propwatch - change-notification subscription registry.
//!
//! Subscribers attach listeners to publishers through a [`Registry`] and
//! later drop all of them with a single call, keyed only by their subscriber
//! id and the opaque [`SubscriptionId`]s the registry handed out.

pub mod collection;
pub mod config;
pub mod error;
pub mod identity;
pub mod listener;
pub mod notify;
pub mod registry;

pub use collection::{ObservableCollection, ObservableVec};
pub use config::{RegistryConfig, ShutdownPolicy};
pub use error::{Error, Result};
pub use identity::{IdentitySource, SubscriptionId};
pub use listener::{ChangeListener, ListenerId, MembershipChange, MembershipListener};
pub use notify::{ChangeNotifier, Notifiable};
pub use registry::{
    new_shared_registry, CollectionCallbacks, Registry, RegistryStats, SharedRegistry,
    SubscriptionKind,
};
