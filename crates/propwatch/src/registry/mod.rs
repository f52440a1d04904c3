//! The subscription registry.
//!
//! Three subscription strategies share one handle type:
//!
//! - **single**: one publisher, one listener;
//! - **collection**: an observable collection whose members gain and lose the
//!   listener as they enter and leave it;
//! - **snapshot**: the elements of a sequence as they were at subscribe time.
//!
//! # Usage
//!
//! ```ignore
//! use propwatch::{CollectionCallbacks, Registry};
//!
//! let registry = Registry::new();
//!
//! // One publisher
//! registry.subscribe("editor", &user, |user, attribute| redraw(user, attribute));
//!
//! // A collection, following its membership
//! registry.subscribe_collection(
//!     "editor",
//!     &users,
//!     CollectionCallbacks::new()
//!         .with_change(|user, attribute| redraw(user, attribute))
//!         .with_add(|user| insert_row(user))
//!         .with_remove(|user| delete_row(user)),
//! );
//!
//! // Everything "editor" attached, in one call
//! registry.unsubscribe("editor");
//! ```

mod callbacks;
mod handle;
mod manager;
mod members;
mod stats;

pub use callbacks::CollectionCallbacks;
pub use handle::SubscriptionKind;
pub use manager::{new_shared_registry, Registry, SharedRegistry};
pub use stats::RegistryStats;
