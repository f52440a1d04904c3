//! Subscriber and subscription identities.

use std::fmt;

use uuid::Uuid;

/// Anything with a stable string identity usable as a subscriber key.
pub trait IdentitySource {
    /// The identity string. Must not change while subscriptions are live.
    fn identity(&self) -> &str;
}

impl IdentitySource for str {
    fn identity(&self) -> &str {
        self
    }
}

impl IdentitySource for String {
    fn identity(&self) -> &str {
        self.as_str()
    }
}

impl<S: IdentitySource + ?Sized> IdentitySource for &S {
    fn identity(&self) -> &str {
        (**self).identity()
    }
}

/// Opaque identifier of one subscription.
///
/// Only equality is meaningful; the textual layout is not part of the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Generate a fresh random (v4 UUID) id.
    pub(crate) fn generate(prefix: Option<&str>) -> Self {
        let raw = Uuid::new_v4().to_string();
        match prefix {
            Some(prefix) => Self(format!("{}-{}", prefix, raw)),
            None => Self(raw),
        }
    }

    /// Borrow the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl IdentitySource for SubscriptionId {
    fn identity(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SubscriptionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SubscriptionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for SubscriptionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
