//! Registry configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable selecting the shutdown policy.
pub const SHUTDOWN_ENV: &str = "PROPWATCH_SHUTDOWN";

/// Environment variable carrying the subscription id prefix.
pub const ID_PREFIX_ENV: &str = "PROPWATCH_ID_PREFIX";

/// What a registry does with live subscriptions when it is dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Detach every remaining subscription.
    #[default]
    Drain,
    /// Forget the handles and leave listeners attached.
    Leak,
}

impl ShutdownPolicy {
    /// Lower-case name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownPolicy::Drain => "drain",
            ShutdownPolicy::Leak => "leak",
        }
    }
}

impl fmt::Display for ShutdownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShutdownPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drain" => Ok(ShutdownPolicy::Drain),
            "leak" => Ok(ShutdownPolicy::Leak),
            other => Err(Error::InvalidConfig(format!(
                "unknown shutdown policy '{}' (expected 'drain' or 'leak')",
                other
            ))),
        }
    }
}

/// Registry configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Behavior on drop.
    pub shutdown: ShutdownPolicy,

    /// Optional prefix prepended to generated subscription ids.
    pub id_prefix: Option<String>,
}

impl RegistryConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `PROPWATCH_SHUTDOWN` and `PROPWATCH_ID_PREFIX`.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(policy) = lookup(SHUTDOWN_ENV) {
            config.shutdown = policy.parse()?;
        }
        if let Some(prefix) = lookup(ID_PREFIX_ENV) {
            config.id_prefix = Some(prefix);
        }
        config.validate()?;
        Ok(config)
    }

    /// Set the shutdown policy.
    pub fn with_shutdown(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown = policy;
        self
    }

    /// Set the subscription id prefix.
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if let Some(prefix) = &self.id_prefix {
            if prefix.is_empty() {
                return Err(Error::InvalidConfig("id prefix must not be empty".into()));
            }
            if prefix.chars().any(char::is_whitespace) {
                return Err(Error::InvalidConfig(format!(
                    "id prefix '{}' must not contain whitespace",
                    prefix
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::new();
        assert_eq!(config.shutdown, ShutdownPolicy::Drain);
        assert!(config.id_prefix.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("drain".parse::<ShutdownPolicy>().unwrap(), ShutdownPolicy::Drain);
        assert_eq!(" LEAK ".parse::<ShutdownPolicy>().unwrap(), ShutdownPolicy::Leak);
        assert!(matches!(
            "forget".parse::<ShutdownPolicy>(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_lookup() {
        let config =
            RegistryConfig::from_lookup(lookup_from(&[(SHUTDOWN_ENV, "leak"), (ID_PREFIX_ENV, "ui")]))
                .unwrap();
        assert_eq!(config.shutdown, ShutdownPolicy::Leak);
        assert_eq!(config.id_prefix.as_deref(), Some("ui"));

        let config = RegistryConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, RegistryConfig::default());

        let err = RegistryConfig::from_lookup(lookup_from(&[(SHUTDOWN_ENV, "later")]));
        assert!(err.is_err());
    }

    #[test]
    fn test_validate_prefix() {
        assert!(RegistryConfig::new().with_id_prefix("").validate().is_err());
        assert!(RegistryConfig::new().with_id_prefix("a b").validate().is_err());
        assert!(RegistryConfig::new().with_id_prefix("view").validate().is_ok());
    }

    #[test]
    fn test_serde_roundtrip_names() {
        let config = RegistryConfig::new().with_shutdown(ShutdownPolicy::Leak);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"leak\""));

        let parsed: RegistryConfig = serde_json::from_str(r#"{"shutdown":"drain"}"#).unwrap();
        assert_eq!(parsed.shutdown, ShutdownPolicy::Drain);
        assert!(parsed.id_prefix.is_none());
    }
}
