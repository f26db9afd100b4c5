//! Site settings: a key/value lookup with per-call defaults.
//!
//! Settings are resolved once per process into a [`SettingsMap`] and passed
//! to whoever needs them as `&dyn SettingsProvider`.

use std::collections::{BTreeMap, HashMap};

/// Well-known setting keys.
pub mod keys {
    pub const SITE_NAME: &str = "site_name";
    pub const SITE_DESCRIPTION: &str = "site_description";
    pub const MAINTENANCE_MODE: &str = "maintenance_mode";
    pub const MAINTENANCE_MESSAGE: &str = "maintenance_message";
    pub const FAVICON: &str = "favicon";
}

/// Key/value settings lookup.
pub trait SettingsProvider: Send + Sync {
    /// Return the value for `key`, or `default` when it is not set.
    fn get(&self, key: &str, default: &str) -> String;

    /// Interpret a setting as a boolean flag (`1`, `true`, `yes`, `on`).
    fn flag(&self, key: &str) -> bool {
        is_truthy(&self.get(key, ""))
    }
}

/// Whether a stored string should be read as "on".
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// In-memory settings snapshot.
#[derive(Debug, Clone, Default)]
pub struct SettingsMap {
    values: HashMap<String, String>,
}

impl SettingsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from config-file defaults.
    pub fn from_defaults(defaults: &BTreeMap<String, String>) -> Self {
        Self {
            values: defaults
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Layer `overrides` on top of the current values (later wins).
    pub fn overlay<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in overrides {
            self.values.insert(k.into(), v.into());
        }
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsProvider for SettingsMap {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}
