//! Remembered toggle preferences.
//!
//! Storage belongs to the host (browser storage, a file, ...); the engine
//! only needs string get/set/remove.

use crate::state::TogglePolicy;
use mirage_core::{EndpointSelector, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Key the controller stores toggle preferences under
pub const TOGGLES_PREFERENCE_KEY: &str = "mirage.toggles";

/// String key-value storage supplied by the host.
pub trait PreferenceStore: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    /// Returns an error if the backing store fails
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value
    ///
    /// # Errors
    /// Returns an error if the backing store fails
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Delete a value
    ///
    /// # Errors
    /// Returns an error if the backing store fails
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.values
            .lock()
            .map(|values| values.get(key).cloned())
            .map_err(|err| Error::Other(format!("Lock poisoned: {err}")))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.values
            .lock()
            .map(|mut values| {
                values.insert(key.to_owned(), value);
            })
            .map_err(|err| Error::Other(format!("Lock poisoned: {err}")))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .map(|mut values| {
                values.remove(key);
            })
            .map_err(|err| Error::Other(format!("Lock poisoned: {err}")))
    }
}

/// One stored toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleEntry {
    /// Endpoint key or path fragment
    pub selector: EndpointSelector,
    /// Whether the endpoint is mocked
    pub enabled: bool,
}

/// Toggle policy and toggles as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TogglePreferences {
    /// Policy in force
    pub policy: TogglePolicy,
    /// Explicit toggles
    #[serde(default)]
    pub toggles: Vec<ToggleEntry>,
}

impl TogglePreferences {
    /// Capture preferences from policy and toggles
    pub fn new(policy: TogglePolicy, toggles: &BTreeMap<EndpointSelector, bool>) -> Self {
        Self {
            policy,
            toggles: toggles
                .iter()
                .map(|(selector, enabled)| ToggleEntry {
                    selector: selector.clone(),
                    enabled: *enabled,
                })
                .collect(),
        }
    }

    /// Toggles as a map
    pub fn toggle_map(&self) -> BTreeMap<EndpointSelector, bool> {
        self.toggles
            .iter()
            .map(|entry| (entry.selector.clone(), entry.enabled))
            .collect()
    }
}
