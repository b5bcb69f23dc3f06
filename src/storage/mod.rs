//! Key-value persistence used by the settlement session.
//!
//! Values are opaque strings (JSON documents in practice). Backends only need
//! to get, put and delete by key.

pub mod json_backend;

use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::{Result, SettlementError};

pub use json_backend::JsonFileStore;

/// Store key holding the unit roster.
pub const UNIT_NAMES_KEY: &str = "unit_names";
/// Store key holding the settlement history.
pub const HISTORY_KEY: &str = "calc_history";

/// Abstraction over durable string stores.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// Volatile store, mostly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SettlementError::Storage("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SettlementError::Storage("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SettlementError::Storage("memory store lock poisoned".into()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Reads and decodes a JSON value, `None` when the key is absent.
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: serde::de::DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: serde::Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string_pretty(value)?;
    store.put(key, &raw)
}
