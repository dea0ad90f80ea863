use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SharkError};

/// A small durable store of named JSON slots.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Reads `key` as `T`. A slot that exists but does not decode is reported as
/// an error, not as `None`.
pub fn get_typed<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(value) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_value::<T>(value)
        .map(Some)
        .map_err(|error| SharkError::Store(format!("Failed to decode slot \"{key}\": {error}")))
}

pub fn set_typed<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)
        .map_err(|error| SharkError::Store(format!("Failed to encode slot \"{key}\": {error}")))?;
    store.set(key, value)
}

/// Slots kept in one JSON object file, rewritten atomically on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_slots(&self) -> Result<BTreeMap<String, Value>> {
        if !self.path.is_file() {
            return Ok(BTreeMap::new());
        }

        let raw = fs::read_to_string(&self.path).map_err(|error| SharkError::io(&self.path, error))?;
        match serde_json::from_str::<BTreeMap<String, Value>>(&raw) {
            Ok(slots) => Ok(slots),
            Err(error) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %error,
                    "preference file is corrupt; starting from empty slots"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_slots(&self, slots: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| SharkError::io(parent, error))?;
        }

        let body = serde_json::to_string_pretty(slots)
            .map_err(|error| SharkError::Store(format!("Failed to serialize preferences: {error}")))?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, format!("{body}\n"))
            .map_err(|error| SharkError::io(&temp_path, error))?;
        fs::rename(&temp_path, &self.path).map_err(|error| SharkError::io(&self.path, error))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| SharkError::Store("Preference store lock poisoned".to_string()))?;
        Ok(self.read_slots()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| SharkError::Store("Preference store lock poisoned".to_string()))?;
        let mut slots = self.read_slots()?;
        slots.insert(key.to_string(), value);
        self.write_slots(&slots)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| SharkError::Store("Preference store lock poisoned".to_string()))?;
        let mut slots = self.read_slots()?;
        if slots.remove(key).is_some() {
            self.write_slots(&slots)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Value>>> {
        self.slots
            .lock()
            .map_err(|_| SharkError::Store("Preference store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.slots()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.slots()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.slots()?.remove(key);
        Ok(())
    }
}
