use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use crate::error::AbsenError;

pub const KEY_NOTIFICATION_ENABLED: &str = "notification_enabled";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Text(String),
}

/// One change in a batch applied by [`Preferences::apply`].
#[derive(Debug, Clone)]
pub enum PrefEdit {
    Put(String, PrefValue),
    Remove(String),
}

impl PrefEdit {
    pub fn text(key: &str, value: impl Into<String>) -> Self {
        PrefEdit::Put(key.to_string(), PrefValue::Text(value.into()))
    }

    pub fn flag(key: &str, value: bool) -> Self {
        PrefEdit::Put(key.to_string(), PrefValue::Bool(value))
    }

    pub fn remove(key: &str) -> Self {
        PrefEdit::Remove(key.to_string())
    }
}

/// Small local key-value store. A batch passed to `apply` lands as a unit.
pub trait Preferences: Send + Sync {
    fn get(&self, key: &str) -> Option<PrefValue>;

    fn apply(&self, edits: Vec<PrefEdit>) -> Result<(), AbsenError>;

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            PrefValue::Text(s) => Some(s),
            PrefValue::Bool(_) => None,
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(PrefValue::Bool(b)) => b,
            _ => default,
        }
    }

    fn notifications_enabled(&self) -> bool {
        self.get_bool(KEY_NOTIFICATION_ENABLED, true)
    }
}

/// Preferences held in memory and, when opened with a path, mirrored to a
/// JSON file after every batch.
pub struct LocalPreferences {
    path: Option<PathBuf>,
    values: RwLock<BTreeMap<String, PrefValue>>,
}

impl LocalPreferences {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load from `path`; a missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AbsenError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| AbsenError::Storage(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(AbsenError::Storage(format!("{}: {}", path.display(), e))),
        };

        Ok(Self {
            path: Some(path),
            values: RwLock::new(values),
        })
    }

    fn persist(&self, values: &BTreeMap<String, PrefValue>) -> Result<(), AbsenError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| AbsenError::Storage(e.to_string()))?;
        }

        let json = serde_json::to_vec_pretty(values).map_err(|e| AbsenError::Storage(e.to_string()))?;
        // write-then-rename
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| AbsenError::Storage(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| AbsenError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl Preferences for LocalPreferences {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn apply(&self, edits: Vec<PrefEdit>) -> Result<(), AbsenError> {
        let mut values = self
            .values
            .write()
            .map_err(|_| AbsenError::Storage("preferences lock poisoned".into()))?;

        let mut next = values.clone();
        for edit in edits {
            match edit {
                PrefEdit::Put(key, value) => {
                    next.insert(key, value);
                }
                PrefEdit::Remove(key) => {
                    next.remove(&key);
                }
            }
        }

        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}
