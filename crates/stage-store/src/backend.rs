// backend.rs — Backend trait and the built-in persistence backends.
//
// A Backend persists whole trees keyed by store identifier. Stores never
// persist a sub-namespace on its own: commit always hands over the entire
// committed root.
//
// Two implementations ship with the crate:
// - MemoryBackend: JSON text in a string key/value map (the default).
// - JsonFileBackend: one JSON file per identifier, `<dir>/<id>.json`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::StoreError;

/// Load/save collaborator for a store.
///
/// `load` must return a value the caller owns outright (nothing the caller
/// later mutates may reach backend storage), or an empty mapping when no
/// data exists for `id`. `save` must persist `tree` so that a later `load`
/// of the same `id` returns an equal tree.
pub trait Backend {
    /// Load the persisted tree for `id`.
    fn load(&self, id: &str) -> Result<Value, StoreError>;

    /// Persist `tree` under `id`, replacing anything stored before.
    fn save(&self, id: &str, tree: &Value) -> Result<(), StoreError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

impl<B: Backend + ?Sized> Backend for Rc<B> {
    fn load(&self, id: &str) -> Result<Value, StoreError> {
        (**self).load(id)
    }

    fn save(&self, id: &str, tree: &Value) -> Result<(), StoreError> {
        (**self).save(id, tree)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn load(&self, id: &str) -> Result<Value, StoreError> {
        (**self).load(id)
    }

    fn save(&self, id: &str, tree: &Value) -> Result<(), StoreError> {
        (**self).save(id, tree)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

fn empty_tree() -> Value {
    Value::Object(Map::new())
}

/// In-process string key/value backend.
///
/// Trees are held as JSON text, so every load parses a fresh value and no
/// caller can reach the stored copy.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored JSON text for `id`, if any.
    pub fn raw(&self, id: &str) -> Option<String> {
        self.entries.borrow().get(id).cloned()
    }

    /// Seed `id` with JSON text (not validated until the next load).
    pub fn insert_raw(&self, id: impl Into<String>, text: impl Into<String>) {
        self.entries.borrow_mut().insert(id.into(), text.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Backend for MemoryBackend {
    fn load(&self, id: &str) -> Result<Value, StoreError> {
        match self.entries.borrow().get(id) {
            Some(text) => Ok(serde_json::from_str(text)?),
            None => Ok(empty_tree()),
        }
    }

    fn save(&self, id: &str, tree: &Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(tree)?;
        tracing::debug!(id, bytes = text.len(), "MemoryBackend: save");
        self.entries.borrow_mut().insert(id.to_string(), text);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// JSON file backend: one pretty-printed file per store identifier.
///
/// Writes land in a temp file in the same directory and are renamed into
/// place, so a failed save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::IoError {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Path to the JSON file for `id`. Rejects identifiers that would
    /// escape the backend directory.
    pub fn file_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
            return Err(StoreError::InvalidIdentifier { id: id.to_string() });
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

impl Backend for JsonFileBackend {
    fn load(&self, id: &str) -> Result<Value, StoreError> {
        let path = self.file_for(id)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(empty_tree()),
            Err(source) => return Err(StoreError::IoError { path, source }),
        };
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&self, id: &str, tree: &Value) -> Result<(), StoreError> {
        let path = self.file_for(id)?;
        let json = serde_json::to_string_pretty(tree)?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|source| StoreError::IoError {
                path: self.dir.clone(),
                source,
            })?;
        tmp.write_all(json.as_bytes())
            .map_err(|source| StoreError::IoError {
                path: tmp.path().to_path_buf(),
                source,
            })?;
        tmp.persist(&path).map_err(|e| StoreError::IoError {
            path: path.clone(),
            source: e.error,
        })?;

        tracing::debug!(id, path = %path.display(), "JsonFileBackend: save");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
