//! Key-value persistence for the registry.
//!
//! The registry only needs `get`/`set` of YAML values by key. [`FileStore`]
//! keeps them in a single YAML mapping on disk; [`MemoryStore`] keeps them
//! in memory for tests.

use crate::error::{BroodError, Result};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the registry file inside the state directory.
pub const REGISTRY_FILE: &str = "registry.yml";

/// Durable key-value storage.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`. Durable once this returns.
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
}

/// Store backed by a YAML file, re-read on every access.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The registry file in a state directory.
    pub fn in_home(home: &Path) -> Self {
        Self::new(home.join(REGISTRY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_mapping(&self) -> Result<Mapping> {
        if !self.path.exists() {
            return Ok(Mapping::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Mapping::new());
        }

        serde_yaml::from_str(&content).map_err(|e| BroodError::ConfigParseError {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_mapping()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let mut mapping = self.read_mapping()?;
        mapping.insert(Value::String(key.to_string()), value);
        write_yaml_atomic(&self.path, &mapping)
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Serialize `value` to `path` with the write-to-temp-then-rename pattern.
///
/// The temp file is synced before the rename, so after a crash the file
/// holds either the previous or the new content, never a mix.
pub fn write_yaml_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let content = serde_yaml::to_string(value).map_err(|e| BroodError::ConfigValidationError {
        message: format!("Failed to serialize {}: {}", path.display(), e),
    })?;

    let temp_path = path.with_extension("yml.tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}
