//! The instance registry.
//!
//! A single list of [`Instance`] records stored under the `instances` key
//! of a [`KeyValueStore`]. The list is loaded lazily on first access and
//! re-read from the store before every mutation, so two `brood` processes
//! never overwrite each other's additions with a stale copy. Every
//! mutation is flushed before it returns.

pub mod instance;
pub mod store;

pub use instance::{Instance, InstanceMode};
pub use store::{write_yaml_atomic, FileStore, KeyValueStore, MemoryStore, REGISTRY_FILE};

use crate::error::{BroodError, Result};

/// Store key holding the instance list.
pub const INSTANCES_KEY: &str = "instances";

/// Durable, name-unique set of instance records.
pub struct InstanceRegistry {
    store: Box<dyn KeyValueStore>,
    cache: Option<Vec<Instance>>,
}

impl InstanceRegistry {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store, cache: None }
    }

    /// Registry kept in memory only.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// All records, in insertion order.
    pub fn list(&mut self) -> Result<Vec<Instance>> {
        if self.cache.is_none() {
            self.cache = Some(self.read()?);
        }
        Ok(self.cache.clone().unwrap_or_default())
    }

    pub fn find_by_name(&mut self, name: &str) -> Result<Option<Instance>> {
        Ok(self.list()?.into_iter().find(|i| i.name == name))
    }

    /// Like [`find_by_name`](Self::find_by_name), but a missing record is an error.
    pub fn get(&mut self, name: &str) -> Result<Instance> {
        self.find_by_name(name)?
            .ok_or_else(|| BroodError::InstanceNotFound {
                name: name.to_string(),
            })
    }

    /// Add a record. Fails if its name is taken.
    pub fn add(&mut self, instance: Instance) -> Result<()> {
        let mut records = self.read()?;
        if records.iter().any(|i| i.name == instance.name) {
            self.cache = Some(records);
            return Err(BroodError::InstanceExists {
                name: instance.name,
            });
        }

        tracing::debug!("Registering instance '{}'", instance.name);
        records.push(instance);
        self.write(records)
    }

    /// Remove a record by name, returning it.
    pub fn remove(&mut self, name: &str) -> Result<Instance> {
        let mut records = self.read()?;
        let Some(index) = records.iter().position(|i| i.name == name) else {
            self.cache = Some(records);
            return Err(BroodError::InstanceNotFound {
                name: name.to_string(),
            });
        };

        tracing::debug!("Unregistering instance '{}'", name);
        let removed = records.remove(index);
        self.write(records)?;
        Ok(removed)
    }

    /// First `<prefix>-<n>` (n from 1) not already registered.
    pub fn next_free_name(&mut self, prefix: &str) -> Result<String> {
        self.next_free_name_where(prefix, |_| false)
    }

    /// First `<prefix>-<n>` that is neither registered nor `also_taken`.
    pub fn next_free_name_where<F>(&mut self, prefix: &str, also_taken: F) -> Result<String>
    where
        F: Fn(&str) -> bool,
    {
        let records = self.list()?;
        let name = (1..)
            .map(|n| format!("{}-{}", prefix, n))
            .find(|candidate| {
                !records.iter().any(|i| &i.name == candidate) && !also_taken(candidate)
            })
            .unwrap_or_else(|| prefix.to_string());
        Ok(name)
    }

    fn read(&self) -> Result<Vec<Instance>> {
        match self.store.get(INSTANCES_KEY)? {
            None | Some(serde_yaml::Value::Null) => Ok(Vec::new()),
            Some(value) => {
                serde_yaml::from_value(value).map_err(|e| BroodError::ConfigValidationError {
                    message: format!("Malformed instance registry: {}", e),
                })
            }
        }
    }

    fn write(&mut self, records: Vec<Instance>) -> Result<()> {
        let value =
            serde_yaml::to_value(&records).map_err(|e| BroodError::ConfigValidationError {
                message: format!("Failed to serialize instance registry: {}", e),
            })?;
        self.store.set(INSTANCES_KEY, value)?;
        self.cache = Some(records);
        Ok(())
    }
}
