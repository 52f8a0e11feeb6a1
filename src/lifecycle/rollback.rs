//! Undoing a partially completed create.
//!
//! Tracks what a create call has done so far (placed a directory,
//! registered a record) and removes exactly those things if a later step
//! fails. Nothing the call did not create is touched.

use crate::registry::InstanceRegistry;
use std::fs;
use std::path::PathBuf;

/// Record of a create call's side effects.
#[derive(Debug)]
pub struct CreationRollback {
    name: String,
    created_dir: Option<PathBuf>,
    registered: bool,
    enabled: bool,
}

impl CreationRollback {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_dir: None,
            registered: false,
            enabled: true,
        }
    }

    /// Keep everything on failure, for inspecting what went wrong.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// This call created `dir`.
    pub fn track_dir_created(&mut self, dir: impl Into<PathBuf>) {
        self.created_dir = Some(dir.into());
    }

    /// This call registered the instance.
    pub fn track_registered(&mut self) {
        self.registered = true;
    }

    /// Undo the tracked side effects. Failures are logged, not returned,
    /// so the error that triggered the rollback is the one reported.
    pub fn rollback(self, registry: &mut InstanceRegistry) {
        if !self.enabled {
            tracing::info!("Keeping partially created instance '{}'", self.name);
            return;
        }

        if self.registered {
            match registry.remove(&self.name) {
                Ok(_) => tracing::debug!("Unregistered '{}'", self.name),
                Err(e) => tracing::warn!("Could not unregister '{}': {}", self.name, e),
            }
        }

        if let Some(dir) = &self.created_dir {
            if dir.exists() {
                match fs::remove_dir_all(dir) {
                    Ok(()) => tracing::debug!("Removed {}", dir.display()),
                    Err(e) => tracing::warn!("Could not remove {}: {}", dir.display(), e),
                }
            }
        }
    }
}
