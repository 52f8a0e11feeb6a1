//! Shared state for commands.

use std::path::{Path, PathBuf};

use crate::config::{state_home, Settings};
use crate::error::Result;
use crate::lifecycle::LifecycleController;
use crate::registry::{FileStore, InstanceRegistry};

/// Where commands read settings and the registry from, and the directory
/// they were invoked in.
#[derive(Debug, Clone)]
pub struct CommandContext {
    home: PathBuf,
    cwd: PathBuf,
}

impl CommandContext {
    pub fn new(home: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            cwd: cwd.into(),
        }
    }

    /// `$BROOD_HOME` (or `~/.brood`) and the process working directory.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(state_home(), std::env::current_dir()?))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Settings file plus `BROOD_*` overrides.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(&self.home)?;
        settings.apply_env(|key| std::env::var(key));
        tracing::debug!("Loaded settings from {}", self.home.display());
        Ok(settings)
    }

    pub fn registry(&self) -> InstanceRegistry {
        InstanceRegistry::new(Box::new(FileStore::in_home(&self.home)))
    }

    pub fn controller(&self, settings: &Settings) -> Result<LifecycleController> {
        LifecycleController::new(settings, &self.home, &self.cwd, self.registry())
    }
}
