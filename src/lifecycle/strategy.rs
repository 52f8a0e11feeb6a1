//! Execution strategies and launch records.
//!
//! An instance is configured and run either natively on the host or as a
//! container. Each mode is an [`ExecutionStrategy`]; the controller picks
//! one from the instance's recorded mode. A successful start leaves a
//! [`LaunchRecord`] inside the instance tree, which later status, check and
//! stop calls read back.

use crate::error::Result;
use crate::registry::{write_yaml_atomic, Instance, InstanceMode};
use crate::ui::UserInterface;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Per-instance state directory, inside the instance tree.
pub const STATE_DIR: &str = ".brood";

/// Launch record file inside [`STATE_DIR`].
pub const LAUNCH_FILE: &str = "launch.yml";

/// Output of native setup and start commands, inside [`STATE_DIR`].
pub const LOG_FILE: &str = "instance.log";

/// Mode-specific configure, start and stop.
pub trait ExecutionStrategy {
    fn mode(&self) -> InstanceMode;

    /// Prepare a freshly placed (or updated) source tree to run.
    fn configure(&self, instance: &Instance, ui: &mut dyn UserInterface) -> Result<()>;

    /// Launch the instance in the background, listening on `port`.
    fn start(&self, instance: &Instance, port: u16) -> Result<LaunchRecord>;

    /// Whether what `launch` describes is still running.
    fn is_running(&self, instance: &Instance, launch: &LaunchRecord) -> bool;

    /// Stop what `launch` describes.
    fn stop(&self, instance: &Instance, launch: &LaunchRecord) -> Result<()>;
}

/// What was launched, and where it listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    pub port: u16,
    pub started_at: DateTime<Utc>,
}

impl LaunchRecord {
    pub fn process(pid: u32, port: u16) -> Self {
        Self {
            pid: Some(pid),
            container: None,
            port,
            started_at: Utc::now(),
        }
    }

    pub fn container(id: impl Into<String>, port: u16) -> Self {
        Self {
            pid: None,
            container: Some(id.into()),
            port,
            started_at: Utc::now(),
        }
    }

    pub fn file(instance_path: &Path) -> PathBuf {
        instance_path.join(STATE_DIR).join(LAUNCH_FILE)
    }

    /// Read the record of the last start, if any.
    pub fn load(instance_path: &Path) -> Result<Option<Self>> {
        let path = Self::file(instance_path);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        match serde_yaml::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, instance_path: &Path) -> Result<()> {
        write_yaml_atomic(&Self::file(instance_path), self)
    }

    /// Forget the last start.
    pub fn clear(instance_path: &Path) -> Result<()> {
        let path = Self::file(instance_path);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Log file for an instance's native commands.
pub fn log_file(instance_path: &Path) -> PathBuf {
    instance_path.join(STATE_DIR).join(LOG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let record = LaunchRecord::process(4242, 8080);

        record.save(temp.path()).unwrap();

        assert_eq!(LaunchRecord::load(temp.path()).unwrap(), Some(record));
        assert!(temp.path().join(".brood/launch.yml").exists());
    }

    #[test]
    fn load_without_record_is_none() {
        let temp = TempDir::new().unwrap();
        assert_eq!(LaunchRecord::load(temp.path()).unwrap(), None);
    }

    #[test]
    fn unreadable_record_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(STATE_DIR)).unwrap();
        fs::write(LaunchRecord::file(temp.path()), "port: [").unwrap();

        assert_eq!(LaunchRecord::load(temp.path()).unwrap(), None);
    }

    #[test]
    fn clear_removes_record() {
        let temp = TempDir::new().unwrap();
        LaunchRecord::container("abc123", 3000)
            .save(temp.path())
            .unwrap();

        LaunchRecord::clear(temp.path()).unwrap();
        LaunchRecord::clear(temp.path()).unwrap();

        assert_eq!(LaunchRecord::load(temp.path()).unwrap(), None);
    }

    #[test]
    fn container_record_omits_pid() {
        let yaml = serde_yaml::to_string(&LaunchRecord::container("abc", 3000)).unwrap();
        assert!(!yaml.contains("pid"));
        assert!(yaml.contains("container: abc"));
    }
}
