//! Instance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How an instance is run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceMode {
    /// Setup and start commands run directly on the host.
    #[default]
    Native,
    /// Built into an image and run as a container.
    Containerized,
}

impl fmt::Display for InstanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceMode::Native => write!(f, "native"),
            InstanceMode::Containerized => write!(f, "container"),
        }
    }
}

/// A registered instance.
///
/// The name is the identity: at most one record per name exists in the
/// registry at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    /// Absolute path of the instance's source tree.
    pub path: PathBuf,
    #[serde(default)]
    pub mode: InstanceMode,
    pub created_at: DateTime<Utc>,
    /// An existing checkout taken over in place, not fetched by brood.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub adopted: bool,
}

impl Instance {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, mode: InstanceMode) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            mode,
            created_at: Utc::now(),
            adopted: false,
        }
    }

    /// Mark the record as an adopted checkout.
    pub fn adopted(mut self) -> Self {
        self.adopted = true;
        self
    }
}
