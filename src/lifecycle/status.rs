//! Observed instance status.

use crate::registry::Instance;
use std::fmt;

use super::strategy::{ExecutionStrategy, LaunchRecord};

/// What is known about an instance without contacting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceStatus {
    /// The instance directory no longer exists.
    Absent,
    /// Present, never started (or its launch record was cleared).
    Created,
    /// The launched process or container is alive.
    Running { port: u16 },
    /// Started before, but no longer alive.
    Stopped,
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceStatus::Absent => write!(f, "absent"),
            InstanceStatus::Created => write!(f, "created"),
            InstanceStatus::Running { port } => write!(f, "running on port {}", port),
            InstanceStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Derive an instance's status from disk and its launch record.
pub fn probe(instance: &Instance, strategy: &dyn ExecutionStrategy) -> InstanceStatus {
    if !instance.path.is_dir() {
        return InstanceStatus::Absent;
    }

    match LaunchRecord::load(&instance.path) {
        Ok(Some(launch)) if strategy.is_running(instance, &launch) => {
            InstanceStatus::Running { port: launch.port }
        }
        Ok(Some(_)) => InstanceStatus::Stopped,
        Ok(None) => InstanceStatus::Created,
        Err(e) => {
            tracing::debug!("Could not read launch record for {}: {}", instance.name, e);
            InstanceStatus::Created
        }
    }
}
