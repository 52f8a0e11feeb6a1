//! Instance lifecycle: create, update, start, check and run.
//!
//! [`LifecycleController`] drives every operation. How an instance is
//! configured and launched depends on its mode, and is delegated to an
//! [`ExecutionStrategy`]: [`NativeStrategy`] runs the target's own setup and
//! start commands on the host, [`ContainerStrategy`] builds and runs an
//! image.

pub mod container;
pub mod controller;
pub mod health;
pub mod manifest;
pub mod native;
pub mod rollback;
pub mod status;
pub mod strategy;

pub use container::ContainerStrategy;
pub use controller::{CreateOptions, LifecycleController, UpdateOptions};
pub use health::{Endpoint, HealthProbe};
pub use manifest::{is_target_checkout, read_manifest, Manifest};
pub use native::NativeStrategy;
pub use rollback::CreationRollback;
pub use status::InstanceStatus;
pub use strategy::{ExecutionStrategy, LaunchRecord};
