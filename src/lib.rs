//! Brood - create and run isolated instances of an application.
//!
//! Brood fetches an application's source (git clone or archive download),
//! places it in its own directory, records it in a small registry and
//! configures it, either natively on the host or as a container image.
//! Instances can then be started, health-checked, stopped and removed.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings loading and environment overrides
//! - [`error`] - Error types and result aliases
//! - [`lifecycle`] - Create, update, start, check and run
//! - [`registry`] - Durable instance records
//! - [`requirements`] - Host tool checks and installs for native instances
//! - [`shell`] - Bounded subprocess execution and detached processes
//! - [`source`] - Source acquisition and placement
//! - [`ui`] - Prompts, spinners, and terminal output
//!
//! # Example
//!
//! ```
//! use brood::registry::{Instance, InstanceMode, InstanceRegistry};
//!
//! let mut registry = InstanceRegistry::in_memory();
//! registry
//!     .add(Instance::new("forge-1", "/srv/forge-1", InstanceMode::Native))
//!     .unwrap();
//!
//! assert!(registry.add(Instance::new("forge-1", "/elsewhere", InstanceMode::Native)).is_err());
//! assert_eq!(registry.next_free_name("forge").unwrap(), "forge-2");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod requirements;
pub mod shell;
pub mod source;
pub mod ui;

pub use error::{BroodError, Result};
