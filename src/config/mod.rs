//! Settings for brood.
//!
//! All settings come from a single YAML file in the state directory,
//! with a handful of `BROOD_*` environment overrides applied on top.
//!
//! # Example
//!
//! ```
//! use brood::config::Settings;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("config.yml"), "target:\n  tool_name: forge\n").unwrap();
//!
//! let settings = Settings::load(temp.path()).unwrap();
//! assert_eq!(settings.target.tool_name, "forge");
//! ```

pub mod settings;

pub use settings::{
    default_requirements, parse_settings, state_home, RequirementRole, RequirementSpec, Settings,
    TargetProfile, Timeouts, HOME_ENV, SETTINGS_FILE,
};
