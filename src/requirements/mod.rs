//! Host requirements for native instances.
//!
//! Before native source is fetched, the interpreter, environment manager,
//! package manager and any required environment variables are checked in
//! that order. Unmet requirements are installed where an install command
//! is configured.

pub mod checker;
pub mod installer;
pub mod probe;
pub mod registry;
pub mod status;
pub mod version;

pub use checker::{check_environment_value, RequirementsChecker};
pub use installer::{install, InstallerContext};
pub use probe::EnvironmentProbe;
pub use registry::{Requirement, RequirementCheck, RequirementRegistry};
pub use status::{GapResult, RequirementStatus};
pub use version::{check_version, Version};

use crate::config::Settings;
use crate::error::Result;
use crate::ui::UserInterface;

/// Gate that native creation passes before touching the filesystem.
pub trait RequirementGate {
    /// Ensure every requirement is met, installing what is missing.
    fn ensure(&mut self, ui: &mut dyn UserInterface, interactive: bool) -> Result<()>;
}

/// Gate backed by real tool checks and shell installs.
pub struct HostRequirements {
    registry: RequirementRegistry,
    checker: RequirementsChecker,
    install_timeout: std::time::Duration,
}

impl HostRequirements {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let registry = RequirementRegistry::from_specs(&settings.effective_requirements())?;
        let checker = RequirementsChecker::new(EnvironmentProbe::run(), settings.timeouts.command());
        Ok(Self {
            registry,
            checker,
            install_timeout: settings.timeouts.setup(),
        })
    }

    /// Unmet requirements, without installing anything.
    pub fn gaps(&mut self) -> Vec<GapResult> {
        self.checker.check_all(&self.registry)
    }

    pub fn registry(&self) -> &RequirementRegistry {
        &self.registry
    }

    pub fn checker(&self) -> &RequirementsChecker {
        &self.checker
    }
}

impl RequirementGate for HostRequirements {
    fn ensure(&mut self, ui: &mut dyn UserInterface, interactive: bool) -> Result<()> {
        let run = installer::shell_context(self.install_timeout, interactive);
        let ctx = InstallerContext { run_command: &run };
        install(&self.registry, &mut self.checker, ui, interactive, &ctx)
    }
}
