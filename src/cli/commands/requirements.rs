//! Requirements command implementation.
//!
//! Reports which native requirements are unmet without installing
//! anything. Exits 1 when there are gaps.

use crate::error::Result;
use crate::requirements::{EnvironmentProbe, HostRequirements};
use crate::ui::theme::{should_use_colors, BroodTheme};
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The requirements command implementation.
pub struct RequirementsCommand {
    context: CommandContext,
}

impl RequirementsCommand {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }
}

impl Command for RequirementsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let mut host = HostRequirements::from_settings(&settings)?;

        let theme = if should_use_colors() {
            BroodTheme::new()
        } else {
            BroodTheme::plain()
        };
        report_inactive_managers(host.checker().probe(), &theme, ui);

        let gaps = host.gaps();
        if gaps.is_empty() {
            ui.success(&format!(
                "All {} requirements are met",
                host.registry().len()
            ));
            return Ok(CommandResult::success());
        }

        for gap in &gaps {
            ui.warning(&format!("{}: {}", gap.requirement, gap.status));
            if let Some(requirement) = host.registry().get(&gap.requirement) {
                match (&requirement.install, &requirement.hint) {
                    (Some(install), _) => {
                        ui.message(&format!("    installs with `{}`", install))
                    }
                    (None, Some(hint)) => ui.message(&format!("    {}", hint)),
                    (None, None) => {}
                }
            }
        }
        Ok(CommandResult::failure(1))
    }
}

/// Version managers that are installed but not activated in this shell.
/// Checks still find their tools, but the instance's own commands may not.
fn report_inactive_managers(
    probe: &EnvironmentProbe,
    theme: &BroodTheme,
    ui: &mut dyn UserInterface,
) {
    for manager in probe.inactive_managers() {
        ui.warning(&format!(
            "{} is installed at {} but not active in this shell",
            manager.name,
            manager.install_path.display()
        ));
        ui.message(&format!(
            "    activate it with {}",
            theme.command.apply_to(&manager.activation)
        ));
    }
}
