//! Status command implementation.
//!
//! The `brood status <name>` command shows what is known about one instance.

use crate::cli::args::NameArgs;
use crate::error::Result;
use crate::lifecycle::{InstanceStatus, LaunchRecord};
use crate::ui::theme::BroodTheme;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The status command implementation.
pub struct StatusCommand {
    context: CommandContext,
    args: NameArgs,
}

impl StatusCommand {
    pub fn new(context: CommandContext, args: NameArgs) -> Self {
        Self { context, args }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let mut controller = self.context.controller(&settings)?;
        let (instance, status) = controller.status(&self.args.name)?;
        let theme = BroodTheme::new();

        ui.show_header(&instance.name);
        let styled_status = match status {
            InstanceStatus::Running { .. } => theme.running.apply_to(status.to_string()),
            InstanceStatus::Absent => theme.warning.apply_to(status.to_string()),
            _ => theme.dim.apply_to(status.to_string()),
        };
        ui.message(&format!("  {} {}", theme.key.apply_to("Status: "), styled_status));
        ui.message(&format!("  {} {}", theme.key.apply_to("Mode:   "), instance.mode));
        ui.message(&format!(
            "  {} {}",
            theme.key.apply_to("Path:   "),
            instance.path.display()
        ));
        ui.message(&format!(
            "  {} {}",
            theme.key.apply_to("Created:"),
            instance.created_at.format("%Y-%m-%d %H:%M")
        ));

        if let Ok(Some(launch)) = LaunchRecord::load(&instance.path) {
            ui.message(&format!(
                "  {} {} on port {}",
                theme.key.apply_to("Started:"),
                launch.started_at.format("%Y-%m-%d %H:%M"),
                launch.port
            ));
        }

        if status == InstanceStatus::Absent {
            ui.warning(&format!(
                "{} no longer exists; `brood remove {}` forgets it",
                instance.path.display(),
                instance.name
            ));
        }

        Ok(CommandResult::success())
    }
}
