//! Stop command implementation.

use crate::cli::args::NameArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The stop command implementation.
pub struct StopCommand {
    context: CommandContext,
    args: NameArgs,
}

impl StopCommand {
    pub fn new(context: CommandContext, args: NameArgs) -> Self {
        Self { context, args }
    }
}

impl Command for StopCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let mut controller = self.context.controller(&settings)?;

        controller.stop(&self.args.name)?;
        ui.success(&format!("Stopped {}", self.args.name));
        Ok(CommandResult::success())
    }
}
