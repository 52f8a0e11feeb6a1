//! Update command implementation.

use crate::cli::args::UpdateArgs;
use crate::error::Result;
use crate::lifecycle::UpdateOptions;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The update command implementation.
pub struct UpdateCommand {
    context: CommandContext,
    args: UpdateArgs,
}

impl UpdateCommand {
    pub fn new(context: CommandContext, args: UpdateArgs) -> Self {
        Self { context, args }
    }
}

impl Command for UpdateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let mut controller = self.context.controller(&settings)?;

        let options = UpdateOptions {
            version: self.args.source.tag.clone(),
            develop: self.args.source.develop,
            use_git: !self.args.source.no_git,
            interactive: self.args.source.interactive,
        };
        let instance = controller.update(&self.args.name, &options, ui)?;

        ui.success(&format!("Updated {}", instance.name));
        Ok(CommandResult::success())
    }
}
