//! Check command implementation.

use crate::cli::args::CheckArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The check command implementation.
///
/// Exits 0 when the instance answers within the health timeout and 1
/// otherwise.
pub struct CheckCommand {
    context: CommandContext,
    args: CheckArgs,
}

impl CheckCommand {
    pub fn new(context: CommandContext, args: CheckArgs) -> Self {
        Self { context, args }
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let mut controller = self.context.controller(&settings)?;

        let mut spinner = ui.start_spinner(&format!("Checking {}", self.args.name));
        if controller.check(&self.args.name, self.args.port)? {
            spinner.finish_success(&format!("{} is answering", self.args.name));
            Ok(CommandResult::success())
        } else {
            spinner.finish_error(&format!(
                "{} did not answer within {}s",
                self.args.name,
                settings.timeouts.health().as_secs()
            ));
            Ok(CommandResult::failure(1))
        }
    }
}
