//! Remove command implementation.
//!
//! `brood remove <name>` forgets an instance. Its directory is deleted only
//! with `--purge`, after confirmation when running interactively.

use crate::cli::args::RemoveArgs;
use crate::error::Result;
use crate::ui::{Prompt, PromptType, UserInterface};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The remove command implementation.
pub struct RemoveCommand {
    context: CommandContext,
    args: RemoveArgs,
}

impl RemoveCommand {
    pub fn new(context: CommandContext, args: RemoveArgs) -> Self {
        Self { context, args }
    }
}

impl Command for RemoveCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let mut controller = self.context.controller(&settings)?;
        let instance = controller.registry().get(&self.args.name)?;

        if self.args.purge && !self.args.yes && ui.is_interactive() {
            let confirmed = ui
                .prompt(&Prompt {
                    key: format!("purge_{}", instance.name),
                    question: format!("Delete {} and everything in it?", instance.path.display()),
                    prompt_type: PromptType::Confirm,
                    default: Some("no".to_string()),
                })?
                .as_bool()
                .unwrap_or(false);
            if !confirmed {
                ui.message("Nothing removed");
                return Ok(CommandResult::failure(1));
            }
        }

        let removed = controller.remove(&instance.name, self.args.purge, ui)?;
        ui.success(&format!("Removed {}", removed.name));
        Ok(CommandResult::success())
    }
}
