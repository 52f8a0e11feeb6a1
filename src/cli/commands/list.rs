//! List command implementation.
//!
//! The `brood list` command shows every registered instance with its
//! current status.

use crate::cli::args::ListArgs;
use crate::error::Result;
use crate::ui::{Table, UserInterface};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    context: CommandContext,
    args: ListArgs,
}

impl ListCommand {
    pub fn new(context: CommandContext, args: ListArgs) -> Self {
        Self { context, args }
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let mut controller = self.context.controller(&settings)?;
        let statuses = controller.statuses()?;

        if self.args.json {
            let rows: Vec<_> = statuses
                .iter()
                .map(|(instance, status)| {
                    serde_json::json!({
                        "name": instance.name,
                        "path": instance.path,
                        "mode": instance.mode,
                        "status": status.to_string(),
                        "created_at": instance.created_at,
                    })
                })
                .collect();
            let json = serde_json::to_string_pretty(&rows)
                .map_err(|e| anyhow::anyhow!("Failed to serialize instances: {}", e))?;
            println!("{}", json);
            return Ok(CommandResult::success());
        }

        if statuses.is_empty() {
            ui.message("No instances. Create one with `brood create`.");
            return Ok(CommandResult::success());
        }

        let mut table = Table::new(&["name", "mode", "status", "path"]);
        for (instance, status) in &statuses {
            table.add_row([
                instance.name.clone(),
                instance.mode.to_string(),
                status.to_string(),
                instance.path.display().to_string(),
            ]);
        }
        ui.message(&table.render());

        Ok(CommandResult::success())
    }
}
