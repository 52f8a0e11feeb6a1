//! Start and run command implementations.
//!
//! `brood start` launches an instance and returns. `brood run` also waits
//! for it to answer and fails if it never does.

use crate::cli::args::StartArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The start and run command implementation.
pub struct StartCommand {
    context: CommandContext,
    args: StartArgs,
    wait_until_healthy: bool,
}

impl StartCommand {
    pub fn start(context: CommandContext, args: StartArgs) -> Self {
        Self {
            context,
            args,
            wait_until_healthy: false,
        }
    }

    pub fn run(context: CommandContext, args: StartArgs) -> Self {
        Self {
            context,
            args,
            wait_until_healthy: true,
        }
    }
}

impl Command for StartCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let mut controller = self.context.controller(&settings)?;

        let launch = if self.wait_until_healthy {
            controller.run(&self.args.name, self.args.port, ui)?
        } else {
            controller.start(&self.args.name, self.args.port, ui)?
        };

        if let Some(pid) = launch.pid {
            tracing::debug!("{} has pid {}", self.args.name, pid);
        }
        if let Some(container) = &launch.container {
            tracing::debug!("{} runs in container {}", self.args.name, container);
        }
        Ok(CommandResult::success())
    }
}
