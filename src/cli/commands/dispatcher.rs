//! Command dispatching.
//!
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::ui::UserInterface;

use super::context::CommandContext;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    ///
    /// Fatal conditions are returned as errors; a command that ran but
    /// has a negative answer (an instance that never answered, unmet
    /// requirements) returns a failing [`CommandResult`].
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    context: CommandContext,
}

impl CommandDispatcher {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Route the CLI subcommand to its implementation and execute it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = self.context.clone();
        match &cli.command {
            Commands::Create(args) => {
                let cmd = super::create::CreateCommand::new(ctx, args.clone());
                cmd.execute(ui)
            }
            Commands::Update(args) => {
                let cmd = super::update::UpdateCommand::new(ctx, args.clone());
                cmd.execute(ui)
            }
            Commands::Start(args) => {
                let cmd = super::start::StartCommand::start(ctx, args.clone());
                cmd.execute(ui)
            }
            Commands::Run(args) => {
                let cmd = super::start::StartCommand::run(ctx, args.clone());
                cmd.execute(ui)
            }
            Commands::Check(args) => {
                let cmd = super::check::CheckCommand::new(ctx, args.clone());
                cmd.execute(ui)
            }
            Commands::Stop(args) => {
                let cmd = super::stop::StopCommand::new(ctx, args.clone());
                cmd.execute(ui)
            }
            Commands::Status(args) => {
                let cmd = super::status::StatusCommand::new(ctx, args.clone());
                cmd.execute(ui)
            }
            Commands::List(args) => {
                let cmd = super::list::ListCommand::new(ctx, args.clone());
                cmd.execute(ui)
            }
            Commands::Remove(args) => {
                let cmd = super::remove::RemoveCommand::new(ctx, args.clone());
                cmd.execute(ui)
            }
            Commands::Requirements => {
                let cmd = super::requirements::RequirementsCommand::new(ctx);
                cmd.execute(ui)
            }
            Commands::Completions(args) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
        }
    }
}
