//! Command-line interface for Brood.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    CheckArgs, Cli, Commands, CompletionsArgs, CreateArgs, ListArgs, NameArgs, RemoveArgs,
    SourceArgs, StartArgs, UpdateArgs,
};
pub use commands::{Command, CommandContext, CommandDispatcher, CommandResult};
