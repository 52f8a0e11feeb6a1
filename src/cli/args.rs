//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Brood - create and run isolated instances of an application.
#[derive(Debug, Parser)]
#[command(name = "brood")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new instance
    #[command(disable_version_flag = true)]
    Create(CreateArgs),

    /// Fetch new source into an instance and configure it again
    ///
    /// The fetched tree is copied over the existing one, so files deleted
    /// upstream are left in place. Instances created from an existing
    /// checkout are not updated; use git in that checkout instead.
    #[command(disable_version_flag = true)]
    Update(UpdateArgs),

    /// Start an instance in the background
    Start(StartArgs),

    /// Wait until an instance answers
    Check(CheckArgs),

    /// Start an instance and wait until it answers
    Run(StartArgs),

    /// Stop a started instance
    Stop(NameArgs),

    /// Show an instance's status
    Status(NameArgs),

    /// List instances
    List(ListArgs),

    /// Unregister an instance
    Remove(RemoveArgs),

    /// Report unmet host requirements without installing anything
    Requirements,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Which source to fetch.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SourceArgs {
    /// Release tag to fetch
    #[arg(long = "version", value_name = "TAG")]
    pub tag: Option<String>,

    /// Fetch the development branch
    #[arg(long)]
    pub develop: bool,

    /// Download an archive even when git is available
    #[arg(long)]
    pub no_git: bool,

    /// Ask before installing missing requirements
    #[arg(long)]
    pub interactive: bool,
}

/// Arguments for the `create` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CreateArgs {
    /// Instance name (default: <tool>-<n>)
    #[arg(long)]
    pub name: Option<String>,

    /// Directory to create the instance in
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Build and run the instance in a container
    #[arg(long)]
    pub container: bool,

    /// Keep the directory and registration when configuration fails
    #[arg(long)]
    pub keep_on_failure: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for the `update` command.
#[derive(Debug, Clone, clap::Args)]
pub struct UpdateArgs {
    /// Instance name
    pub name: String,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for the `start` and `run` commands.
#[derive(Debug, Clone, clap::Args)]
pub struct StartArgs {
    /// Instance name
    pub name: String,

    /// Port to listen on (default from settings)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CheckArgs {
    /// Instance name
    pub name: String,

    /// Port to probe (default: the port it was started on)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for commands that only take an instance name.
#[derive(Debug, Clone, clap::Args)]
pub struct NameArgs {
    /// Instance name
    pub name: String,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `remove` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RemoveArgs {
    /// Instance name
    pub name: String,

    /// Also delete the instance directory
    #[arg(long)]
    pub purge: bool,

    /// Do not ask before deleting
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
