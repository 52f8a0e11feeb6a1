//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed to by
//! [`CommandDispatcher`]. Commands that touch instances build a
//! [`LifecycleController`](crate::lifecycle::LifecycleController) from the
//! shared [`CommandContext`].

pub mod check;
pub mod completions;
pub mod context;
pub mod create;
pub mod dispatcher;
pub mod list;
pub mod remove;
pub mod requirements;
pub mod start;
pub mod status;
pub mod stop;
pub mod update;

pub use context::CommandContext;
pub use dispatcher::{Command, CommandDispatcher, CommandResult};
