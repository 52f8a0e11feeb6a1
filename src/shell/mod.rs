//! Shell command execution and detached processes.

pub mod command;
pub mod platform;
pub mod process;

pub use command::{execute, execute_program, CommandOptions, CommandResult};
pub use platform::is_ci;
pub use process::{is_process_alive, spawn_detached, terminate};
