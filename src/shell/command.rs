//! Shell command execution.

use crate::error::{BroodError, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Both streams joined, trimmed.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout.trim().to_string();
        let err = self.stderr.trim();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }

    /// Last non-empty line of stderr, for error messages.
    pub fn last_error_line(&self) -> Option<&str> {
        self.stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,

    /// Kill the command after this long (None = no timeout).
    pub timeout: Option<Duration>,

    /// Read stdin from the terminal and stay in its foreground process
    /// group, so the command can prompt (e.g. for a `sudo` password).
    pub interactive: bool,
}

impl CommandOptions {
    /// Capture both streams and stop after `timeout`.
    pub fn captured(timeout: Duration) -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            timeout: Some(timeout),
            ..Default::default()
        }
    }

    pub fn in_dir(mut self, cwd: &Path) -> Self {
        self.cwd = Some(cwd.to_path_buf());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }
}

/// Execute a shell command line.
pub fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let mut cmd = shell_command(command);
    run(&mut cmd, command, options)
}

/// Execute a program directly, without a shell.
pub fn execute_program(program: &str, args: &[&str], options: &CommandOptions) -> Result<CommandResult> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    let label = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    run(&mut cmd, &label, options)
}

/// Build a `Command` that runs `command` through the user's shell.
pub(crate) fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new(detect_shell());
    cmd.arg(shell_flag());
    cmd.arg(command);
    cmd
}

fn run(cmd: &mut Command, label: &str, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(if options.interactive {
        Stdio::inherit()
    } else {
        Stdio::null()
    });
    cmd.stdout(if options.capture_stdout {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.stderr(if options.capture_stderr {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });

    // Own process group, so a timeout kills everything the command spawned.
    // Interactive commands keep the terminal's group or they cannot read it.
    let own_group = options.timeout.is_some() && !options.interactive;
    #[cfg(unix)]
    if own_group {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    tracing::debug!("Running: {}", label);
    let mut child = cmd.spawn().map_err(|e| {
        tracing::debug!("Failed to spawn '{}': {}", label, e);
        BroodError::CommandFailed {
            command: label.to_string(),
            code: None,
        }
    })?;

    // Drain pipes on threads so a chatty command cannot fill them and stall.
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let status = match options.timeout {
        Some(timeout) => match child.wait_timeout(timeout)? {
            Some(status) => status,
            None => {
                kill_child(&mut child, own_group);
                let _ = child.wait();
                join_reader(stdout_reader);
                join_reader(stderr_reader);
                return Err(BroodError::CommandTimedOut {
                    command: label.to_string(),
                    timeout,
                });
            }
        },
        None => child.wait()?,
    };

    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);

    Ok(CommandResult {
        exit_code: status.code(),
        stdout,
        stderr,
        duration: start.elapsed(),
        success: status.success(),
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn kill_child(child: &mut Child, own_group: bool) {
    #[cfg(unix)]
    if own_group {
        // SAFETY: kill(2) with a negative pid signals the process group we created.
        unsafe {
            libc::kill(-(child.id() as i32), libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = own_group;
    let _ = child.kill();
}

/// Detect the current shell.
fn detect_shell() -> String {
    if cfg!(target_os = "windows") {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    } else {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
}

/// Get the flag to pass commands to the shell.
///
/// Uses `-lc` (login shell) on Unix so that tools activated in
/// `.profile`/`.zprofile` (mise, nvm, volta) are on PATH. The interactive
/// flag is never used: commands run without a TTY and often in their own
/// process group, where `-i` would try to take over job control.
fn shell_flag() -> &'static str {
    if cfg!(target_os = "windows") {
        "/C"
    } else {
        "-lc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured() -> CommandOptions {
        CommandOptions {
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }

    #[test]
    fn execute_successful_command() {
        let result = execute("echo hello", &captured()).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn execute_failing_command() {
        let result = execute("exit 3", &captured()).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn execute_with_env() {
        let options = captured().with_env("BROOD_TEST_VAR", "my_value");
        let result = execute("echo $BROOD_TEST_VAR", &options).unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("my_value"));
    }

    #[test]
    fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();
        let options = captured().in_dir(temp.path());

        let result = execute("ls", &options).unwrap();

        assert!(result.stdout.contains("marker.txt"));
    }

    #[test]
    fn timeout_kills_command() {
        let options = CommandOptions::captured(Duration::from_millis(200));
        let started = Instant::now();

        let err = execute("sleep 5", &options).unwrap_err();

        assert!(matches!(err, BroodError::CommandTimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn interactive_command_shares_our_process_group() {
        let options = CommandOptions {
            capture_stdout: true,
            timeout: Some(Duration::from_secs(5)),
            interactive: true,
            ..Default::default()
        };

        let result = execute("ps -o pgid= -p $$", &options).unwrap();

        // SAFETY: getpgrp(2) has no preconditions.
        let ours = unsafe { libc::getpgrp() };
        assert_eq!(result.stdout.trim(), ours.to_string());
    }

    #[cfg(unix)]
    #[test]
    fn interactive_command_still_times_out() {
        let options = CommandOptions {
            timeout: Some(Duration::from_millis(200)),
            interactive: true,
            ..Default::default()
        };
        let started = Instant::now();

        let err = execute("sleep 5", &options).unwrap_err();

        assert!(matches!(err, BroodError::CommandTimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn program_runs_without_shell() {
        let options = CommandOptions::captured(Duration::from_secs(5));
        let result = execute_program("echo", &["a b", "c"], &options).unwrap();
        assert_eq!(result.stdout.trim(), "a b c");
    }

    #[test]
    fn missing_program_is_command_failed() {
        let options = CommandOptions::captured(Duration::from_secs(5));
        let err = execute_program("brood-no-such-program", &[], &options).unwrap_err();
        assert!(matches!(err, BroodError::CommandFailed { code: None, .. }));
    }

    #[test]
    fn large_output_does_not_stall() {
        let options = CommandOptions::captured(Duration::from_secs(10));
        let result = execute("yes brood | head -n 50000", &options).unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.lines().count(), 50000);
    }

    #[test]
    fn last_error_line_skips_blanks() {
        let result = CommandResult {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "warning: x\nfatal: nope\n\n".to_string(),
            duration: Duration::ZERO,
            success: false,
        };
        assert_eq!(result.last_error_line(), Some("fatal: nope"));
    }
}
