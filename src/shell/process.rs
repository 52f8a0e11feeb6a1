//! Detached processes.
//!
//! Natively run instances outlive the `brood` invocation that started them.
//! They are spawned in their own session with output sent to a log file, and
//! later observed by pid.

use crate::error::{BroodError, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::process::Stdio;

use super::command::{shell_command, CommandOptions};

/// Spawn `command` through the shell, detached from this process.
///
/// Stdout and stderr are appended to `log_path`. Returns the pid, which on
/// Unix is also the process group id of everything the command starts.
pub fn spawn_detached(command: &str, options: &CommandOptions, log_path: &Path) -> Result<u32> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    let log_err = log.try_clone()?;

    let mut cmd = shell_command(command);
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(0x00000008); // DETACHED_PROCESS
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // SAFETY: setsid is async-signal-safe and only touches the child.
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }
    }

    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()
        .map_err(|e| {
            tracing::debug!("Failed to spawn '{}': {}", command, e);
            BroodError::CommandFailed {
                command: command.to_string(),
                code: None,
            }
        })?;

    let pid = child.id();
    tracing::info!("Spawned '{}' with PID {}", command, pid);
    Ok(pid)
}

/// Check if a process is running.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 only checks that the process exists.
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(not(unix))]
pub fn is_process_alive(_pid: u32) -> bool {
    false
}

/// Terminate a detached process and its group (SIGTERM).
#[cfg(unix)]
pub fn terminate(pid: u32) -> anyhow::Result<()> {
    let pid = i32::try_from(pid)?;
    if pid <= 0 {
        anyhow::bail!("Refusing to signal pid {}", pid);
    }
    // SAFETY: plain kill(2); the group id equals the pid because of setsid.
    let result = unsafe {
        let group = libc::kill(-pid, libc::SIGTERM);
        if group == 0 {
            0
        } else {
            libc::kill(pid, libc::SIGTERM)
        }
    };
    if result == 0 {
        Ok(())
    } else {
        anyhow::bail!(
            "Failed to terminate process: {}",
            std::io::Error::last_os_error()
        )
    }
}

#[cfg(not(unix))]
pub fn terminate(pid: u32) -> anyhow::Result<()> {
    anyhow::bail!("Stopping process {} is not supported on this platform", pid)
}
