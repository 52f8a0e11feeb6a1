//! Git operations for source acquisition.

use crate::shell::{execute_program, CommandOptions, CommandResult};
use anyhow::{bail, Result};
use std::path::Path;
use std::time::Duration;

/// Runs `git` with a timeout on every invocation.
#[derive(Debug, Clone)]
pub struct GitClient {
    program: String,
    timeout: Duration,
}

impl GitClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "git".to_string(),
            timeout,
        }
    }

    /// Use a different git executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Whether a working git is installed.
    pub fn is_available(&self) -> bool {
        let options = CommandOptions::captured(Duration::from_secs(10).min(self.timeout));
        execute_program(&self.program, &["--version"], &options)
            .map(|r| r.success)
            .unwrap_or(false)
    }

    /// Clone `url` into `dest`, which must not exist yet.
    pub fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        let result = self.run(&["clone", "--quiet", url, &dest], None)?;
        if !result.success {
            bail!("Git clone failed: {}", failure_reason(&result));
        }
        Ok(())
    }

    /// Check out `git_ref` (branch, tag or commit) in an existing clone.
    pub fn checkout(&self, repo: &Path, git_ref: &str) -> Result<()> {
        let result = self.run(&["checkout", "--quiet", git_ref], Some(repo))?;
        if !result.success {
            bail!(
                "Git checkout of '{}' failed: {}",
                git_ref,
                failure_reason(&result)
            );
        }
        Ok(())
    }

    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<CommandResult> {
        let mut options = CommandOptions::captured(self.timeout)
            .with_env("GIT_TERMINAL_PROMPT", "0");
        if let Some(cwd) = cwd {
            options = options.in_dir(cwd);
        }
        Ok(execute_program(&self.program, args, &options)?)
    }
}

fn failure_reason(result: &CommandResult) -> String {
    result
        .last_error_line()
        .map(str::to_string)
        .unwrap_or_else(|| format!("exit code {:?}", result.exit_code))
}
