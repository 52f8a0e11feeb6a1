//! Native execution: setup and start commands run on the host.

use crate::config::{TargetProfile, Timeouts};
use crate::error::{BroodError, Result};
use crate::registry::{Instance, InstanceMode};
use crate::shell::{execute, is_process_alive, spawn_detached, terminate, CommandOptions};
use crate::ui::UserInterface;
use std::fs::OpenOptions;
use std::io::Write;
use std::time::Duration;

use super::strategy::{log_file, ExecutionStrategy, LaunchRecord};

/// Runs the target's setup and start commands inside the instance tree.
pub struct NativeStrategy {
    setup_command: String,
    start_command: String,
    setup_timeout: Duration,
}

impl NativeStrategy {
    pub fn new(target: &TargetProfile, timeouts: &Timeouts) -> Self {
        Self {
            setup_command: target.setup_command.clone(),
            start_command: target.start_command.clone(),
            setup_timeout: timeouts.setup(),
        }
    }
}

impl ExecutionStrategy for NativeStrategy {
    fn mode(&self) -> InstanceMode {
        InstanceMode::Native
    }

    fn configure(&self, instance: &Instance, ui: &mut dyn UserInterface) -> Result<()> {
        let mut spinner = ui.start_spinner(&format!("Running `{}`", self.setup_command));
        let options = CommandOptions::captured(self.setup_timeout).in_dir(&instance.path);

        let failure = match execute(&self.setup_command, &options) {
            Ok(result) => {
                append_log(instance, &self.setup_command, &result.combined_output());
                if result.success {
                    None
                } else {
                    Some(
                        result
                            .last_error_line()
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("exit code {:?}", result.exit_code)),
                    )
                }
            }
            Err(e) => Some(e.to_string()),
        };

        match failure {
            None => {
                spinner.finish_success(&format!("Configured {}", instance.name));
                Ok(())
            }
            Some(reason) => {
                spinner.finish_error(&format!("`{}` failed", self.setup_command));
                Err(BroodError::ConfigureFailed {
                    instance: instance.name.clone(),
                    message: format!(
                        "`{}`: {} (see {})",
                        self.setup_command,
                        reason,
                        log_file(&instance.path).display()
                    ),
                })
            }
        }
    }

    fn start(&self, instance: &Instance, port: u16) -> Result<LaunchRecord> {
        let options = CommandOptions::default()
            .in_dir(&instance.path)
            .with_env("PORT", &port.to_string());

        let pid = spawn_detached(&self.start_command, &options, &log_file(&instance.path))
            .map_err(|e| BroodError::StartFailed {
                instance: instance.name.clone(),
                message: e.to_string(),
            })?;

        Ok(LaunchRecord::process(pid, port))
    }

    fn is_running(&self, _instance: &Instance, launch: &LaunchRecord) -> bool {
        launch.pid.is_some_and(is_process_alive)
    }

    fn stop(&self, instance: &Instance, launch: &LaunchRecord) -> Result<()> {
        let Some(pid) = launch.pid else {
            return Err(BroodError::NotStarted {
                instance: instance.name.clone(),
            });
        };
        terminate(pid)?;
        Ok(())
    }
}

fn append_log(instance: &Instance, command: &str, output: &str) {
    let path = log_file(&instance.path);
    let written = path
        .parent()
        .map(std::fs::create_dir_all)
        .transpose()
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
        .and_then(|mut file| writeln!(file, "$ {}\n{}", command, output));
    if let Err(e) = written {
        tracing::debug!("Could not write {}: {}", path.display(), e);
    }
}
