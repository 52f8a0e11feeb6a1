//! Containerized execution: the instance tree is built into an image and
//! run with docker.

use crate::config::{TargetProfile, Timeouts};
use crate::error::{BroodError, Result};
use crate::registry::{Instance, InstanceMode};
use crate::shell::{execute_program, CommandOptions, CommandResult};
use crate::ui::UserInterface;
use std::time::Duration;

use super::strategy::{ExecutionStrategy, LaunchRecord};

/// Builds and runs instances with the docker CLI.
pub struct ContainerStrategy {
    program: String,
    image_prefix: String,
    container_port: u16,
    build_timeout: Duration,
    command_timeout: Duration,
}

impl ContainerStrategy {
    pub fn new(target: &TargetProfile, timeouts: &Timeouts) -> Self {
        Self {
            program: "docker".to_string(),
            image_prefix: target.image_prefix.clone(),
            container_port: target.container_port,
            build_timeout: timeouts.setup(),
            command_timeout: timeouts.command().max(Duration::from_secs(30)),
        }
    }

    /// Use a different docker-compatible CLI (podman, a test double).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Image and container name for an instance.
    pub fn image_name(&self, instance: &Instance) -> String {
        docker_name(&format!("{}-{}", self.image_prefix, instance.name))
    }

    fn docker(&self, args: &[&str], timeout: Duration) -> Result<CommandResult> {
        execute_program(&self.program, args, &CommandOptions::captured(timeout))
    }
}

impl ExecutionStrategy for ContainerStrategy {
    fn mode(&self) -> InstanceMode {
        InstanceMode::Containerized
    }

    fn configure(&self, instance: &Instance, ui: &mut dyn UserInterface) -> Result<()> {
        let configure_failed = |message: String| BroodError::ConfigureFailed {
            instance: instance.name.clone(),
            message,
        };

        if !instance.path.join("Dockerfile").is_file() {
            return Err(configure_failed(format!(
                "no Dockerfile in {}",
                instance.path.display()
            )));
        }

        let image = self.image_name(instance);
        let context = instance.path.to_string_lossy();
        let mut spinner = ui.start_spinner(&format!("Building image {}", image));

        let result = self
            .docker(&["build", "-t", &image, &context], self.build_timeout)
            .map_err(|e| {
                spinner.finish_error("Image build failed");
                configure_failed(e.to_string())
            })?;

        if !result.success {
            spinner.finish_error("Image build failed");
            return Err(configure_failed(
                result
                    .last_error_line()
                    .unwrap_or("docker build failed")
                    .to_string(),
            ));
        }

        spinner.finish_success(&format!("Built image {}", image));
        Ok(())
    }

    fn start(&self, instance: &Instance, port: u16) -> Result<LaunchRecord> {
        let name = self.image_name(instance);

        // A stopped container from an earlier start would hold the name.
        let _ = self.docker(&["rm", "-f", &name], self.command_timeout);

        let publish = format!("{}:{}", port, self.container_port);
        let result = self
            .docker(
                &["run", "-d", "--name", &name, "-p", &publish, &name],
                self.command_timeout,
            )
            .map_err(|e| BroodError::StartFailed {
                instance: instance.name.clone(),
                message: e.to_string(),
            })?;

        if !result.success {
            return Err(BroodError::StartFailed {
                instance: instance.name.clone(),
                message: result
                    .last_error_line()
                    .unwrap_or("docker run failed")
                    .to_string(),
            });
        }

        let id = result.stdout.trim();
        let id = if id.is_empty() { name.as_str() } else { id };
        Ok(LaunchRecord::container(id, port))
    }

    fn is_running(&self, instance: &Instance, launch: &LaunchRecord) -> bool {
        let name = self.image_name(instance);
        let target = launch.container.as_deref().unwrap_or(&name);
        self.docker(
            &["inspect", "-f", "{{.State.Running}}", target],
            self.command_timeout,
        )
        .map(|r| r.success && r.stdout.trim() == "true")
        .unwrap_or(false)
    }

    fn stop(&self, instance: &Instance, launch: &LaunchRecord) -> Result<()> {
        let Some(container) = launch.container.as_deref() else {
            return Err(BroodError::NotStarted {
                instance: instance.name.clone(),
            });
        };

        let result = self.docker(&["stop", container], self.command_timeout)?;
        if !result.success {
            return Err(BroodError::CommandFailed {
                command: format!("{} stop {}", self.program, container),
                code: result.exit_code,
            });
        }
        Ok(())
    }
}

/// Lowercase, with characters docker rejects replaced by `-`.
fn docker_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
