//! Requirement checks.
//!
//! The `RequirementsChecker` answers yes/no questions about the host: is a
//! tool present and new enough, is a variable set. Every query is bounded
//! by a timeout and never fails; anything that goes wrong reads as "not
//! satisfied". Results are cached per run so a requirement checked twice
//! only spawns its version command once.

use crate::requirements::probe::{resolve_tool_path, EnvironmentProbe};
use crate::requirements::registry::{Requirement, RequirementCheck, RequirementRegistry};
use crate::requirements::status::{GapResult, RequirementStatus};
use crate::requirements::version::check_version;
use crate::shell::{execute_program, CommandOptions};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Checks whether requirements are satisfied on the system.
pub struct RequirementsChecker {
    probe: EnvironmentProbe,
    timeout: Duration,
    cache: HashMap<String, RequirementStatus>,
}

impl RequirementsChecker {
    /// Create a checker whose version queries stop after `timeout`.
    pub fn new(probe: EnvironmentProbe, timeout: Duration) -> Self {
        Self {
            probe,
            timeout,
            cache: HashMap::new(),
        }
    }

    pub fn probe(&self) -> &EnvironmentProbe {
        &self.probe
    }

    /// Run `<command> <flag>` and return what it printed.
    ///
    /// `None` when the command is not found, exits non-zero, or outlives
    /// the timeout.
    pub fn query_version(&self, command: &str, version_flag: &str) -> Option<String> {
        let program = self.resolve(command)?;
        let options = CommandOptions::captured(self.timeout)
            .with_env("PATH", &self.probe.path_value().to_string_lossy());

        match execute_program(&program.to_string_lossy(), &[version_flag], &options) {
            Ok(result) if result.success => Some(result.combined_output()),
            Ok(result) => {
                tracing::debug!(
                    "{} {} exited with {:?}",
                    command,
                    version_flag,
                    result.exit_code
                );
                None
            }
            Err(e) => {
                tracing::debug!("{} {} failed: {}", command, version_flag, e);
                None
            }
        }
    }

    /// Whether `command` is present and reports at least `min_version`.
    pub fn check_tool(&self, command: &str, version_flag: &str, min_version: &str) -> bool {
        self.query_version(command, version_flag)
            .is_some_and(|output| check_version(&output, min_version))
    }

    /// Whether `variable` is set and contains `substring`.
    pub fn check_environment_variable(&self, variable: &str, substring: &str) -> bool {
        check_environment_value(std::env::var(variable).ok().as_deref(), substring)
    }

    /// Check a single requirement, using the cache when available.
    pub fn check_one(&mut self, requirement: &Requirement) -> RequirementStatus {
        if let Some(cached) = self.cache.get(&requirement.name) {
            return cached.clone();
        }

        let status = self.evaluate(requirement);
        tracing::debug!("Requirement {}: {}", requirement.name, status);
        self.cache
            .insert(requirement.name.clone(), status.clone());
        status
    }

    /// Every unmet requirement, in check order.
    pub fn check_all(&mut self, registry: &RequirementRegistry) -> Vec<GapResult> {
        registry
            .iter()
            .filter_map(|req| {
                let status = self.check_one(req);
                (!status.is_satisfied()).then(|| GapResult {
                    requirement: req.name.clone(),
                    status,
                })
            })
            .collect()
    }

    /// Re-probe the environment and forget every cached result.
    pub fn refresh(&mut self) {
        self.probe.refresh();
        self.cache.clear();
    }

    fn evaluate(&self, requirement: &Requirement) -> RequirementStatus {
        match &requirement.check {
            RequirementCheck::Tool {
                command,
                version_flag,
                min_version,
            } => match (self.query_version(command, version_flag), min_version) {
                (None, _) => RequirementStatus::Missing,
                (Some(_), None) => RequirementStatus::Satisfied,
                (Some(output), Some(min)) if check_version(&output, min) => {
                    RequirementStatus::Satisfied
                }
                (Some(output), Some(min)) => RequirementStatus::Outdated {
                    found: output.lines().next().unwrap_or_default().to_string(),
                    required: min.clone(),
                },
            },
            RequirementCheck::Environment { variable, contains } => {
                let value = std::env::var(variable).ok();
                let satisfied = match contains {
                    Some(substring) => check_environment_value(value.as_deref(), substring),
                    None => value.is_some_and(|v| !v.is_empty()),
                };
                if satisfied {
                    RequirementStatus::Satisfied
                } else {
                    RequirementStatus::Unset {
                        variable: variable.clone(),
                        expected: contains.clone(),
                    }
                }
            }
        }
    }

    fn resolve(&self, command: &str) -> Option<PathBuf> {
        if command.contains(std::path::MAIN_SEPARATOR) || command.contains('/') {
            return Some(PathBuf::from(command));
        }
        resolve_tool_path(command, &self.probe.full_path())
    }
}

/// Whether an (optional) variable value is non-empty and contains `substring`.
pub fn check_environment_value(value: Option<&str>, substring: &str) -> bool {
    value.is_some_and(|v| !v.is_empty() && v.contains(substring))
}
