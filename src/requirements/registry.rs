//! Requirement registry and definitions.
//!
//! Converts the requirement entries from the settings file into checkable
//! [`Requirement`]s, validated and in check order.

use crate::config::{RequirementRole, RequirementSpec};
use crate::error::{BroodError, Result};

/// A requirement definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub name: String,
    pub role: RequirementRole,
    pub check: RequirementCheck,
    /// Shell command that installs this requirement.
    pub install: Option<String>,
    /// Human-readable install instructions.
    pub hint: Option<String>,
}

/// How to check if a requirement is met.
#[derive(Debug, Clone, PartialEq)]
pub enum RequirementCheck {
    /// Run `<command> <version_flag>` and compare the printed version.
    Tool {
        command: String,
        version_flag: String,
        min_version: Option<String>,
    },

    /// Read an environment variable, optionally requiring a substring.
    Environment {
        variable: String,
        contains: Option<String>,
    },
}

impl Requirement {
    /// Build from a settings entry.
    pub fn from_spec(spec: &RequirementSpec) -> Result<Self> {
        let check = match (&spec.command, &spec.variable) {
            (Some(command), None) => RequirementCheck::Tool {
                command: command.clone(),
                version_flag: spec
                    .version_flag
                    .clone()
                    .unwrap_or_else(|| "--version".to_string()),
                min_version: spec.min_version.clone(),
            },
            (None, Some(variable)) => RequirementCheck::Environment {
                variable: variable.clone(),
                contains: spec.contains.clone(),
            },
            (Some(_), Some(_)) => {
                return Err(BroodError::ConfigValidationError {
                    message: format!(
                        "requirement '{}' sets both command and variable",
                        spec.name
                    ),
                })
            }
            (None, None) => {
                return Err(BroodError::ConfigValidationError {
                    message: format!(
                        "requirement '{}' needs a command or a variable",
                        spec.name
                    ),
                })
            }
        };

        Ok(Self {
            name: spec.name.clone(),
            role: spec.role,
            check,
            install: spec.install.clone(),
            hint: spec.hint.clone(),
        })
    }
}

/// Ordered set of requirements for native instances.
#[derive(Debug, Clone, Default)]
pub struct RequirementRegistry {
    requirements: Vec<Requirement>,
}

impl RequirementRegistry {
    /// Build from settings entries, sorted into check order.
    pub fn from_specs(specs: &[RequirementSpec]) -> Result<Self> {
        let mut requirements = specs
            .iter()
            .map(Requirement::from_spec)
            .collect::<Result<Vec<_>>>()?;
        requirements.sort_by_key(|r| r.role);
        Ok(Self { requirements })
    }

    pub fn get(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}
