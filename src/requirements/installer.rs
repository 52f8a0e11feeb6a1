//! Requirement installation.
//!
//! Walks the requirements in check order and stops at the first one that
//! cannot be satisfied. Each unmet requirement is installed with its
//! configured command (after confirmation in interactive mode) and then
//! checked again.

use crate::error::{BroodError, Result};
use crate::requirements::checker::RequirementsChecker;
use crate::requirements::registry::{Requirement, RequirementRegistry};
use crate::requirements::status::RequirementStatus;
use crate::shell::{execute, CommandOptions};
use crate::ui::{Prompt, PromptType, UserInterface};
use std::time::Duration;

/// Mockable dependencies for the installer.
pub struct InstallerContext<'a> {
    /// Run a shell command, returning true on success.
    pub run_command: &'a dyn Fn(&str) -> bool,
}

/// Installer context that runs commands through the user's shell with
/// output passed through to the terminal. Interactive installs also get the
/// terminal's stdin, so they can ask for a password.
pub fn shell_context(timeout: Duration, interactive: bool) -> impl Fn(&str) -> bool {
    move |cmd: &str| {
        let options = CommandOptions {
            timeout: Some(timeout),
            interactive,
            ..Default::default()
        };
        match execute(cmd, &options) {
            Ok(result) => result.success,
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        }
    }
}

/// Make sure every requirement is satisfied, installing where possible.
///
/// Fails fast with the first requirement that stays unmet:
/// - no install command: [`BroodError::RequirementMissing`]
/// - interactive and the user says no: [`BroodError::InstallDeclined`]
/// - install command fails: [`BroodError::RequirementCheckFailed`]
/// - install succeeds but the check still fails: [`BroodError::RequirementMissing`]
pub fn install(
    registry: &RequirementRegistry,
    checker: &mut RequirementsChecker,
    ui: &mut dyn UserInterface,
    interactive: bool,
    ctx: &InstallerContext<'_>,
) -> Result<()> {
    for requirement in registry.iter() {
        let status = checker.check_one(requirement);
        if status.is_satisfied() {
            tracing::debug!("{} already satisfied", requirement.name);
            continue;
        }
        resolve(requirement, &status, checker, ui, interactive, ctx)?;
    }
    Ok(())
}

fn resolve(
    requirement: &Requirement,
    status: &RequirementStatus,
    checker: &mut RequirementsChecker,
    ui: &mut dyn UserInterface,
    interactive: bool,
    ctx: &InstallerContext<'_>,
) -> Result<()> {
    let name = requirement.name.as_str();

    let Some(install_cmd) = requirement.install.as_deref() else {
        return Err(BroodError::RequirementMissing {
            requirement: name.to_string(),
            message: with_hint(status.to_string(), requirement),
        });
    };

    if interactive {
        let prompt = Prompt {
            key: format!("install_{}", name),
            question: format!("{} is {}. Install it with `{}`?", name, status, install_cmd),
            prompt_type: PromptType::Confirm,
            default: Some("yes".to_string()),
        };
        let confirmed = ui
            .prompt(&prompt)
            .ok()
            .and_then(|r| r.as_bool())
            .unwrap_or(false);
        if !confirmed {
            return Err(BroodError::InstallDeclined {
                requirement: name.to_string(),
            });
        }
    } else {
        ui.message(&format!("{} is {}; installing", name, status));
    }

    tracing::info!("Installing {} with `{}`", name, install_cmd);
    if !(ctx.run_command)(install_cmd) {
        return Err(BroodError::RequirementCheckFailed {
            requirement: name.to_string(),
            message: format!("`{}` did not succeed", install_cmd),
        });
    }

    // The install may have put the tool under a version manager's directory.
    checker.refresh();
    let after = checker.check_one(requirement);
    if after.is_satisfied() {
        ui.success(&format!("Installed {}", name));
        Ok(())
    } else {
        Err(BroodError::RequirementMissing {
            requirement: name.to_string(),
            message: with_hint(
                format!("still {} after running `{}`", after, install_cmd),
                requirement,
            ),
        })
    }
}

fn with_hint(message: String, requirement: &Requirement) -> String {
    match &requirement.hint {
        Some(hint) => format!("{}. {}", message, hint),
        None => message,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::{RequirementRole, RequirementSpec};
    use crate::requirements::probe::EnvironmentProbe;
    use crate::ui::MockUI;
    use std::cell::RefCell;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn checker() -> RequirementsChecker {
        RequirementsChecker::new(EnvironmentProbe::default(), Duration::from_secs(5))
    }

    fn fake_tool(dir: &Path, name: &str, version: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\necho {}\n", version)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn tool_spec(path: &Path, min: &str) -> RequirementSpec {
        let mut spec = RequirementSpec::tool("tool", RequirementRole::Interpreter, min);
        spec.command = Some(path.to_string_lossy().to_string());
        spec
    }

    fn registry(specs: Vec<RequirementSpec>) -> RequirementRegistry {
        RequirementRegistry::from_specs(&specs).unwrap()
    }

    #[test]
    fn satisfied_requirements_run_nothing() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "tool", "2.0.0");
        let registry = registry(vec![tool_spec(&tool, "1.0.0").with_install("boom")]);
        let calls = RefCell::new(Vec::new());
        let run = |cmd: &str| {
            calls.borrow_mut().push(cmd.to_string());
            true
        };
        let ctx = InstallerContext { run_command: &run };
        let mut ui = MockUI::new();

        install(&registry, &mut checker(), &mut ui, false, &ctx).unwrap();

        assert!(calls.borrow().is_empty());
        assert!(ui.prompts_shown().is_empty());
    }

    #[test]
    fn missing_without_install_command_fails() {
        let spec = RequirementSpec::tool("brood-missing", RequirementRole::Interpreter, "1")
            .with_hint("Get it from example.invalid");
        let registry = registry(vec![spec]);
        let ctx = InstallerContext {
            run_command: &|_| panic!("nothing to run"),
        };
        let mut ui = MockUI::new();

        let err = install(&registry, &mut checker(), &mut ui, true, &ctx).unwrap_err();

        match err {
            BroodError::RequirementMissing {
                requirement,
                message,
            } => {
                assert_eq!(requirement, "brood-missing");
                assert!(message.contains("example.invalid"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn declined_install_is_reported() {
        let spec = RequirementSpec::tool("brood-missing", RequirementRole::Interpreter, "1")
            .with_install("true");
        let registry = registry(vec![spec]);
        let ctx = InstallerContext {
            run_command: &|_| panic!("declined installs must not run"),
        };
        let mut ui = MockUI::new();
        ui.set_interactive(true);
        ui.set_prompt_response("install_brood-missing", "no");

        let err = install(&registry, &mut checker(), &mut ui, true, &ctx).unwrap_err();

        assert!(matches!(err, BroodError::InstallDeclined { .. }));
        assert!(ui
            .prompts_shown()
            .contains(&"install_brood-missing".to_string()));
    }

    #[test]
    fn failed_install_command_is_check_failure() {
        let spec = RequirementSpec::tool("brood-missing", RequirementRole::Interpreter, "1")
            .with_install("exit 1");
        let registry = registry(vec![spec]);
        let ctx = InstallerContext {
            run_command: &|_| false,
        };
        let mut ui = MockUI::new();

        let err = install(&registry, &mut checker(), &mut ui, false, &ctx).unwrap_err();

        assert!(matches!(err, BroodError::RequirementCheckFailed { .. }));
    }

    #[test]
    fn install_then_recheck_succeeds() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "tool", "1.0.0");
        let registry = registry(vec![tool_spec(&tool, "2.0.0").with_install("upgrade")]);
        let tool_path = tool.clone();
        let run = move |_: &str| {
            fake_tool(tool_path.parent().unwrap(), "tool", "2.1.0");
            true
        };
        let ctx = InstallerContext { run_command: &run };
        let mut ui = MockUI::new();
        ui.set_interactive(true);
        ui.set_prompt_response("install_tool", "yes");

        install(&registry, &mut checker(), &mut ui, true, &ctx).unwrap();

        assert!(ui.has_success("Installed tool"));
    }

    #[test]
    fn install_without_effect_is_still_missing() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "tool", "1.0.0");
        let registry = registry(vec![tool_spec(&tool, "2.0.0").with_install("noop")]);
        let ctx = InstallerContext {
            run_command: &|_| true,
        };
        let mut ui = MockUI::new();

        let err = install(&registry, &mut checker(), &mut ui, false, &ctx).unwrap_err();

        assert!(matches!(err, BroodError::RequirementMissing { .. }));
    }

    #[test]
    fn stops_at_first_unmet_requirement() {
        let first = RequirementSpec::tool("brood-first", RequirementRole::Interpreter, "1");
        let second = RequirementSpec::tool("brood-second", RequirementRole::PackageManager, "1")
            .with_install("install-second");
        let registry = registry(vec![second, first]);
        let calls = RefCell::new(Vec::new());
        let run = |cmd: &str| {
            calls.borrow_mut().push(cmd.to_string());
            true
        };
        let ctx = InstallerContext { run_command: &run };
        let mut ui = MockUI::new();

        let err = install(&registry, &mut checker(), &mut ui, false, &ctx).unwrap_err();

        assert!(matches!(
            err,
            BroodError::RequirementMissing { ref requirement, .. } if requirement == "brood-first"
        ));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn shell_context_reports_exit_status() {
        for interactive in [false, true] {
            let run = shell_context(Duration::from_secs(5), interactive);
            assert!(run("true"));
            assert!(!run("false"));
        }
    }
}
