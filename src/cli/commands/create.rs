//! Create command implementation.
//!
//! `brood create` fetches source, registers the instance and configures it.

use crate::cli::args::CreateArgs;
use crate::error::Result;
use crate::lifecycle::CreateOptions;
use crate::ui::{Prompt, PromptType, UserInterface};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

/// The create command implementation.
pub struct CreateCommand {
    context: CommandContext,
    args: CreateArgs,
}

impl CreateCommand {
    pub fn new(context: CommandContext, args: CreateArgs) -> Self {
        Self { context, args }
    }

    pub fn args(&self) -> &CreateArgs {
        &self.args
    }

    fn options(&self, name: Option<String>) -> CreateOptions {
        CreateOptions {
            name,
            path: self.args.path.clone(),
            version: self.args.source.tag.clone(),
            develop: self.args.source.develop,
            containerized: self.args.container,
            use_git: !self.args.source.no_git,
            interactive: self.args.source.interactive,
            keep_on_failure: self.args.keep_on_failure,
        }
    }
}

impl Command for CreateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let mut controller = self.context.controller(&settings)?;

        // Offer the generated name when asked to be interactive.
        let name = match &self.args.name {
            Some(name) => Some(name.clone()),
            None if self.args.source.interactive && ui.is_interactive() => {
                let suggested = controller
                    .registry()
                    .next_free_name(&settings.target.tool_name)?;
                let answer = ui.prompt(&Prompt {
                    key: "instance_name".to_string(),
                    question: "Instance name".to_string(),
                    prompt_type: PromptType::Input,
                    default: Some(suggested),
                })?;
                Some(answer.as_string())
            }
            None => None,
        };

        let instance = controller.create_birth(&self.options(name), ui)?;

        ui.success(&format!(
            "Created {} ({}) at {}",
            instance.name,
            instance.mode,
            instance.path.display()
        ));
        ui.message(&format!("Start it with `brood run {}`", instance.name));
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::SourceArgs;
    use std::path::PathBuf;

    #[test]
    fn flags_map_to_options() {
        let cmd = CreateCommand::new(
            CommandContext::new("/home", "/work"),
            CreateArgs {
                name: Some("blue".into()),
                path: Some(PathBuf::from("blue-dir")),
                container: true,
                keep_on_failure: true,
                source: SourceArgs {
                    tag: Some("v1.2.0".into()),
                    develop: false,
                    no_git: true,
                    interactive: true,
                },
            },
        );

        let options = cmd.options(cmd.args().name.clone());

        assert_eq!(options.name.as_deref(), Some("blue"));
        assert_eq!(options.path, Some(PathBuf::from("blue-dir")));
        assert_eq!(options.version.as_deref(), Some("v1.2.0"));
        assert!(options.containerized);
        assert!(!options.use_git);
        assert!(options.interactive);
        assert!(options.keep_on_failure);
    }

    #[test]
    fn git_allowed_by_default() {
        let cmd = CreateCommand::new(CommandContext::new("/home", "/work"), CreateArgs::default());
        assert!(cmd.options(None).use_git);
    }
}
