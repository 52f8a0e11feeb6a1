//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. It can be configured with
//! pre-determined prompt responses.
//!
//! # Example
//!
//! ```
//! use brood::ui::{MockUI, Prompt, PromptType, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("install_node", "no");
//!
//! ui.message("Checking requirements");
//! let answer = ui
//!     .prompt(&Prompt {
//!         key: "install_node".to_string(),
//!         question: "Install node?".to_string(),
//!         prompt_type: PromptType::Confirm,
//!         default: Some("yes".to_string()),
//!     })
//!     .unwrap();
//!
//! assert_eq!(answer.as_bool(), Some(false));
//! assert!(ui.has_message("Checking"));
//! ```

use std::collections::HashMap;

use crate::error::Result;

use super::{scripted_answer, OutputMode, Prompt, PromptResult, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    spinners: Vec<String>,
    prompt_responses: HashMap<String, String>,
    prompts_shown: Vec<String>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set a response for a prompt key.
    ///
    /// Confirm prompts read "yes", "y", "true" and "1" as yes.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Messages of every spinner that was started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Keys of every prompt that was shown.
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.prompts_shown.push(prompt.key.clone());

        let answer = self
            .prompt_responses
            .get(&prompt.key)
            .or(prompt.default.as_ref());

        // Unanswered confirms read as "no".
        Ok(match answer {
            Some(answer) => scripted_answer(prompt.prompt_type, answer),
            None => scripted_answer(prompt.prompt_type, ""),
        })
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner::new())
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Mock spinner that captures its messages.
#[derive(Debug, Default)]
pub struct MockSpinner {
    messages: Vec<String>,
    status: Option<SpinnerStatus>,
}

/// How a mock spinner finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerStatus {
    Success,
    Error,
}

impl MockSpinner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn status(&self) -> Option<SpinnerStatus> {
        self.status
    }

    fn finish(&mut self, msg: &str, status: SpinnerStatus) {
        self.messages.push(msg.to_string());
        self.status = Some(status);
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finish(msg, SpinnerStatus::Success);
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish(msg, SpinnerStatus::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::PromptType;

    fn confirm(key: &str, default: Option<&str>) -> Prompt {
        Prompt {
            key: key.to_string(),
            question: "Proceed?".to_string(),
            prompt_type: PromptType::Confirm,
            default: default.map(String::from),
        }
    }

    #[test]
    fn captures_output() {
        let mut ui = MockUI::new();
        ui.message("hello");
        ui.success("done");
        ui.warning("careful");
        ui.error("broken");
        ui.show_header("forge-1");

        assert!(ui.has_message("hello"));
        assert!(ui.has_success("done"));
        assert!(ui.has_warning("careful"));
        assert!(ui.has_error("broken"));
        assert_eq!(ui.headers(), ["forge-1"]);
    }

    #[test]
    fn configured_response_wins_over_default() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("install_node", "no");

        let result = ui.prompt(&confirm("install_node", Some("yes"))).unwrap();

        assert_eq!(result, PromptResult::Bool(false));
        assert_eq!(ui.prompts_shown(), ["install_node"]);
    }

    #[test]
    fn falls_back_to_default_then_no() {
        let mut ui = MockUI::new();

        assert_eq!(
            ui.prompt(&confirm("a", Some("yes"))).unwrap(),
            PromptResult::Bool(true)
        );
        assert_eq!(
            ui.prompt(&confirm("b", None)).unwrap(),
            PromptResult::Bool(false)
        );
    }

    #[test]
    fn input_prompt_returns_string() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("instance_name", "blue");

        let result = ui
            .prompt(&Prompt {
                key: "instance_name".to_string(),
                question: "Name?".to_string(),
                prompt_type: PromptType::Input,
                default: Some("forge-1".to_string()),
            })
            .unwrap();

        assert_eq!(result.as_string(), "blue");
    }

    #[test]
    fn spinner_records_finish() {
        let mut spinner = MockSpinner::new();
        spinner.set_message("Fetching");
        spinner.finish_error("Could not obtain source");

        assert_eq!(spinner.status(), Some(SpinnerStatus::Error));
        assert_eq!(spinner.messages().len(), 2);
    }
}
