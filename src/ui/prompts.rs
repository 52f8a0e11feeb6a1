//! Interactive prompts.

use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

use crate::error::{BroodError, Result};

use super::{Prompt, PromptResult, PromptType};

fn map_dialoguer_err(e: dialoguer::Error) -> BroodError {
    BroodError::Io(e.into())
}

/// Prompt the user for input.
pub fn prompt_user(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    match &prompt.prompt_type {
        PromptType::Confirm => prompt_confirm(prompt, term),
        PromptType::Input => prompt_input(prompt, term),
    }
}

/// Whether a default string reads as "yes". Missing defaults are yes.
pub fn default_is_yes(default: Option<&str>) -> bool {
    default
        .map(|s| matches!(s.to_lowercase().as_str(), "true" | "y" | "yes"))
        .unwrap_or(true)
}

fn prompt_confirm(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let result = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(&prompt.question)
        .default(default_is_yes(prompt.default.as_deref()))
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    Ok(PromptResult::Bool(result))
}

fn prompt_input(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let theme = ColorfulTheme::default();
    let input = Input::<String>::with_theme(&theme).with_prompt(&prompt.question);

    let result: String = if let Some(default) = &prompt.default {
        input
            .default(default.clone())
            .interact_on(term)
            .map_err(map_dialoguer_err)?
    } else {
        input.interact_on(term).map_err(map_dialoguer_err)?
    };

    Ok(PromptResult::String(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_like_defaults() {
        assert!(default_is_yes(None));
        assert!(default_is_yes(Some("yes")));
        assert!(default_is_yes(Some("Y")));
        assert!(default_is_yes(Some("TRUE")));
    }

    #[test]
    fn other_defaults_are_no() {
        assert!(!default_is_yes(Some("no")));
        assert!(!default_is_yes(Some("false")));
        assert!(!default_is_yes(Some("")));
    }
}
