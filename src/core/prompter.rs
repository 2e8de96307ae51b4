// src/core/prompter.rs

use crate::core::config_store::ConfigMap;
use colored::Colorize;
use dialoguer::{Confirm, Input, Password, theme::ColorfulTheme};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("User Interface Error: {0}")]
    Dialoguer(#[from] dialoguer::Error),
}

/// How a question is rendered at the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Text,
    Secret,
    Confirm,
}

/// A field validator. Returns a human-readable message when the candidate
/// value is rejected. Validators must be pure; they may run several times
/// against the same field while the user corrects their input.
pub type Validator = Box<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// One interactive question. `name` must be unique within a question set.
pub struct Question {
    pub name: String,
    pub message: String,
    pub kind: QuestionKind,
    pub default: Option<Value>,
    pub validate: Option<Validator>,
}

impl Question {
    pub fn text(name: &str, message: &str) -> Self {
        Self::new(name, message, QuestionKind::Text)
    }

    pub fn secret(name: &str, message: &str) -> Self {
        Self::new(name, message, QuestionKind::Secret)
    }

    pub fn confirm(name: &str, message: &str) -> Self {
        Self::new(name, message, QuestionKind::Confirm)
    }

    fn new(name: &str, message: &str, kind: QuestionKind) -> Self {
        Self {
            name: name.to_string(),
            message: message.to_string(),
            kind,
            default: None,
            validate: None,
        }
    }

    /// Seeds the value shown when the user answers with an empty input.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_validator<F>(mut self, validate: F) -> Self
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validate = Some(Box::new(validate));
        self
    }
}

impl fmt::Debug for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Question")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("has_validator", &self.validate.is_some())
            .finish()
    }
}

/// Collects answers for an ordered list of questions.
///
/// The caller decides *which* questions to ask before invoking this; every
/// question handed in here is rendered, and the returned mapping contains
/// exactly one answer per question.
pub trait Prompter {
    fn ask(&self, questions: &[Question]) -> Result<ConfigMap, PromptError>;
}

/// Terminal prompter backed by dialoguer.
///
/// A failing validator re-prompts the same field until the input passes;
/// validation failures never escape this implementation.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&self, questions: &[Question]) -> Result<ConfigMap, PromptError> {
        let theme = ColorfulTheme::default();
        let mut answers = ConfigMap::new();

        for question in questions {
            let value = match question.kind {
                QuestionKind::Text => {
                    let mut input = Input::<String>::with_theme(&theme)
                        .with_prompt(&question.message);
                    if let Some(default) = question.default.as_ref().and_then(Value::as_str) {
                        input = input.default(default.to_string());
                    }
                    if let Some(validate) = &question.validate {
                        input = input.validate_with(|candidate: &String| validate(candidate));
                    }
                    Value::String(input.interact_text()?)
                }
                QuestionKind::Secret => {
                    // No default for secrets: we never echo a stored password
                    // back. Validation loops here until the input passes.
                    loop {
                        let candidate = Password::with_theme(&theme)
                            .with_prompt(&question.message)
                            .interact()?;
                        match question.validate.as_ref().map_or(Ok(()), |v| v(&candidate)) {
                            Ok(()) => break Value::String(candidate),
                            Err(message) => println!("{}", format!("  Error: {message}").red()),
                        }
                    }
                }
                QuestionKind::Confirm => {
                    let default = question
                        .default
                        .as_ref()
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    let answer = Confirm::with_theme(&theme)
                        .with_prompt(&question.message)
                        .default(default)
                        .interact()?;
                    Value::Bool(answer)
                }
            };
            answers.insert(question.name.clone(), value);
        }

        Ok(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builders_set_kind_default_and_validator() {
        let question = Question::text("url", "Url")
            .with_default(json!("ftp://old"))
            .with_validator(|input| {
                if input.starts_with("ftp://") {
                    Ok(())
                } else {
                    Err("An ftp-url must start with ftp://".to_string())
                }
            });

        assert_eq!(question.kind, QuestionKind::Text);
        assert_eq!(question.default, Some(json!("ftp://old")));

        let validate = question.validate.unwrap();
        assert!(validate("ftp://new").is_ok());
        assert_eq!(
            validate("http://new"),
            Err("An ftp-url must start with ftp://".to_string())
        );
    }
}
