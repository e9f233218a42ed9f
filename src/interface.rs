//! Interactive operator prompts
//!
//! Backends that need credentials or confirmations go through a
//! [`Prompter`], which brackets every query with the interface's
//! `initialize`/`shutdown` calls.

use dialoguer::{Confirm, Input, Password};
use std::sync::Arc;
use thiserror::Error;

use crate::registry::Registry;

#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("prompt I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("terminal prompt failed: {0}")]
    Terminal(#[from] dialoguer::Error),

    #[error("no answer given for `{0}'")]
    NoAnswer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Text,
    Password,
    /// Yes/no question; the answer is normalised to `yes` or `no`
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub prompt: String,
    pub kind: QuestionKind,
    pub default: Option<String>,
}

impl Question {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::Text,
            default: None,
        }
    }

    pub fn password(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::Password,
            default: None,
        }
    }

    pub fn confirm(prompt: impl Into<String>, default: bool) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::Confirm,
            default: Some(confirmation(default).to_string()),
        }
    }
}

/// A user interface capable of answering questions
pub trait Interface: Send {
    fn initialize(&mut self) -> Result<(), InterfaceError> {
        Ok(())
    }

    fn query(&mut self, question: &Question) -> Result<String, InterfaceError>;

    fn shutdown(&mut self) {}
}

/// Builds a fresh interface for each upload
pub trait InterfaceFactory: Send + Sync {
    fn create(&self) -> Box<dyn Interface>;
}

impl<F> InterfaceFactory for F
where
    F: Fn() -> Box<dyn Interface> + Send + Sync,
{
    fn create(&self) -> Box<dyn Interface> {
        self()
    }
}

pub type InterfaceRegistry = Registry<dyn InterfaceFactory>;

/// Registry holding the built-in `cli` interface
pub fn builtin_interfaces() -> InterfaceRegistry {
    let cli: Arc<dyn InterfaceFactory> =
        Arc::new(|| Box::new(CliInterface::new()) as Box<dyn Interface>);
    InterfaceRegistry::new("interface").with("cli", cli)
}

/// Owns one interface and wraps each query in initialize/shutdown
pub struct Prompter {
    interface: Box<dyn Interface>,
}

impl Prompter {
    pub fn new(interface: Box<dyn Interface>) -> Self {
        Self { interface }
    }

    pub fn prompt(&mut self, question: &Question) -> Result<String, InterfaceError> {
        self.interface.initialize()?;
        let answer = self.interface.query(question);
        self.interface.shutdown();
        answer
    }

    /// Convenience for [`QuestionKind::Confirm`] questions
    pub fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, InterfaceError> {
        let answer = self.prompt(&Question::confirm(prompt, default))?;
        Ok(answer == "yes")
    }
}

impl std::fmt::Debug for Prompter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prompter").finish_non_exhaustive()
    }
}

/// Terminal interface backed by `dialoguer`
///
/// Questions are drawn on stderr. Passwords are read without echo.
#[derive(Debug, Default)]
pub struct CliInterface;

impl CliInterface {
    pub fn new() -> Self {
        Self
    }
}

impl Interface for CliInterface {
    fn query(&mut self, question: &Question) -> Result<String, InterfaceError> {
        let answer = match question.kind {
            QuestionKind::Text => {
                let mut input = Input::<String>::new()
                    .with_prompt(&question.prompt)
                    .allow_empty(true);
                if let Some(default) = &question.default {
                    input = input.default(default.clone());
                }
                input.interact_text()?
            }
            QuestionKind::Password => Password::new()
                .with_prompt(&question.prompt)
                .allow_empty_password(true)
                .interact()?,
            QuestionKind::Confirm => {
                let confirmed = Confirm::new()
                    .with_prompt(&question.prompt)
                    .default(confirm_default(question))
                    .interact()?;
                confirmation(confirmed).to_string()
            }
        };
        Ok(answer)
    }
}

fn confirm_default(question: &Question) -> bool {
    matches!(
        question.default.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("y" | "yes")
    )
}

fn confirmation(confirmed: bool) -> &'static str {
    if confirmed { "yes" } else { "no" }
}
