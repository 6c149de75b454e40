//! Action execution engine.
//!
//! An action binds a command template to a piece of input text, runs the
//! resolved command through the system shell and turns its output into
//! items:
//! - [`template`] - placeholder substitution
//! - [`executor`] - process lifecycle and streaming I/O
//! - [`split`] - output to item splitting

pub mod executor;
pub mod split;
pub mod template;

pub use executor::{ActionEvent, ActionExecutor};

use thiserror::Error;
use tokio_util::bytes::Bytes;

/// Errors that prevent an action from producing a normal result.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The command template is empty.
    #[error("No command to run")]
    EmptyCommand,
    /// The template has a placeholder but no input text was given.
    #[error("Command expects input text but none was given")]
    MissingInput,
    /// The shell process could not be created.
    #[error("Failed to start command: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Options collected alongside the command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOptions {
    /// Write the input text to the process stdin.
    pub pass_input: bool,
    /// Capture stdout and split it into items.
    pub capture_output: bool,
    /// Separator used to split captured output.
    pub separator: String,
}

impl Default for ActionOptions {
    fn default() -> Self {
        Self {
            pass_input: true,
            capture_output: true,
            separator: "\n".to_string(),
        }
    }
}

/// Everything the user entered for one run, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionForm {
    /// Raw command template, as recorded in history.
    pub template: String,
    pub input: String,
    pub options: ActionOptions,
}

/// A fully resolved, ready-to-run action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub command: String,
    pub input: Bytes,
    pub capture_output: bool,
    pub separator: String,
}

impl ActionRequest {
    /// Resolve a form into a runnable request.
    ///
    /// Substitution always uses the input text; stdin delivery is dropped
    /// afterwards when `pass_input` is disabled.
    ///
    /// # Errors
    /// Returns [`ActionError::EmptyCommand`] for an empty template and
    /// [`ActionError::MissingInput`] when a placeholder has nothing to
    /// substitute.
    pub fn prepare(form: &ActionForm) -> Result<Self, ActionError> {
        if form.template.is_empty() {
            return Err(ActionError::EmptyCommand);
        }

        let command = template::resolve(&form.template, &form.input)?;
        let input = if form.options.pass_input {
            Bytes::copy_from_slice(form.input.as_bytes())
        } else {
            Bytes::new()
        };

        Ok(Self {
            command,
            input,
            capture_output: form.options.capture_output,
            separator: form.options.separator.clone(),
        })
    }
}

/// Outcome of a finished action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionResult {
    pub items: Vec<Bytes>,
    /// Set when the process failed to start or exited unsuccessfully.
    pub error: Option<String>,
    /// Exit code, if the process ran and exited normally.
    pub exit_code: Option<i32>,
}

impl ActionResult {
    /// Result for a process that could not be started.
    pub fn spawn_failed(error: &ActionError) -> Self {
        Self {
            items: Vec::new(),
            error: Some(error.to_string()),
            exit_code: None,
        }
    }

    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Items decoded as text, replacing invalid UTF-8.
    pub fn item_strings(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| String::from_utf8_lossy(item).into_owned())
            .collect()
    }
}
