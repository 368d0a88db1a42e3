// Interactive prompts. The workflow only sees the traits; the terminal
// implementation draws them with ratatui in an inline viewport.

pub mod components;
pub mod terminal;
pub mod widgets;

pub use terminal::TerminalPrompter;

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Ctrl-C while a prompt had the keyboard
    #[error("interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Success,
    Warning,
    Error,
}

/// Receives progress of one long-running operation
pub trait ProgressSink {
    /// `fraction` is `None` when the total is unknown
    fn update(&mut self, fraction: Option<f64>, detail: &str);

    /// The operation completed
    fn finish(&mut self, message: &str);

    /// The operation stopped early or failed
    fn fail(&mut self, message: &str);
}

/// The four operations the workflow needs from a user interface.
///
/// `ask_choice` and `ask_text` return `Ok(None)` when the user backs out
/// (Esc); errors are reserved for terminal failures and Ctrl-C.
pub trait Prompter {
    fn ask_choice(
        &mut self,
        title: &str,
        options: &[String],
        default: usize,
    ) -> Result<Option<usize>, PromptError>;

    fn ask_text(&mut self, title: &str, initial: &str) -> Result<Option<String>, PromptError>;

    fn ask_confirm(&mut self, question: &str, default: bool) -> Result<bool, PromptError>;

    fn notify(&mut self, level: Notice, message: &str);

    fn show_progress(&mut self, title: &str) -> Result<Box<dyn ProgressSink + '_>, PromptError>;
}
