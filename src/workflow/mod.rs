//! The interactive menu loop and the actions behind it.
//!
//! Every action runs to completion or fails with a [`WorkflowError`]; the
//! menu reports the failure and shows itself again. Only prompt failures
//! (terminal gone, Ctrl-C) leave the loop.

mod convert;

pub use convert::{FfmpegTranscoder, Transcoder, convert};

use crate::engine::{CodecFamily, EncodeError, EncoderTrial, JobError};
use crate::ui::{Notice, PromptError, Prompter};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("'{}' is not an existing file", .0.display())]
    InvalidInput(PathBuf),

    #[error("no encoders found for {0}")]
    NoEncoders(CodecFamily),

    #[error("{} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("{0} is not implemented yet")]
    NotImplemented(&'static str),

    #[error("cancelled")]
    Aborted,

    #[error("could not create output folder {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl WorkflowError {
    /// Extra advice shown under the error message
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Encode(e) => e.hint().map(|h| h.message()),
            Self::InvalidInput(_) => Some("Check the path; quotes around it are fine."),
            Self::OutputExists(_) => Some("Move or rename the existing file, or allow overwriting."),
            _ => None,
        }
    }
}

/// What the menu offers, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ChangeEncoder,
    Downscale,
    Upscale,
    ChangeFramerate,
    Exit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 5] = [
        Self::ChangeEncoder,
        Self::Downscale,
        Self::Upscale,
        Self::ChangeFramerate,
        Self::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ChangeEncoder => "Change video encoder/codec",
            Self::Downscale => "Downscale video resolution",
            Self::Upscale => "Upscale video resolution",
            Self::ChangeFramerate => "Change video framerate",
            Self::Exit => "Exit",
        }
    }
}

/// Collaborators shared by all actions for the lifetime of the menu
pub struct Workspace<'a> {
    /// Folder receiving converted files; created on first use
    pub output_dir: PathBuf,
    pub trial: &'a dyn EncoderTrial,
    pub transcoder: &'a dyn Transcoder,
}

/// Trim whitespace and one pair of matching surrounding quotes, as left by
/// dragging a file into a terminal. Empty input yields `None`.
pub fn clean_path_input(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed)
        .trim();
    if unquoted.is_empty() {
        None
    } else {
        Some(PathBuf::from(unquoted))
    }
}

/// Ask for an input file and check that it exists
pub(crate) fn ask_input_file(prompter: &mut dyn Prompter) -> Result<PathBuf, WorkflowError> {
    let raw = prompter
        .ask_text("Path to the video file", "")?
        .ok_or(WorkflowError::Aborted)?;
    let path = clean_path_input(&raw).ok_or(WorkflowError::Aborted)?;
    if !path.is_file() {
        return Err(WorkflowError::InvalidInput(path));
    }
    Ok(path)
}

/// Validates the input, then reports that the transformation does not exist yet
fn not_implemented(
    prompter: &mut dyn Prompter,
    action: MenuAction,
) -> Result<PathBuf, WorkflowError> {
    let input = ask_input_file(prompter)?;
    tracing::info!(input = %input.display(), action = action.label(), "placeholder action");
    Err(WorkflowError::NotImplemented(action.label()))
}

/// Run one menu action. `Ok` carries the produced output file.
pub fn run_action(
    prompter: &mut dyn Prompter,
    workspace: &Workspace<'_>,
    action: MenuAction,
) -> Result<PathBuf, WorkflowError> {
    match action {
        MenuAction::ChangeEncoder => convert(prompter, workspace),
        MenuAction::Downscale | MenuAction::Upscale | MenuAction::ChangeFramerate => {
            not_implemented(prompter, action)
        }
        MenuAction::Exit => Err(WorkflowError::Aborted),
    }
}

fn report_failure(prompter: &mut dyn Prompter, error: &WorkflowError) {
    match error {
        WorkflowError::Aborted => prompter.notify(Notice::Info, "Cancelled, back to the menu."),
        WorkflowError::NotImplemented(_) => prompter.notify(Notice::Warning, &error.to_string()),
        _ => {
            prompter.notify(Notice::Error, &error.to_string());
            if let WorkflowError::Encode(encode) = error {
                if let Some(tail) = encode.stderr_tail(5) {
                    prompter.notify(Notice::Info, &tail);
                }
            }
            if let Some(hint) = error.hint() {
                prompter.notify(Notice::Info, hint);
            }
        }
    }
}

/// The main loop. Returns when the user picks Exit or backs out of the menu.
pub fn run_menu(prompter: &mut dyn Prompter, workspace: &Workspace<'_>) -> Result<(), PromptError> {
    let labels: Vec<String> = MenuAction::ALL
        .iter()
        .map(|a| a.label().to_string())
        .collect();

    loop {
        let Some(index) = prompter.ask_choice("What would you like to do?", &labels, 0)? else {
            return Ok(());
        };
        let action = MenuAction::ALL
            .get(index)
            .copied()
            .unwrap_or(MenuAction::Exit);
        if action == MenuAction::Exit {
            return Ok(());
        }

        match run_action(prompter, workspace, action) {
            Ok(output) => {
                prompter.notify(
                    Notice::Success,
                    &format!("Saved to {}", output.display()),
                );
            }
            Err(WorkflowError::Prompt(e)) => return Err(e),
            Err(e) => {
                tracing::debug!(error = ?e, action = action.label(), "action failed");
                report_failure(prompter, &e);
            }
        }
    }
}
