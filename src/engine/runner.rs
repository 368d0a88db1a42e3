//! Drives one ffmpeg encode and reports progress through a callback.

use super::job::ConversionJob;
use super::progress::{EncodeProgress, ProgressParser};
use std::ffi::{OsStr, OsString};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("lost contact with the encoder process: {0}")]
    Io(#[source] io::Error),

    #[error("ffmpeg {}", describe_exit(.code))]
    Failed { code: Option<i32>, stderr: String },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// Extra advice attached to an encode failure, chosen from the stderr text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureHint {
    EncoderUnavailable,
    InvalidInput,
    HardwareInit,
}

const ENCODER_UNAVAILABLE_MARKERS: &[&str] =
    &["Unknown encoder", "Encoder not found", "encoder not found"];
const INVALID_INPUT_MARKERS: &[&str] = &[
    "Invalid data found",
    "No such file",
    "could not find codec parameters",
];
const HARDWARE_INIT_MARKERS: &[&str] = &[
    "Cannot load",
    "No NVENC capable devices",
    "Error initializing",
];

impl FailureHint {
    pub fn classify(stderr: &str) -> Option<Self> {
        let has = |markers: &[&str]| markers.iter().any(|m| stderr.contains(m));
        if has(ENCODER_UNAVAILABLE_MARKERS) {
            Some(Self::EncoderUnavailable)
        } else if has(INVALID_INPUT_MARKERS) {
            Some(Self::InvalidInput)
        } else if has(HARDWARE_INIT_MARKERS) {
            Some(Self::HardwareInit)
        } else {
            None
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::EncoderUnavailable => {
                "This encoder is not available in the installed ffmpeg. Pick another encoder."
            }
            Self::InvalidInput => "The input does not look like a readable video file.",
            Self::HardwareInit => {
                "The hardware encoder could not start. Check the GPU driver or pick a software encoder."
            }
        }
    }
}

impl EncodeError {
    pub fn hint(&self) -> Option<FailureHint> {
        match self {
            Self::Failed { stderr, .. } => FailureHint::classify(stderr),
            _ => None,
        }
    }

    /// Last `n` non-empty stderr lines, for display
    pub fn stderr_tail(&self, n: usize) -> Option<String> {
        let Self::Failed { stderr, .. } = self else {
            return None;
        };
        let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return None;
        }
        Some(lines[lines.len().saturating_sub(n)..].join("\n"))
    }
}

fn fragment_tokens(fragment: &str) -> Vec<String> {
    shlex::split(fragment).unwrap_or_else(|| {
        tracing::warn!(fragment, "unbalanced quoting in argument fragment");
        fragment.split_whitespace().map(str::to_string).collect()
    })
}

fn encode_args(job: &ConversionJob) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(job.input_path.clone().into_os_string());
    args.extend(
        fragment_tokens(&job.argument_fragment)
            .into_iter()
            .map(OsString::from),
    );
    args.extend(["-progress", "pipe:1", "-nostats"].map(OsString::from));
    args.push(job.output_path.clone().into_os_string());
    args
}

pub fn encode_command(ffmpeg: &Path, job: &ConversionJob) -> Command {
    let mut cmd = Command::new(ffmpeg);
    cmd.args(encode_args(job));
    cmd
}

/// Shell-quoted command line, shown to the user before running
pub fn command_line(ffmpeg: &Path, job: &ConversionJob) -> String {
    let args = encode_args(job);
    let tokens: Vec<String> = std::iter::once(ffmpeg.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(OsStr::to_string_lossy)
        .map(|t| t.into_owned())
        .collect();
    shlex::try_join(tokens.iter().map(String::as_str)).unwrap_or_else(|_| tokens.join(" "))
}

/// Run the encode to completion. `on_progress` is called after every
/// `-progress` line; the final snapshot is returned on success.
pub fn run_encode(
    ffmpeg: &Path,
    job: &ConversionJob,
    duration_s: Option<f64>,
    on_progress: &mut dyn FnMut(&EncodeProgress),
) -> Result<EncodeProgress, EncodeError> {
    let mut cmd = encode_command(ffmpeg, job);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!(command = %command_line(ffmpeg, job), "starting encode");

    let mut child = cmd.spawn().map_err(|source| EncodeError::Spawn {
        program: ffmpeg.to_path_buf(),
        source,
    })?;

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| EncodeError::Io(io::Error::other("stderr was not captured")))?;
    let stderr_thread = std::thread::spawn(move || {
        let mut stderr_output = String::new();
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            stderr_output.push_str(&line);
            stderr_output.push('\n');
        }
        stderr_output
    });

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| EncodeError::Io(io::Error::other("stdout was not captured")))?;
    let mut parser = ProgressParser::new();

    for line in BufReader::new(stdout).lines().map_while(Result::ok) {
        parser.parse_line(&line);
        on_progress(&parser.snapshot(duration_s));
    }

    let status = child.wait().map_err(EncodeError::Io)?;
    let stderr_output = stderr_thread
        .join()
        .unwrap_or_else(|_| "Failed to capture stderr".to_string());

    if !status.success() {
        tracing::warn!(%status, "encode failed");
        return Err(EncodeError::Failed {
            code: status.code(),
            stderr: stderr_output,
        });
    }

    tracing::info!(output = %job.output_path.display(), "encode finished");
    let mut last = parser.snapshot(duration_s);
    last.complete = true;
    Ok(last)
}
