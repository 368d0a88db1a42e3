// "Change video encoder/codec": the one fully implemented conversion

use super::{Workspace, WorkflowError, ask_input_file};
use crate::engine::{
    CodecFamily, ConversionJob, EncodeError, EncodeProgress, EncoderSelection, args, encoder_label,
    ffmpeg_info, parse_quality, probe, runner,
};
use crate::toolchain::ToolchainInstall;
use crate::ui::{Notice, Prompter};
use std::fs;
use std::path::{Path, PathBuf};

/// Runs the actual encode; the seam between the workflow and ffmpeg
pub trait Transcoder {
    /// Input duration in seconds, when it can be determined
    fn duration(&self, input: &Path) -> Option<f64>;

    /// Command line as shown to the user before confirming
    fn command_line(&self, job: &ConversionJob) -> String;

    fn encode(
        &self,
        job: &ConversionJob,
        duration_s: Option<f64>,
        on_progress: &mut dyn FnMut(&EncodeProgress),
    ) -> Result<EncodeProgress, EncodeError>;
}

/// ffmpeg for encoding, ffprobe for the input duration
pub struct FfmpegTranscoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(install: &ToolchainInstall) -> Self {
        Self {
            ffmpeg: install.ffmpeg.clone(),
            ffprobe: install.ffprobe.clone(),
        }
    }
}

impl Transcoder for FfmpegTranscoder {
    fn duration(&self, input: &Path) -> Option<f64> {
        match ffmpeg_info::probe_duration(&self.ffprobe, input) {
            Ok(d) if d > 0.0 => Some(d),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(input = %input.display(), error = %e, "could not read duration");
                None
            }
        }
    }

    fn command_line(&self, job: &ConversionJob) -> String {
        runner::command_line(&self.ffmpeg, job)
    }

    fn encode(
        &self,
        job: &ConversionJob,
        duration_s: Option<f64>,
        on_progress: &mut dyn FnMut(&EncodeProgress),
    ) -> Result<EncodeProgress, EncodeError> {
        runner::run_encode(&self.ffmpeg, job, duration_s, on_progress)
    }
}

/// `HH:MM:SS` for a number of seconds
pub(crate) fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Detail line under the progress bar
pub(crate) fn progress_detail(progress: &EncodeProgress) -> String {
    let mut parts = vec![match progress.duration_s {
        Some(total) => format!(
            "{} / {}",
            format_clock(progress.out_time_s),
            format_clock(total)
        ),
        None => format_clock(progress.out_time_s),
    }];
    if let Some(fps) = progress.fps {
        parts.push(format!("{:.1} fps", fps));
    }
    if let Some(speed) = progress.speed {
        parts.push(format!("{:.2}x", speed));
    }
    if let Some(eta) = progress.eta_s() {
        parts.push(format!("ETA {}", format_clock(eta)));
    }
    parts.join("  ")
}

fn choose<T: Copy>(
    prompter: &mut dyn Prompter,
    title: &str,
    items: &[T],
    label: impl Fn(&T) -> String,
    default: usize,
) -> Result<T, WorkflowError> {
    let labels: Vec<String> = items.iter().map(label).collect();
    let index = prompter
        .ask_choice(title, &labels, default)?
        .ok_or(WorkflowError::Aborted)?;
    items.get(index).copied().ok_or(WorkflowError::Aborted)
}

/// Re-asks until the answer is a whole number in 0-51
fn ask_quality(prompter: &mut dyn Prompter, default: u8) -> Result<u8, WorkflowError> {
    let initial = default.to_string();
    loop {
        let answer = prompter
            .ask_text("Quality (0-51, lower is better)", &initial)?
            .ok_or(WorkflowError::Aborted)?;
        match parse_quality(&answer) {
            Ok(quality) => return Ok(quality),
            Err(e) => prompter.notify(Notice::Error, &e.to_string()),
        }
    }
}

fn ask_output_dir(prompter: &mut dyn Prompter, default: &Path) -> Result<PathBuf, WorkflowError> {
    let answer = prompter
        .ask_text("Output folder", &default.to_string_lossy())?
        .ok_or(WorkflowError::Aborted)?;
    let dir = super::clean_path_input(&answer).unwrap_or_else(|| default.to_path_buf());
    fs::create_dir_all(&dir).map_err(|source| WorkflowError::OutputDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

/// Collect the choices, build the job, confirm, encode
pub fn convert(
    prompter: &mut dyn Prompter,
    workspace: &Workspace<'_>,
) -> Result<PathBuf, WorkflowError> {
    let input = ask_input_file(prompter)?;

    let family = choose(
        prompter,
        "Codec",
        &CodecFamily::ALL,
        |f| f.display_name().to_string(),
        0,
    )?;

    prompter.notify(Notice::Info, "Checking which encoders work on this machine...");
    let report = probe::probe(family, workspace.trial);
    if report.is_empty() {
        return Err(WorkflowError::NoEncoders(family));
    }
    if !report.verified {
        prompter.notify(
            Notice::Warning,
            "No encoder passed the test encode; showing every candidate anyway.",
        );
    }

    let labels: Vec<String> = report.encoders.iter().map(|e| encoder_label(e)).collect();
    let encoder_index = prompter
        .ask_choice("Encoder", &labels, 0)?
        .ok_or(WorkflowError::Aborted)?;
    let encoder = report
        .encoders
        .get(encoder_index)
        .ok_or(WorkflowError::Aborted)?
        .clone();

    let presets = args::presets_for(&encoder);
    let preset = choose(
        prompter,
        "Preset",
        presets,
        |p| p.to_string(),
        args::default_preset_index(presets),
    )?;

    let quality = ask_quality(prompter, family.default_quality())?;
    let output_dir = ask_output_dir(prompter, &workspace.output_dir)?;

    let selection = EncoderSelection::new(family, &encoder, preset, quality, &report.encoders)?;
    let job = ConversionJob::new(&input, &output_dir, selection)?;

    if job.output_exists() {
        let question = format!("{} exists. Overwrite?", job.output_path.display());
        if !prompter.ask_confirm(&question, false)? {
            return Err(WorkflowError::OutputExists(job.output_path));
        }
    }

    prompter.notify(
        Notice::Info,
        &workspace.transcoder.command_line(&job),
    );
    if !prompter.ask_confirm("Start encoding?", true)? {
        return Err(WorkflowError::Aborted);
    }

    let duration = workspace.transcoder.duration(&job.input_path);
    tracing::info!(
        input = %job.input_path.display(),
        output = %job.output_path.display(),
        encoder = %job.selection.encoder,
        ?duration,
        "encoding"
    );

    let title = format!("Encoding with {}", encoder_label(&job.selection.encoder));
    let mut sink = prompter.show_progress(&title)?;
    let result = workspace.transcoder.encode(&job, duration, &mut |progress| {
        sink.update(progress.fraction(), &progress_detail(progress));
    });
    match result {
        Ok(last) => {
            sink.finish(&format!("Encoded {}", format_clock(last.out_time_s)));
            Ok(job.output_path)
        }
        Err(e) => {
            sink.fail("Encoding stopped");
            Err(e.into())
        }
    }
}
