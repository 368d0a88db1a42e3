use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

/// First line of `<tool> -version`, e.g. "ffmpeg version 7.1 Copyright ..."
pub fn tool_version(tool: &Path) -> Result<String> {
    let output = Command::new(tool)
        .arg("-version")
        .output()
        .with_context(|| format!("Failed to execute {}", tool.display()))?;

    if !output.status.success() {
        anyhow::bail!(
            "{} -version failed with status: {}",
            tool.display(),
            output.status
        );
    }

    Ok(first_version_line(&String::from_utf8_lossy(&output.stdout)))
}

fn first_version_line(output: &str) -> String {
    output
        .lines()
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("Unknown version")
        .to_string()
}

/// Input duration in seconds, via ffprobe's JSON format section
pub fn probe_duration(ffprobe: &Path, input: &Path) -> Result<f64> {
    let output = Command::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(input)
        .output()
        .context("Failed to execute ffprobe")?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed for {}: {}",
            input.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    parse_ffprobe_duration(&String::from_utf8_lossy(&output.stdout))
}

pub fn parse_ffprobe_duration(json: &str) -> Result<f64> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).context("Failed to parse ffprobe JSON output")?;

    let duration_str = probe
        .format
        .duration
        .context("No duration found in ffprobe output")?;

    duration_str
        .parse::<f64>()
        .context("Failed to parse duration as float")
}
