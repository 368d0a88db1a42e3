//! Encoder availability probing against the installed ffmpeg

use super::catalog::CodecFamily;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Name markers of vendor hardware encoders, with the vendor they belong to
pub const HARDWARE_MARKERS: &[(&str, &str)] = &[
    ("nvenc", "NVIDIA"),
    ("qsv", "Intel Quick Sync"),
    ("amf", "AMD"),
];

/// Synthetic source used for trial encodes. Hardware encoders reject tiny
/// frames, so this is larger than strictly needed.
const TRIAL_SOURCE: &str = "color=c=black:s=256x256:r=1:d=1";

/// Decides whether one encoder is usable
pub trait EncoderTrial {
    fn supports(&self, encoder: &str) -> bool;
}

/// Runs a one-frame encode to a null muxer with the given ffmpeg binary
pub struct FfmpegTrial {
    ffmpeg: PathBuf,
}

impl FfmpegTrial {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    fn trial_command(&self, encoder: &str) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error"])
            .args(["-f", "lavfi", "-i", TRIAL_SOURCE])
            .args(["-frames:v", "1", "-an"])
            .args(["-c:v", encoder])
            .args(["-f", "null", "-"]);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl EncoderTrial for FfmpegTrial {
    fn supports(&self, encoder: &str) -> bool {
        match self.trial_command(encoder).output() {
            Ok(out) if out.status.success() => true,
            Ok(out) => {
                tracing::debug!(
                    encoder,
                    status = %out.status,
                    stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                    "trial encode failed"
                );
                false
            }
            Err(e) => {
                tracing::warn!(encoder, error = %e, "could not run trial encode");
                false
            }
        }
    }
}

/// Outcome of probing one codec family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Encoders to offer, hardware first
    pub encoders: Vec<String>,
    /// False when no candidate passed and the unfiltered list was returned
    pub verified: bool,
}

impl ProbeReport {
    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

pub fn is_hardware_encoder(encoder: &str) -> bool {
    vendor_of(encoder).is_some()
}

/// Vendor name for a hardware encoder, `None` for software encoders
pub fn vendor_of(encoder: &str) -> Option<&'static str> {
    let name = encoder.to_ascii_lowercase();
    HARDWARE_MARKERS
        .iter()
        .find(|(marker, _)| name.contains(marker))
        .map(|(_, vendor)| *vendor)
}

/// Menu label for an encoder, e.g. "h264_nvenc (NVIDIA)"
pub fn encoder_label(encoder: &str) -> String {
    match vendor_of(encoder) {
        Some(vendor) => format!("{} ({})", encoder, vendor),
        None => format!("{} (Software)", encoder),
    }
}

/// Stable partition: hardware encoders first, software after, each group
/// keeping its original relative order.
pub fn order_hardware_first<S: AsRef<str>>(encoders: Vec<S>) -> Vec<S> {
    let (mut hardware, software): (Vec<S>, Vec<S>) = encoders
        .into_iter()
        .partition(|e| is_hardware_encoder(e.as_ref()));
    hardware.extend(software);
    hardware
}

/// Filter `candidates` to those the trial accepts, hardware first.
/// Falls back to the unfiltered list when nothing passes.
pub fn probe_candidates(candidates: &[&str], trial: &dyn EncoderTrial) -> ProbeReport {
    let supported: Vec<String> = candidates
        .iter()
        .filter(|name| trial.supports(name))
        .map(|name| name.to_string())
        .collect();

    if supported.is_empty() {
        tracing::warn!(?candidates, "no encoder passed the trial encode");
        return ProbeReport {
            encoders: candidates.iter().map(|s| s.to_string()).collect(),
            verified: false,
        };
    }

    let encoders = order_hardware_first(supported);
    tracing::info!(?encoders, "usable encoders");
    ProbeReport {
        encoders,
        verified: true,
    }
}

/// Probe all catalog candidates of a codec family
pub fn probe(family: CodecFamily, trial: &dyn EncoderTrial) -> ProbeReport {
    probe_candidates(family.candidates(), trial)
}
