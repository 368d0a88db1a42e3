// Encoder argument construction - pure functions, no I/O

use thiserror::Error;

pub const QUALITY_MIN: u8 = 0;
pub const QUALITY_MAX: u8 = 51;

/// Speed/quality presets understood by the x264/x265-style software encoders
pub const SOFTWARE_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

/// Presets offered for hardware encoders
pub const HARDWARE_PRESETS: &[&str] = &["fast", "medium", "slow"];

/// Effort level passed to AV1 encoders
pub const AV1_CPU_USED: u8 = 4;

/// Open audio codec used whenever the container can't carry the source audio
pub const OPEN_AUDIO_CODEC: &str = "libopus";

/// Encoder family as classified from the encoder name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderKind {
    H264,
    H265,
    Vp9,
    Av1,
    /// Anything unrecognized: encoder selection and audio copy only
    Generic,
}

impl EncoderKind {
    /// Classify an encoder name. Checked in order: "264", then "265"/"hevc",
    /// then "vp9", then "av1"; case-insensitive.
    pub fn classify(encoder: &str) -> Self {
        let name = encoder.to_ascii_lowercase();
        if name.contains("264") {
            Self::H264
        } else if name.contains("265") || name.contains("hevc") {
            Self::H265
        } else if name.contains("vp9") {
            Self::Vp9
        } else if name.contains("av1") {
            Self::Av1
        } else {
            Self::Generic
        }
    }

    /// Container extension (with leading dot) for output files
    pub fn extension(&self) -> &'static str {
        match self {
            Self::H264 | Self::H265 | Self::Generic => ".mp4",
            Self::Vp9 => ".webm",
            Self::Av1 => ".mkv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QualityError {
    #[error("'{0}' is not a whole number")]
    NotANumber(String),

    #[error("quality {0} is outside 0-51")]
    OutOfRange(i64),
}

/// Parse user input as a quality value, rejecting anything outside [0, 51]
pub fn parse_quality(input: &str) -> Result<u8, QualityError> {
    let trimmed = input.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| QualityError::NotANumber(trimmed.to_string()))?;
    if value < QUALITY_MIN as i64 || value > QUALITY_MAX as i64 {
        return Err(QualityError::OutOfRange(value));
    }
    Ok(value as u8)
}

fn is_nvenc(encoder: &str) -> bool {
    encoder.to_ascii_lowercase().contains("nvenc")
}

/// Argument tokens for the encoder, in order
pub fn build_arg_list(encoder: &str, preset: &str, quality: u8) -> Vec<String> {
    let quality = quality.min(QUALITY_MAX).to_string();
    let mut args: Vec<String> = vec!["-c:v".into(), encoder.into()];

    match EncoderKind::classify(encoder) {
        EncoderKind::H264 | EncoderKind::H265 => {
            args.extend(["-preset".into(), preset.into(), "-crf".into(), quality]);
            if is_nvenc(encoder) {
                args.extend(["-rc".into(), "vbr".into()]);
            }
            args.extend(["-c:a".into(), "copy".into()]);
        }
        EncoderKind::Vp9 => {
            args.extend([
                "-b:v".into(),
                "0".into(),
                "-crf".into(),
                quality,
                "-row-mt".into(),
                "1".into(),
                "-c:a".into(),
                OPEN_AUDIO_CODEC.into(),
            ]);
        }
        EncoderKind::Av1 => {
            args.extend([
                "-crf".into(),
                quality,
                "-b:v".into(),
                "0".into(),
                "-cpu-used".into(),
                AV1_CPU_USED.to_string(),
                "-row-mt".into(),
                "1".into(),
                "-tiles".into(),
                "2x2".into(),
                "-c:a".into(),
                OPEN_AUDIO_CODEC.into(),
            ]);
        }
        EncoderKind::Generic => {
            args.extend(["-c:a".into(), "copy".into()]);
        }
    }

    args
}

/// The argument fragment handed to ffmpeg between input and output
pub fn build(encoder: &str, preset: &str, quality: u8) -> String {
    build_arg_list(encoder, preset, quality).join(" ")
}

/// Output container extension for an encoder; total over all names
pub fn output_extension(encoder: &str) -> &'static str {
    EncoderKind::classify(encoder).extension()
}

/// Preset ladder offered for an encoder: software (`lib*`) or hardware
pub fn presets_for(encoder: &str) -> &'static [&'static str] {
    if encoder.to_ascii_lowercase().starts_with("lib") {
        SOFTWARE_PRESETS
    } else {
        HARDWARE_PRESETS
    }
}

/// Default preset position within the ladder ("medium" in both)
pub fn default_preset_index(presets: &[&str]) -> usize {
    presets.iter().position(|p| *p == "medium").unwrap_or(0)
}
