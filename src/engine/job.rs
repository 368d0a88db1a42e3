use super::args::{self, QUALITY_MAX};
use super::catalog::CodecFamily;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("encoder '{encoder}' is not available for {family}")]
    EncoderNotOffered { encoder: String, family: CodecFamily },

    #[error("quality {0} is outside 0-51")]
    QualityOutOfRange(u8),

    #[error("input file does not exist: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("output folder does not exist: {}", .0.display())]
    OutputDirMissing(PathBuf),
}

/// Everything that determines the encoder arguments of one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSelection {
    pub family: CodecFamily,
    pub encoder: String,
    pub preset: String,
    pub quality: u8,
}

impl EncoderSelection {
    /// `offered` is the probe result the user chose from; the encoder must be in it.
    pub fn new(
        family: CodecFamily,
        encoder: &str,
        preset: &str,
        quality: u8,
        offered: &[String],
    ) -> Result<Self, JobError> {
        if !offered.iter().any(|e| e == encoder) {
            return Err(JobError::EncoderNotOffered {
                encoder: encoder.to_string(),
                family,
            });
        }
        if quality > QUALITY_MAX {
            return Err(JobError::QualityOutOfRange(quality));
        }
        Ok(Self {
            family,
            encoder: encoder.to_string(),
            preset: preset.to_string(),
            quality,
        })
    }

    pub fn argument_fragment(&self) -> String {
        args::build(&self.encoder, &self.preset, self.quality)
    }

    pub fn extension(&self) -> &'static str {
        args::output_extension(&self.encoder)
    }
}

/// A single input → output conversion, built and consumed within one workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub selection: EncoderSelection,
    pub argument_fragment: String,
}

impl ConversionJob {
    /// Validates that the input exists and the output folder is present.
    pub fn new(
        input_path: &Path,
        output_dir: &Path,
        selection: EncoderSelection,
    ) -> Result<Self, JobError> {
        if !input_path.is_file() {
            return Err(JobError::InputMissing(input_path.to_path_buf()));
        }
        if !output_dir.is_dir() {
            return Err(JobError::OutputDirMissing(output_dir.to_path_buf()));
        }

        let output_path = output_path_for(input_path, output_dir, &selection.encoder);
        let argument_fragment = selection.argument_fragment();

        Ok(Self {
            input_path: input_path.to_path_buf(),
            output_path,
            selection,
            argument_fragment,
        })
    }

    pub fn output_exists(&self) -> bool {
        self.output_path.exists()
    }
}

/// `<output_dir>/<input stem>_<encoder><ext>`
pub fn output_path_for(input: &Path, output_dir: &Path, encoder: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!(
        "{}_{}{}",
        stem,
        encoder,
        args::output_extension(encoder)
    ))
}
