// Encoding engine - catalog, probing, argument building, running ffmpeg. Independent of UI

pub mod args;
pub mod catalog;
pub mod ffmpeg_info;
pub mod job;
pub mod probe;
pub mod progress;
pub mod runner;

pub use args::{EncoderKind, QualityError, build, output_extension, parse_quality, presets_for};
pub use catalog::{CodecFamily, candidates_for, default_quality_for};
pub use job::{ConversionJob, EncoderSelection, JobError, output_path_for};
pub use probe::{EncoderTrial, FfmpegTrial, ProbeReport, encoder_label, order_hardware_first};
pub use progress::{EncodeProgress, ProgressParser};
pub use runner::{EncodeError, FailureHint, command_line, run_encode};
