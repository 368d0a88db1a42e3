use crate::common::assertions::{assert_args_contain, assert_flag_value};
use crate::common::fakes::{
    Answer::{Back, Choose, Confirm, Interrupt, Pick},
    EncodeOutcome, FakeTranscoder, FixedTrial, ScriptedPrompter, text,
};
use ffwizard::ui::{Notice, PromptError};
use ffwizard::workflow::{self, Workspace, WorkflowError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    input: PathBuf,
    output_dir: PathBuf,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("clip.mp4");
    fs::write(&input, b"not really a video").unwrap();
    let output_dir = temp.path().join("out");
    Fixture {
        input,
        output_dir,
        _temp: temp,
    }
}

fn workspace<'a>(
    output_dir: &Path,
    trial: &'a FixedTrial,
    transcoder: &'a FakeTranscoder,
) -> Workspace<'a> {
    Workspace {
        output_dir: output_dir.to_path_buf(),
        trial,
        transcoder,
    }
}

fn quoted(path: &Path) -> String {
    format!("'{}'", path.display())
}

#[test]
fn test_h264_conversion_end_to_end() {
    let fx = fixture();
    let trial = FixedTrial::new(&["libx264", "h264_nvenc"]);
    let transcoder = FakeTranscoder::new(EncodeOutcome::Succeed);
    let mut prompter = ScriptedPrompter::new([
        Choose(0),
        text(quoted(&fx.input)),
        Choose(0),
        Pick("libx264"),
        Pick("medium"),
        text("99"),
        text("23"),
        text(""),
        Confirm(true),
    ]);

    workflow::run_menu(&mut prompter, &workspace(&fx.output_dir, &trial, &transcoder)).unwrap();

    let jobs = transcoder.jobs.borrow();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.argument_fragment, "-c:v libx264 -preset medium -crf 23 -c:a copy");
    assert_eq!(job.output_path, fx.output_dir.join("clip_libx264.mp4"));
    assert_eq!(job.input_path, fx.input);
    assert!(job.output_path.exists());

    // The rejected quality was reported and asked again
    assert!(prompter.has_notice(Notice::Error, "outside 0-51"));
    assert!(prompter.has_notice(Notice::Success, "Saved to"));
    assert!(prompter.has_notice(Notice::Info, "-c:v libx264"));

    // Hardware first in the encoder list, and only the accepted ones
    assert_eq!(
        trial.asked.borrow().as_slice(),
        ["libx264", "h264_nvenc", "h264_qsv", "h264_amf"]
    );

    assert_eq!(prompter.progress.titles, vec!["Encoding with libx264 (Software)"]);
    assert_eq!(
        prompter.progress.updates,
        vec![Some(0.25), Some(0.5), Some(1.0)]
    );
    assert_eq!(prompter.progress.finished, vec!["Encoded 00:00:10"]);
    assert!(prompter.progress.failed.is_empty());

    // Script consumed, then the menu came back once more and was left
    assert_eq!(prompter.remaining(), 0);
    assert_eq!(prompter.questions.last().unwrap(), "What would you like to do?");
}

#[test]
fn test_hardware_encoder_flags() {
    let fx = fixture();
    let trial = FixedTrial::new(&["libx265", "hevc_nvenc"]);
    let transcoder = FakeTranscoder::new(EncodeOutcome::Succeed);
    let mut prompter = ScriptedPrompter::new([
        text(fx.input.to_string_lossy()),
        Pick("H.265"),
        Choose(0),
        Pick("slow"),
        text(""),
        text(""),
        Confirm(true),
    ]);

    let output =
        workflow::convert(&mut prompter, &workspace(&fx.output_dir, &trial, &transcoder)).unwrap();

    assert_eq!(output, fx.output_dir.join("clip_hevc_nvenc.mp4"));
    let args = transcoder.jobs.borrow()[0].argument_fragment.clone();
    assert_flag_value(&args, "-c:v", "hevc_nvenc");
    assert_flag_value(&args, "-preset", "slow");
    // Family default quality
    assert_flag_value(&args, "-crf", "28");
    assert_args_contain(&args, "-rc vbr");
}

#[test]
fn test_av1_goes_to_matroska() {
    let fx = fixture();
    let trial = FixedTrial::new(&["libsvtav1"]);
    let transcoder = FakeTranscoder::new(EncodeOutcome::Succeed);
    let mut prompter = ScriptedPrompter::new([
        text(fx.input.to_string_lossy()),
        Pick("AV1"),
        Choose(0),
        Pick("medium"),
        text("35"),
        text(""),
        Confirm(true),
    ]);

    let output =
        workflow::convert(&mut prompter, &workspace(&fx.output_dir, &trial, &transcoder)).unwrap();

    assert_eq!(output, fx.output_dir.join("clip_libsvtav1.mkv"));
    assert_eq!(
        transcoder.jobs.borrow()[0].argument_fragment,
        "-c:v libsvtav1 -crf 35 -b:v 0 -cpu-used 4 -row-mt 1 -tiles 2x2 -c:a libopus"
    );
}

#[test]
fn test_declined_overwrite_keeps_existing_file() {
    let fx = fixture();
    fs::create_dir_all(&fx.output_dir).unwrap();
    let existing = fx.output_dir.join("clip_libx264.mp4");
    fs::write(&existing, b"keep me").unwrap();

    let trial = FixedTrial::new(&["libx264"]);
    let transcoder = FakeTranscoder::new(EncodeOutcome::Succeed);
    let mut prompter = ScriptedPrompter::new([
        Choose(0),
        text(fx.input.to_string_lossy()),
        Choose(0),
        Choose(0),
        Pick("medium"),
        text(""),
        text(""),
        Confirm(false),
    ]);

    workflow::run_menu(&mut prompter, &workspace(&fx.output_dir, &trial, &transcoder)).unwrap();

    assert!(transcoder.jobs.borrow().is_empty());
    assert_eq!(fs::read(&existing).unwrap(), b"keep me");
    assert!(prompter.has_notice(Notice::Error, "already exists"));
    assert!(prompter.questions.iter().any(|q| q.ends_with("exists. Overwrite?")));
}

#[test]
fn test_accepted_overwrite_replaces_file() {
    let fx = fixture();
    fs::create_dir_all(&fx.output_dir).unwrap();
    let existing = fx.output_dir.join("clip_libx264.mp4");
    fs::write(&existing, b"old").unwrap();

    let trial = FixedTrial::new(&["libx264"]);
    let transcoder = FakeTranscoder::new(EncodeOutcome::Succeed);
    let mut prompter = ScriptedPrompter::new([
        text(fx.input.to_string_lossy()),
        Choose(0),
        Choose(0),
        Pick("veryslow"),
        text(""),
        text(""),
        Confirm(true),
        Confirm(true),
    ]);

    let output =
        workflow::convert(&mut prompter, &workspace(&fx.output_dir, &trial, &transcoder)).unwrap();

    assert_eq!(output, existing);
    assert_eq!(fs::read(&existing).unwrap(), b"encoded");
}

#[test]
fn test_encode_failure_reports_hint() {
    let fx = fixture();
    let trial = FixedTrial::new(&["libx264", "h264_nvenc"]);
    let transcoder =
        FakeTranscoder::new(EncodeOutcome::FailWith("frame=0\nUnknown encoder 'h264_nvenc'\n"));
    let mut prompter = ScriptedPrompter::new([
        Choose(0),
        text(fx.input.to_string_lossy()),
        Choose(0),
        Pick("h264_nvenc"),
        Pick("medium"),
        text(""),
        text(""),
        Confirm(true),
    ]);

    workflow::run_menu(&mut prompter, &workspace(&fx.output_dir, &trial, &transcoder)).unwrap();

    assert_eq!(
        transcoder.jobs.borrow()[0].argument_fragment,
        "-c:v h264_nvenc -preset medium -crf 23 -rc vbr -c:a copy"
    );
    assert!(prompter.has_notice(Notice::Error, "encoding failed: ffmpeg exited with code 1"));
    assert!(prompter.has_notice(Notice::Info, "Unknown encoder 'h264_nvenc'"));
    assert!(prompter.has_notice(Notice::Info, "not available"));
    assert!(!prompter.has_notice(Notice::Success, "Saved to"));
    assert_eq!(prompter.progress.failed, vec!["Encoding stopped"]);
    assert!(prompter.progress.finished.is_empty());
}

#[test]
fn test_unverified_probe_warns_and_lists_all() {
    let fx = fixture();
    let trial = FixedTrial::new(&[]);
    let transcoder = FakeTranscoder::new(EncodeOutcome::Succeed);
    let mut prompter = ScriptedPrompter::new([
        text(fx.input.to_string_lossy()),
        Pick("VP9"),
        Pick("libvpx-vp9"),
        Pick("medium"),
        text(""),
        text(""),
        Confirm(true),
    ]);

    let output =
        workflow::convert(&mut prompter, &workspace(&fx.output_dir, &trial, &transcoder)).unwrap();

    assert!(prompter.has_notice(Notice::Warning, "No encoder passed the test encode"));
    assert_eq!(output, fx.output_dir.join("clip_libvpx-vp9.webm"));
    assert_eq!(
        transcoder.jobs.borrow()[0].argument_fragment,
        "-c:v libvpx-vp9 -b:v 0 -crf 31 -row-mt 1 -c:a libopus"
    );
}

#[test]
fn test_backing_out_cancels_action() {
    let fx = fixture();
    let trial = FixedTrial::new(&["libx264"]);
    let transcoder = FakeTranscoder::new(EncodeOutcome::Succeed);
    let mut prompter = ScriptedPrompter::new([
        text(fx.input.to_string_lossy()),
        Choose(0),
        Back,
    ]);

    let err =
        workflow::convert(&mut prompter, &workspace(&fx.output_dir, &trial, &transcoder))
            .unwrap_err();
    assert!(matches!(err, WorkflowError::Aborted));
    assert!(transcoder.jobs.borrow().is_empty());
    // Nothing was written before the job was confirmed
    assert!(!fx.output_dir.exists());
}

#[test]
fn test_declining_start_returns_to_menu() {
    let fx = fixture();
    let trial = FixedTrial::new(&["libx264"]);
    let transcoder = FakeTranscoder::new(EncodeOutcome::Succeed);
    let mut prompter = ScriptedPrompter::new([
        Choose(0),
        text(fx.input.to_string_lossy()),
        Choose(0),
        Choose(0),
        Pick("medium"),
        text(""),
        text(""),
        Confirm(false),
        Pick("Exit"),
    ]);

    workflow::run_menu(&mut prompter, &workspace(&fx.output_dir, &trial, &transcoder)).unwrap();

    assert!(transcoder.jobs.borrow().is_empty());
    assert!(prompter.has_notice(Notice::Info, "Cancelled, back to the menu."));
    assert_eq!(prompter.remaining(), 0);
}

#[test]
fn test_interrupt_leaves_menu() {
    let fx = fixture();
    let trial = FixedTrial::new(&["libx264"]);
    let transcoder = FakeTranscoder::new(EncodeOutcome::Succeed);
    let mut prompter = ScriptedPrompter::new([
        Choose(0),
        text(fx.input.to_string_lossy()),
        Interrupt,
        Pick("Exit"),
    ]);

    let result =
        workflow::run_menu(&mut prompter, &workspace(&fx.output_dir, &trial, &transcoder));

    assert!(matches!(result, Err(PromptError::Interrupted)));
    assert_eq!(prompter.remaining(), 1);
}
