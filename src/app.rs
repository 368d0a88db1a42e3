use crate::cli::Cli;
use anyhow::{Context, Result};
use ffwizard::config::{Overrides, Settings};
use ffwizard::engine::{FfmpegTrial, ffmpeg_info};
use ffwizard::toolchain::{
    self, DownloadProgress, HttpDownloader, LocateResult, PlatformTarget, ToolchainInstall,
};
use ffwizard::ui::{Notice, PromptError, Prompter, TerminalPrompter};
use ffwizard::workflow::{self, FfmpegTranscoder, Workspace};
use std::io::{self, IsTerminal};
use std::process;
use tracing::Level;

pub fn run(cli: Cli) {
    init_logging(cli.verbose);

    let settings = match Settings::resolve(cli.overrides(), Overrides::from_env()) {
        Ok(settings) => settings,
        Err(e) => fail_setup(&format!("{:#}", e)),
    };
    tracing::debug!(?settings, "resolved settings");

    let platform = PlatformTarget::current();

    if cli.check {
        handle_check(&settings, &platform);
    }

    let mut prompter = TerminalPrompter::new();
    let install = match setup_toolchain(&settings, &platform, &mut prompter) {
        Ok(install) => install,
        Err(e) => fail_setup(&format!("{:#}", e)),
    };

    let trial = FfmpegTrial::new(&install.ffmpeg);
    let transcoder = FfmpegTranscoder::new(&install);
    let workspace = Workspace {
        output_dir: settings.output_dir,
        trial: &trial,
        transcoder: &transcoder,
    };

    match workflow::run_menu(&mut prompter, &workspace) {
        Ok(()) => println!("Bye."),
        Err(PromptError::Interrupted) => process::exit(130),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // A subscriber may already be installed
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

/// Setup failures end the program: report, wait for Enter, exit 1
fn fail_setup(message: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("Press Enter to exit.");
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
    process::exit(1);
}

fn format_mib(bytes: u64) -> String {
    format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
}

fn download_detail(progress: &DownloadProgress) -> String {
    match progress.total {
        Some(total) => format!("{} / {}", format_mib(progress.received), format_mib(total)),
        None => format_mib(progress.received),
    }
}

fn setup_toolchain(
    settings: &Settings,
    platform: &PlatformTarget,
    prompter: &mut dyn Prompter,
) -> Result<ToolchainInstall> {
    let dir = &settings.toolchain_dir;

    let located = toolchain::locate(dir, platform).unwrap_or_else(|e| {
        tracing::warn!(dir = %dir.display(), error = %e, "could not inspect toolchain directory");
        LocateResult {
            install: ToolchainInstall::expected(dir, platform),
            present: false,
        }
    });

    let install = if located.present {
        located.install
    } else {
        prompter.notify(
            Notice::Info,
            &format!("ffmpeg was not found in {}, downloading it", dir.display()),
        );
        let downloader = HttpDownloader::new()?;
        let mut sink = prompter.show_progress("Downloading ffmpeg")?;
        let result = toolchain::ensure_toolchain(
            located,
            platform,
            settings.toolchain_url.as_deref(),
            &downloader,
            &mut |progress| sink.update(progress.fraction(), &download_detail(&progress)),
        );
        match &result {
            Ok(_) => sink.finish("ffmpeg installed"),
            Err(_) => sink.fail("Download failed"),
        }
        result.context("Could not set up ffmpeg")?
    };

    let version = ffmpeg_info::tool_version(&install.ffmpeg)
        .with_context(|| format!("ffmpeg at {} does not run", install.ffmpeg.display()))?;
    tracing::info!(%version, dir = %install.install_dir.display(), "toolchain ready");
    Ok(install)
}

fn handle_check(settings: &Settings, platform: &PlatformTarget) -> ! {
    println!("Platform: {}", platform);
    println!("Toolchain directory: {}", settings.toolchain_dir.display());
    println!("Output folder: {}", settings.output_dir.display());

    let found = match toolchain::locate(&settings.toolchain_dir, platform) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    let mut ok = true;
    for tool in [&found.install.ffmpeg, &found.install.ffprobe] {
        if !tool.exists() {
            println!("missing: {}", tool.display());
            ok = false;
            continue;
        }
        match ffmpeg_info::tool_version(tool) {
            Ok(version) => println!("{}", version),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ok = false;
            }
        }
    }

    process::exit(if ok { 0 } else { 1 });
}
