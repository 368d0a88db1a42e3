use clap::{ArgAction, Parser};
use ffwizard::config::Overrides;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffwizard")]
#[command(about = "Interactive video re-encoder that sets up its own ffmpeg", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding ffmpeg and ffprobe (default: "ffmpeg" next to this program)
    #[arg(long, value_name = "DIR")]
    pub toolchain_dir: Option<PathBuf>,

    /// Folder in which the FFWizard output folder is created (default: your Videos folder)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Show where the toolchain is and which version it is, then exit
    #[arg(long)]
    pub check: bool,

    /// Log to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            toolchain_dir: self.toolchain_dir.clone(),
            output_root: self.output_dir.clone(),
            toolchain_url: None,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
