use super::platform::PlatformTarget;
use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};

/// Name of the install directory created next to the executable
pub const INSTALL_DIR_NAME: &str = "ffmpeg";

pub const TRANSCODER: &str = "ffmpeg";
pub const INSPECTOR: &str = "ffprobe";

/// On-disk location of the transcoder and inspector binaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInstall {
    pub install_dir: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolchainInstall {
    /// Binary paths a complete install in `install_dir` would have
    pub fn expected(install_dir: &Path, platform: &PlatformTarget) -> Self {
        Self {
            install_dir: install_dir.to_path_buf(),
            ffmpeg: install_dir.join(platform.executable_name(TRANSCODER)),
            ffprobe: install_dir.join(platform.executable_name(INSPECTOR)),
        }
    }

    /// Both binaries exist on disk
    pub fn is_installed(&self) -> io::Result<bool> {
        Ok(self.ffmpeg.try_exists()? && self.ffprobe.try_exists()?)
    }

    /// Binaries that are not present yet
    pub fn missing(&self) -> Vec<&Path> {
        [self.ffmpeg.as_path(), self.ffprobe.as_path()]
            .into_iter()
            .filter(|p| !p.exists())
            .collect()
    }
}

/// Result of looking for the toolchain on disk
#[derive(Debug, Clone)]
pub struct LocateResult {
    pub install: ToolchainInstall,
    pub present: bool,
}

/// Default install directory: `<directory of the running executable>/ffmpeg`
pub fn default_install_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Could not determine program location")?;
    let dir = exe
        .parent()
        .context("Program location has no parent directory")?;
    Ok(dir.join(INSTALL_DIR_NAME))
}

/// Compute the expected binary paths inside `install_dir` and report whether
/// both already exist.
pub fn locate(install_dir: &Path, platform: &PlatformTarget) -> io::Result<LocateResult> {
    let install = ToolchainInstall::expected(install_dir, platform);
    let present = install.is_installed()?;

    tracing::debug!(
        dir = %install_dir.display(),
        present,
        "located toolchain"
    );

    Ok(LocateResult { install, present })
}
