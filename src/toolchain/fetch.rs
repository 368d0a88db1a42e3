//! Downloading and installing the ffmpeg toolchain.
//!
//! Each release archive is streamed into the install directory and unpacked
//! into a scratch `extract-*` directory. The two binaries are lifted out of
//! it (from `ffmpeg-*/bin` or the scratch root, depending on the platform's
//! layout) into the flat install directory, and the rest is removed.

use super::archive::{self, ArchiveFormat, ArchiveLayout};
use super::error::FetchError;
use super::locator::{INSPECTOR, LocateResult, TRANSCODER, ToolchainInstall};
use super::platform::{Architecture, OperatingSystem, PlatformTarget};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use uuid::Uuid;
use walkdir::WalkDir;

/// Prefix of the top-level directory inside the tree-layout archives
pub const EXTRACTED_DIR_PREFIX: &str = "ffmpeg";

/// Name of the directory holding the executables inside that directory
pub const BIN_DIR: &str = "bin";

const CHUNK_SIZE: usize = 64 * 1024;

/// One release archive to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainArchive {
    pub url: String,
    pub format: ArchiveFormat,
}

/// Where to fetch the toolchain for one platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainSource {
    pub archives: Vec<ToolchainArchive>,
    pub layout: ArchiveLayout,
}

/// Bytes received so far; `total` is `None` when the server sent no length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub received: u64,
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// Fraction in [0, 1], or `None` when indeterminate
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some((self.received as f64 / total as f64).min(1.0)),
            _ => None,
        }
    }
}

/// Streams a URL to a file on disk
pub trait Downloader {
    /// Write the body of `url` into `dest`, reporting progress as bytes arrive.
    /// Returns the number of bytes written.
    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<u64, FetchError>;
}

/// Blocking HTTP downloader
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, FetchError> {
        // No request timeout: a stalled download blocks until the server gives up
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Download {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<u64, FetchError> {
        let download_err = |source| FetchError::Download {
            url: url.to_string(),
            source,
        };

        let mut response = self.client.get(url).send().map_err(download_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length();
        let mut file =
            File::create(dest).map_err(|e| FetchError::io("Failed to create download file", dest, e))?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut received = 0u64;
        progress(DownloadProgress { received, total });

        loop {
            let n = response
                .read(&mut buf)
                .map_err(|e| FetchError::io("Failed to read download stream", dest, e))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])
                .map_err(|e| FetchError::io("Failed to write download file", dest, e))?;
            received += n as u64;
            progress(DownloadProgress { received, total });
        }

        file.flush()
            .map_err(|e| FetchError::io("Failed to write download file", dest, e))?;

        tracing::info!(url, bytes = received, "download complete");
        Ok(received)
    }
}

const WINDOWS_X64: &[&str] =
    &["https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-win64-gpl.zip"];
const WINDOWS_ARM64: &[&str] =
    &["https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-winarm64-gpl.zip"];
const LINUX_X64: &[&str] =
    &["https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-linux64-gpl.tar.xz"];
const LINUX_ARM64: &[&str] =
    &["https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-linuxarm64-gpl.tar.xz"];
// macOS builds ship each binary in its own zip
const MACOS_X64: &[&str] = &[
    "https://www.osxexperts.net/ffmpeg71intel.zip",
    "https://www.osxexperts.net/ffprobe71intel.zip",
];
const MACOS_ARM64: &[&str] = &[
    "https://www.osxexperts.net/ffmpeg80arm.zip",
    "https://www.osxexperts.net/ffprobe80arm.zip",
];

/// Release archives and their layout for a platform
fn release_for(
    platform: &PlatformTarget,
) -> Result<(&'static [&'static str], ArchiveLayout), FetchError> {
    use Architecture::*;
    use OperatingSystem::*;

    let release = match (platform.os, platform.arch) {
        (Some(Windows), Some(X64)) => (WINDOWS_X64, ArchiveLayout::BuildTree),
        (Some(Windows), Some(Arm64)) => (WINDOWS_ARM64, ArchiveLayout::BuildTree),
        (Some(Linux), Some(X64)) => (LINUX_X64, ArchiveLayout::BuildTree),
        (Some(Linux), Some(Arm64)) => (LINUX_ARM64, ArchiveLayout::BuildTree),
        (Some(MacOs), Some(X64)) => (MACOS_X64, ArchiveLayout::Flat),
        (Some(MacOs), Some(Arm64)) => (MACOS_ARM64, ArchiveLayout::Flat),
        _ => {
            return Err(FetchError::PlatformNotSupported {
                platform: platform.to_string(),
            });
        }
    };
    Ok(release)
}

/// Download URL for a platform. Pure; unsupported pairs fail without I/O.
///
/// On macOS this is the transcoder archive; the inspector comes from a
/// second archive listed by [`select_source`].
pub fn select_download_url(platform: &PlatformTarget) -> Result<&'static str, FetchError> {
    let (archives, _) = release_for(platform)?;
    archives.first().copied().ok_or_else(|| FetchError::PlatformNotSupported {
        platform: platform.to_string(),
    })
}

/// Resolve the archives to fetch, honoring a user-supplied URL.
///
/// The override replaces every archive with a single one and only applies
/// on a recognized OS; an unknown OS still fails before any network access.
/// The expected layout stays the platform's own.
pub fn select_source(
    platform: &PlatformTarget,
    url_override: Option<&str>,
) -> Result<ToolchainSource, FetchError> {
    let (defaults, layout) = release_for(platform)?;
    let urls: Vec<&str> = match url_override {
        Some(url) => vec![url],
        None => defaults.to_vec(),
    };
    let archives = urls
        .into_iter()
        .map(|url| ToolchainArchive {
            url: url.to_string(),
            format: ArchiveFormat::from_url(url),
        })
        .collect();
    Ok(ToolchainSource { archives, layout })
}

/// Download, unpack and install the toolchain into `install_dir`.
pub fn fetch(
    install_dir: &Path,
    platform: &PlatformTarget,
    url_override: Option<&str>,
    downloader: &dyn Downloader,
    progress: &mut dyn FnMut(DownloadProgress),
) -> Result<ToolchainInstall, FetchError> {
    let source = select_source(platform, url_override)?;
    tracing::info!(
        archives = source.archives.len(),
        layout = ?source.layout,
        %platform,
        "fetching toolchain"
    );

    let staging = install_dir.join(format!("extract-{}", Uuid::new_v4().simple()));
    fs::create_dir_all(&staging)
        .map_err(|e| FetchError::io("Failed to create install directory", &staging, e))?;

    for release in &source.archives {
        download_and_extract(release, install_dir, &staging, downloader, progress)?;
    }

    install_from_staging(&staging, source.layout, install_dir, platform)
}

/// Fetch when the located install is incomplete.
///
/// Trusts `located` as is; the install directory is not inspected again
/// before downloading.
pub fn ensure_toolchain(
    located: LocateResult,
    platform: &PlatformTarget,
    url_override: Option<&str>,
    downloader: &dyn Downloader,
    progress: &mut dyn FnMut(DownloadProgress),
) -> Result<ToolchainInstall, FetchError> {
    if located.present {
        tracing::info!(dir = %located.install.install_dir.display(), "toolchain already installed");
        return Ok(located.install);
    }
    tracing::info!(missing = ?located.install.missing(), "toolchain incomplete");

    let install = fetch(
        &located.install.install_dir,
        platform,
        url_override,
        downloader,
        progress,
    )?;
    for path in [&install.ffmpeg, &install.ffprobe] {
        if !path.exists() {
            return Err(FetchError::BinaryMissing {
                name: file_name_of(path),
                dir: install.install_dir.clone(),
            });
        }
    }
    Ok(install)
}

fn download_and_extract(
    release: &ToolchainArchive,
    install_dir: &Path,
    staging: &Path,
    downloader: &dyn Downloader,
    progress: &mut dyn FnMut(DownloadProgress),
) -> Result<(), FetchError> {
    let archive_path = install_dir.join(format!(
        "download-{}.{}",
        Uuid::new_v4().simple(),
        release.format.extension()
    ));
    tracing::info!(url = %release.url, "downloading archive");

    let result = downloader
        .download(&release.url, &archive_path, progress)
        .and_then(|_| archive::extract(&archive_path, release.format, staging));

    // Extraction leftovers are not cleaned up; only the archive goes
    if let Err(e) = fs::remove_file(&archive_path) {
        if archive_path.exists() {
            tracing::warn!(path = %archive_path.display(), error = %e, "could not delete archive");
        }
    }

    result
}

fn install_from_staging(
    staging: &Path,
    layout: ArchiveLayout,
    install_dir: &Path,
    platform: &PlatformTarget,
) -> Result<ToolchainInstall, FetchError> {
    let bin_dir = match layout {
        ArchiveLayout::BuildTree => find_bin_dir(staging)?,
        ArchiveLayout::Flat => staging.to_path_buf(),
    };
    let ffmpeg = relocate(&bin_dir, install_dir, &platform.executable_name(TRANSCODER))?;
    let ffprobe = relocate(&bin_dir, install_dir, &platform.executable_name(INSPECTOR))?;

    fs::remove_dir_all(staging)
        .map_err(|e| FetchError::io("Failed to remove extracted files", staging, e))?;

    if !platform.is_windows() {
        make_executable(&ffmpeg)?;
        make_executable(&ffprobe)?;
    }

    Ok(ToolchainInstall {
        install_dir: install_dir.to_path_buf(),
        ffmpeg,
        ffprobe,
    })
}

/// Find `<root>/ffmpeg*/bin`
pub fn find_bin_dir(root: &Path) -> Result<PathBuf, FetchError> {
    let found = WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.file_name() == BIN_DIR)
        .find(|e| {
            e.path()
                .parent()
                .and_then(|parent| parent.file_name())
                .is_some_and(|name| name.to_string_lossy().starts_with(EXTRACTED_DIR_PREFIX))
        })
        .map(|e| e.into_path());

    found.ok_or_else(|| FetchError::LayoutNotFound {
        pattern: EXTRACTED_DIR_PREFIX.to_string(),
        root: root.to_path_buf(),
    })
}

fn relocate(bin_dir: &Path, install_dir: &Path, name: &str) -> Result<PathBuf, FetchError> {
    let from = bin_dir.join(name);
    let to = install_dir.join(name);

    if !from.is_file() {
        return Err(FetchError::BinaryMissing {
            name: name.to_string(),
            dir: bin_dir.to_path_buf(),
        });
    }
    if to.exists() {
        fs::remove_file(&to).map_err(|e| FetchError::io("Failed to replace binary", &to, e))?;
    }
    fs::rename(&from, &to).map_err(|e| FetchError::io("Failed to move binary", &from, e))?;

    tracing::debug!(from = %from.display(), to = %to.display(), "relocated binary");
    Ok(to)
}

fn make_executable(path: &Path) -> Result<(), FetchError> {
    let output = Command::new("chmod")
        .arg("+x")
        .arg(path)
        .output()
        .map_err(|e| FetchError::PermissionFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(FetchError::PermissionFailed {
            path: path.to_path_buf(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
