// Archive unpacking: zip in-process, tarballs through the system `tar`

use super::error::FetchError;
use std::fs::File;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarXz,
}

impl ArchiveFormat {
    /// Guess the format from a download URL
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Self::Zip
        } else {
            Self::TarXz
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarXz => "tar.xz",
        }
    }
}

/// Where the binaries sit once an archive is unpacked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// Inside `ffmpeg-*/bin/` below the extraction root
    BuildTree,
    /// Directly at the extraction root
    Flat,
}

/// Unpack `archive` into `dest`
pub fn extract(archive: &Path, format: ArchiveFormat, dest: &Path) -> Result<(), FetchError> {
    tracing::info!(archive = %archive.display(), ?format, "extracting toolchain archive");
    match format {
        ArchiveFormat::Zip => extract_zip(archive, dest),
        ArchiveFormat::TarXz => extract_tar(archive, dest),
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), FetchError> {
    let file = File::open(archive).map_err(|e| FetchError::io("Failed to open archive", archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|source| FetchError::Extract {
        archive: archive.to_path_buf(),
        source,
    })?;
    zip.extract(dest).map_err(|source| FetchError::Extract {
        archive: archive.to_path_buf(),
        source,
    })
}

fn extract_tar(archive: &Path, dest: &Path) -> Result<(), FetchError> {
    // tar detects xz/gz compression from the file itself
    let output = Command::new("tar")
        .arg("-xf")
        .arg(archive)
        .arg("-C")
        .arg(dest)
        .output()
        .map_err(|e| FetchError::ExtractorFailed {
            archive: archive.to_path_buf(),
            message: format!("failed to run tar: {}", e),
        })?;

    if !output.status.success() {
        return Err(FetchError::ExtractorFailed {
            archive: archive.to_path_buf(),
            message: format!(
                "tar exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}
