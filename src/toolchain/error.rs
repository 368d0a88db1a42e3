use std::path::PathBuf;
use thiserror::Error;

/// Failure while provisioning the ffmpeg toolchain.
///
/// Every variant is fatal for startup; nothing here is retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no toolchain download is available for platform {platform}")]
    PlatformNotSupported { platform: String },

    #[error("download of {url} failed")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("{context}: {}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to unpack {}", .archive.display())]
    Extract {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive tool failed on {}: {message}", .archive.display())]
    ExtractorFailed { archive: PathBuf, message: String },

    #[error("no '{pattern}*/bin' directory found in {}", .root.display())]
    LayoutNotFound { pattern: String, root: PathBuf },

    #[error("{name} not found in extracted archive at {}", .dir.display())]
    BinaryMissing { name: String, dir: PathBuf },

    #[error("could not mark {} executable: {message}", .path.display())]
    PermissionFailed { path: PathBuf, message: String },
}

impl FetchError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
