// Toolchain provisioning - locate ffmpeg/ffprobe on disk, fetch when missing

pub mod archive;
mod error;
pub mod fetch;
pub mod locator;
pub mod platform;

pub use error::FetchError;
pub use archive::{ArchiveFormat, ArchiveLayout};
pub use fetch::{
    DownloadProgress, Downloader, HttpDownloader, ToolchainArchive, ToolchainSource,
    ensure_toolchain, fetch, select_download_url, select_source,
};
pub use locator::{LocateResult, ToolchainInstall, default_install_dir, locate};
pub use platform::{Architecture, OperatingSystem, PlatformTarget};
