// Runtime settings: built-in defaults, then environment, then command line.
// Nothing is persisted between runs.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Name of the dedicated output subfolder
pub const APP_DIR_NAME: &str = "FFWizard";

pub const ENV_TOOLCHAIN_DIR: &str = "FFWIZARD_TOOLCHAIN_DIR";
pub const ENV_OUTPUT_DIR: &str = "FFWIZARD_OUTPUT_DIR";
pub const ENV_TOOLCHAIN_URL: &str = "FFWIZARD_TOOLCHAIN_URL";

/// One layer of optional values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub toolchain_dir: Option<PathBuf>,
    /// Parent of the output subfolder
    pub output_root: Option<PathBuf>,
    pub toolchain_url: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            toolchain_dir: get(ENV_TOOLCHAIN_DIR).map(PathBuf::from),
            output_root: get(ENV_OUTPUT_DIR).map(PathBuf::from),
            toolchain_url: get(ENV_TOOLCHAIN_URL),
        }
    }

    /// Values from `self`, falling back to `lower` field by field
    pub fn or(self, lower: Overrides) -> Overrides {
        Overrides {
            toolchain_dir: self.toolchain_dir.or(lower.toolchain_dir),
            output_root: self.output_root.or(lower.output_root),
            toolchain_url: self.toolchain_url.or(lower.toolchain_url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where ffmpeg and ffprobe live (or will be installed)
    pub toolchain_dir: PathBuf,
    /// Default destination for converted files
    pub output_dir: PathBuf,
    pub toolchain_url: Option<String>,
}

impl Settings {
    /// Merge the layers: `cli` wins over `env`, which wins over defaults.
    pub fn resolve(cli: Overrides, env: Overrides) -> Result<Self> {
        let merged = cli.or(env);

        let toolchain_dir = match merged.toolchain_dir {
            Some(dir) => dir,
            None => crate::toolchain::default_install_dir()
                .context("Could not determine the toolchain directory")?,
        };

        let output_root = merged.output_root.unwrap_or_else(default_output_root);

        Ok(Self {
            toolchain_dir,
            output_dir: output_root.join(APP_DIR_NAME),
            toolchain_url: merged.toolchain_url,
        })
    }
}

/// The user's Videos folder, else Documents, else the working directory
pub fn default_output_root() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::document_dir)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
