//! Host platform detection

use std::fmt;

/// Operating systems the toolchain can be provisioned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatingSystem {
    Windows,
    Linux,
    MacOs,
}

/// CPU architectures the toolchain can be provisioned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    X64,
    Arm64,
}

/// The (OS, architecture) pair the program runs on.
///
/// Either half may be unrecognized; URL selection fails fast on those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformTarget {
    pub os: Option<OperatingSystem>,
    pub arch: Option<Architecture>,
}

impl OperatingSystem {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "windows" => Some(Self::Windows),
            "linux" => Some(Self::Linux),
            "macos" => Some(Self::MacOs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "macos",
        }
    }

    /// Suffix appended to executable names on this OS
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux | Self::MacOs => "",
        }
    }
}

impl Architecture {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x86_64" => Some(Self::X64),
            "aarch64" => Some(Self::Arm64),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
        }
    }
}

impl PlatformTarget {
    pub fn new(os: OperatingSystem, arch: Architecture) -> Self {
        Self {
            os: Some(os),
            arch: Some(arch),
        }
    }

    /// Platform of the running process
    pub fn current() -> Self {
        Self::from_names(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn from_names(os: &str, arch: &str) -> Self {
        Self {
            os: OperatingSystem::from_name(os),
            arch: Architecture::from_name(arch),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == Some(OperatingSystem::Windows)
    }

    /// Executable file name for a tool on this platform (e.g. `ffmpeg.exe`)
    pub fn executable_name(&self, tool: &str) -> String {
        let suffix = self.os.map(|os| os.exe_suffix()).unwrap_or("");
        format!("{}{}", tool, suffix)
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.os.map(|os| os.name()).unwrap_or("unknown"),
            self.arch.map(|arch| arch.name()).unwrap_or("unknown")
        )
    }
}
