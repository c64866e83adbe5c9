use crate::release::ArchiveFormat;
use anyhow::{bail, Result};
use std::fmt;
use std::process::Command;
use tracing::debug;

/// The raw host description, spelled the way `uname` reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub os: String,
    pub arch: String,
}

impl HostIdentity {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Queries `uname`, falling back to the compile-time target when it is not available.
    pub fn current() -> Self {
        let os = uname("-s").unwrap_or_else(|| fallback_os_name().to_string());
        let arch = uname("-m").unwrap_or_else(|| std::env::consts::ARCH.to_string());
        debug!(%os, %arch, "detected host");
        Self { os, arch }
    }

    pub fn with_overrides(self, os: Option<String>, arch: Option<String>) -> Self {
        Self {
            os: os.unwrap_or(self.os),
            arch: arch.unwrap_or(self.arch),
        }
    }
}

fn uname(flag: &str) -> Option<String> {
    Command::new("uname")
        .arg(flag)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|value| !value.is_empty())
}

fn fallback_os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "Darwin",
        "linux" => "Linux",
        "windows" => "Windows_NT",
        other => other,
    }
}

/// Hosts Flutter publishes stable SDK archives for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacosArm64,
    MacosX64,
    Linux,
    Windows,
}

impl Platform {
    pub fn detect(host: &HostIdentity) -> Result<Self> {
        let os = host.os.as_str();
        let platform = match os {
            "Darwin" => match host.arch.as_str() {
                "arm64" | "aarch64" => Platform::MacosArm64,
                _ => Platform::MacosX64,
            },
            "Linux" => Platform::Linux,
            "Windows_NT" => Platform::Windows,
            _ if ["CYGWIN", "MINGW", "MSYS"]
                .iter()
                .any(|prefix| os.starts_with(prefix)) =>
            {
                Platform::Windows
            }
            other => bail!("Unsupported platform: {} ({})", other, host.arch),
        };
        Ok(platform)
    }

    /// Directory segment of the release bucket.
    pub fn release_dir(&self) -> &'static str {
        match self {
            Platform::MacosArm64 | Platform::MacosX64 => "macos",
            Platform::Linux => "linux",
            Platform::Windows => "windows",
        }
    }

    /// Only Apple silicon archives carry an architecture suffix.
    pub fn arch_suffix(&self) -> Option<&'static str> {
        match self {
            Platform::MacosArm64 => Some("arm64"),
            Platform::MacosX64 | Platform::Linux | Platform::Windows => None,
        }
    }

    pub fn archive_format(&self) -> ArchiveFormat {
        match self {
            Platform::Linux => ArchiveFormat::TarXz,
            Platform::MacosArm64 | Platform::MacosX64 | Platform::Windows => ArchiveFormat::Zip,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacosArm64 => write!(f, "macOS (arm64)"),
            Platform::MacosX64 => write!(f, "macOS (x86_64)"),
            Platform::Linux => write!(f, "Linux"),
            Platform::Windows => write!(f, "Windows"),
        }
    }
}
