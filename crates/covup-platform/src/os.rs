//! Operating system detection and the uploader's platform naming.

use std::fmt;
use std::fs;
use std::str::FromStr;

use once_cell::sync::Lazy;
use sysinfo::System;

use crate::arch::{self, Arch};
use crate::error::{Error, Result};

/// Operating system types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OS {
    Windows,
    Macos,
    Linux(Distro),
    Unknown,
}

/// Linux distributions, as far as the uploader cares: Alpine ships musl and
/// needs its own build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Alpine,
    Debian,
    Ubuntu,
    Fedora,
    Other,
}

static SYSTEM_OS: Lazy<OS> = Lazy::new(|| match std::env::consts::OS {
    "windows" => OS::Windows,
    "macos" => OS::Macos,
    "linux" => {
        let content = fs::read_to_string("/etc/os-release").unwrap_or_default();
        OS::Linux(parse_os_release(&content))
    }
    other => {
        tracing::debug!(os = other, kernel = ?System::kernel_version(), "unrecognised host OS");
        OS::Unknown
    }
});

/// Read the `ID=` line of an `/etc/os-release` document.
pub fn parse_os_release(content: &str) -> Distro {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("ID="))
        .map(|id| match id.trim_matches('"') {
            "alpine" => Distro::Alpine,
            "debian" => Distro::Debian,
            "ubuntu" => Distro::Ubuntu,
            "fedora" => Distro::Fedora,
            _ => Distro::Other,
        })
        .unwrap_or(Distro::Other)
}

/// Detect current operating system.
pub fn detect() -> OS { *SYSTEM_OS }

/// Platform segment of the uploader download URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploaderPlatform {
    Linux,
    LinuxArm64,
    Alpine,
    AlpineArm64,
    Macos,
    Windows,
}

impl UploaderPlatform {
    pub const ALL: [UploaderPlatform; 6] = [
        UploaderPlatform::Linux,
        UploaderPlatform::LinuxArm64,
        UploaderPlatform::Alpine,
        UploaderPlatform::AlpineArm64,
        UploaderPlatform::Macos,
        UploaderPlatform::Windows,
    ];

    /// Detect the uploader build matching the running host.
    pub fn detect() -> Result<Self> { Self::from_parts(detect(), arch::detect()) }

    /// Pick a build for `os` on `arch`.
    ///
    /// macOS builds are universal, so any architecture maps to `macos`.
    pub fn from_parts(os: OS, arch: Arch) -> Result<Self> {
        let unsupported = || Error::UnsupportedPlatform {
            os:   format!("{os:?}"),
            arch: arch.as_str().to_string(),
        };
        match (os, arch) {
            (OS::Macos, _) => Ok(Self::Macos),
            (OS::Windows, Arch::X86_64 | Arch::X86) => Ok(Self::Windows),
            (OS::Linux(Distro::Alpine), Arch::X86_64) => Ok(Self::Alpine),
            (OS::Linux(Distro::Alpine), Arch::ARM64) => Ok(Self::AlpineArm64),
            (OS::Linux(_), Arch::X86_64) => Ok(Self::Linux),
            (OS::Linux(_), Arch::ARM64) => Ok(Self::LinuxArm64),
            _ => Err(unsupported()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::LinuxArm64 => "linux-arm64",
            Self::Alpine => "alpine",
            Self::AlpineArm64 => "alpine-arm64",
            Self::Macos => "macos",
            Self::Windows => "windows",
        }
    }

    /// File name of the uploader executable on this platform.
    pub fn binary_name(self) -> &'static str {
        match self {
            Self::Windows => "codecov.exe",
            _ => "codecov",
        }
    }
}

impl fmt::Display for UploaderPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for UploaderPlatform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| Error::UnknownPlatform(s.to_string()))
    }
}
