//! Platform resolution for uv release artifacts.
//!
//! Pure mapping from (OS family, CPU architecture) to the release triple
//! and archive format uv publishes for that platform. Expressed as a
//! function over explicit inputs rather than `cfg` blocks so the full
//! matrix is testable on any host; `host_target()` feeds in
//! `std::env::consts`.

use thiserror::Error;

/// Errors from platform resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Host OS is not one of macOS, Linux, Windows.
    #[error("Unsupported platform: {os}")]
    UnsupportedOs { os: String },
}

/// Archive format a release artifact is packaged as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    /// File extension including the leading dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::TarGz => ".tar.gz",
            Self::Zip => ".zip",
        }
    }
}

/// A resolved download target: release triple plus archive format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTarget {
    /// Target triple uniquely identifying the artifact,
    /// e.g. `aarch64-apple-darwin`.
    pub suffix: &'static str,
    /// Archive format the artifact is packaged as.
    pub archive: ArchiveKind,
}

impl PlatformTarget {
    /// Filename of the release archive for this target.
    pub fn archive_filename(&self) -> String {
        format!("uv-{}{}", self.suffix, self.archive.extension())
    }
}

/// Resolve the download target for an explicit (os, arch) pair.
///
/// Architectures are normalized into exactly two buckets: `aarch64` (and
/// its `arm64` spelling) map to 64-bit ARM, everything else to 64-bit x86.
pub fn resolve_target(os: &str, arch: &str) -> Result<PlatformTarget, PlatformError> {
    let arm = arch == "aarch64" || arch == "arm64";

    match os {
        "macos" => Ok(PlatformTarget {
            suffix: if arm {
                "aarch64-apple-darwin"
            } else {
                "x86_64-apple-darwin"
            },
            archive: ArchiveKind::TarGz,
        }),
        "linux" => Ok(PlatformTarget {
            suffix: if arm {
                "aarch64-unknown-linux-gnu"
            } else {
                "x86_64-unknown-linux-gnu"
            },
            archive: ArchiveKind::TarGz,
        }),
        "windows" => Ok(PlatformTarget {
            suffix: if arm {
                "aarch64-pc-windows-msvc"
            } else {
                "x86_64-pc-windows-msvc"
            },
            archive: ArchiveKind::Zip,
        }),
        other => Err(PlatformError::UnsupportedOs {
            os: other.to_string(),
        }),
    }
}

/// Resolve the download target for the running host.
pub fn host_target() -> Result<PlatformTarget, PlatformError> {
    resolve_target(std::env::consts::OS, std::env::consts::ARCH)
}
