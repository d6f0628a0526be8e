//! uv binary acquisition.
//!
//! Streams the platform's uv release archive into a temp file next to the
//! final destination, extracts exactly the uv executable, and marks it
//! executable. Acquisition is idempotent: the binary's existence at its
//! deterministic path is the "already acquired" signal, and no integrity
//! re-verification happens on subsequent calls (known limitation, matching
//! the upstream release channel which publishes no checksums here).

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use aiderlib_core::InstallLayout;
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::platform::{host_target, ArchiveKind, PlatformError};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Base URL for uv release downloads; the archive filename is appended.
pub const UV_RELEASE_BASE_URL: &str =
    "https://github.com/astral-sh/uv/releases/latest/download";

/// Download progress callback: (`downloaded_bytes`, `total_bytes`).
pub type ProgressCallback<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Errors that can occur while acquiring the uv binary.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("Failed to download uv archive from {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("uv archive download returned HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Archive does not contain the expected {entry} executable")]
    EntryNotFound { entry: String },

    #[error("Failed to extract uv archive: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ensure the uv binary is present in the layout's bin directory.
///
/// Safe to call on every startup. The temp archive is removed on success
/// and failure alike; a failed extraction never leaves a partial executable
/// behind.
pub async fn ensure_uv(
    layout: &InstallLayout,
    progress: Option<ProgressCallback<'_>>,
) -> Result<PathBuf, AcquireError> {
    let uv_path = layout.uv_path();
    if uv_path.exists() {
        debug!(path = %uv_path.display(), "uv binary already present, skipping download");
        return Ok(uv_path);
    }

    let target = host_target()?;
    let bin_dir = layout.bin_dir();
    fs::create_dir_all(&bin_dir)?;

    let url = format!("{UV_RELEASE_BASE_URL}/{}", target.archive_filename());
    debug!(url = %url, "downloading uv archive");

    // NamedTempFile removes the archive on every exit path.
    let mut archive = NamedTempFile::new_in(&bin_dir)?;
    download(&url, archive.as_file_mut(), progress).await?;

    let exe_name = if cfg!(windows) { "uv.exe" } else { "uv" };
    let extracted = match target.archive {
        ArchiveKind::TarGz => extract_tar_entry(archive.path(), exe_name, &uv_path),
        ArchiveKind::Zip => extract_zip_entry(archive.path(), exe_name, &uv_path),
    };
    if let Err(e) = extracted {
        // Never hand back a partially written executable.
        let _ = fs::remove_file(&uv_path);
        return Err(e);
    }

    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&uv_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&uv_path, perms)?;
    }

    debug!(path = %uv_path.display(), "uv binary acquired");
    Ok(uv_path)
}

/// Stream the archive at `url` into `dest`, reporting progress as chunks
/// arrive.
async fn download(
    url: &str,
    dest: &mut File,
    progress: Option<ProgressCallback<'_>>,
) -> Result<(), AcquireError> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .header("User-Agent", "aiderlib")
        .send()
        .await
        .map_err(|e| AcquireError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AcquireError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AcquireError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        dest.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }
    dest.flush()?;

    Ok(())
}

/// Extract the single `exe_name` entry from a gzipped tarball into `dest`.
///
/// Tolerates both a nested `uv-<target>/uv` layout and a flat `uv` layout;
/// every other entry is skipped.
fn extract_tar_entry(archive: &Path, exe_name: &str, dest: &Path) -> Result<(), AcquireError> {
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));

    let entries = tar
        .entries()
        .map_err(|e| AcquireError::Extraction(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| AcquireError::Extraction(e.to_string()))?;
        let is_match = {
            let path = entry
                .path()
                .map_err(|e| AcquireError::Extraction(e.to_string()))?;
            path.file_name().and_then(|n| n.to_str()) == Some(exe_name)
        };
        if is_match {
            entry
                .unpack(dest)
                .map_err(|e| AcquireError::Extraction(e.to_string()))?;
            return Ok(());
        }
    }

    Err(AcquireError::EntryNotFound {
        entry: exe_name.to_string(),
    })
}

/// Extract the single `exe_name` entry from a zip archive into `dest`.
fn extract_zip_entry(archive: &Path, exe_name: &str, dest: &Path) -> Result<(), AcquireError> {
    let file = File::open(archive)?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| AcquireError::Extraction(e.to_string()))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| AcquireError::Extraction(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        // Entry paths may be nested (`uv-<target>/uv.exe`) or flat.
        let is_match = entry.name().rsplit('/').next() == Some(exe_name);
        if is_match {
            let mut out = File::create(dest)?;
            io::copy(&mut entry, &mut out)
                .map_err(|e| AcquireError::Extraction(e.to_string()))?;
            return Ok(());
        }
    }

    Err(AcquireError::EntryNotFound {
        entry: exe_name.to_string(),
    })
}
