//! Install layout and data-root resolution.
//!
//! Every artifact the bootstrapper produces (the uv binary, the deployed
//! Python project, the virtualenv and its completion marker) lives under a
//! single data root. `InstallLayout` is the canonical path schema over that
//! root; the root itself is injected so tests can point the whole
//! bootstrapper at a temporary directory.
//!
//! Resolution order for the production root:
//! 1. `AIDERLIB_DATA_DIR` environment variable (highest priority)
//! 2. System data directory (e.g. `~/.local/share/aiderlib`)

use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "AIDERLIB_DATA_DIR";

/// Name of the completion marker written inside the virtualenv after a
/// successful provisioning run. Existence is the sole idempotency signal;
/// the content is an informational timestamp.
pub const SETUP_MARKER_NAME: &str = "aider_setup_complete.marker";

/// Errors that can occur during data-root resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,
}

/// Get the root directory for aiderlib data (uv binary, Python project,
/// virtualenv).
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join("aiderlib"))
}

/// Path schema for a single installation root.
///
/// All paths are computed, never created; directory creation is the
/// bootstrapper's job.
#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    /// Create a layout rooted at an explicit directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a layout rooted at the resolved production data root.
    pub fn discover() -> Result<Self, PathError> {
        Ok(Self::new(data_root()?))
    }

    /// The installation root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the acquired uv binary.
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Path of the uv binary itself.
    pub fn uv_path(&self) -> PathBuf {
        let name = if cfg!(windows) { "uv.exe" } else { "uv" };
        self.bin_dir().join(name)
    }

    /// Directory the embedded Python project is deployed into.
    pub fn python_project_dir(&self) -> PathBuf {
        self.root.join("python")
    }

    /// Path of the deployed interpreter entrypoint script.
    pub fn entrypoint_path(&self) -> PathBuf {
        self.python_project_dir().join("aider_entrypoint.py")
    }

    /// Path of the deployed `pyproject.toml`.
    pub fn pyproject_path(&self) -> PathBuf {
        self.python_project_dir().join("pyproject.toml")
    }

    /// Root of the isolated interpreter environment.
    pub fn venv_dir(&self) -> PathBuf {
        self.root.join(".venv")
    }

    /// Path of the Python interpreter inside the virtualenv.
    pub fn interpreter_path(&self) -> PathBuf {
        if cfg!(windows) {
            self.venv_dir().join("Scripts").join("python.exe")
        } else {
            self.venv_dir().join("bin").join("python")
        }
    }

    /// Path of the provisioning completion marker.
    pub fn marker_path(&self) -> PathBuf {
        self.venv_dir().join(SETUP_MARKER_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_path_platform_name() {
        let layout = InstallLayout::new("/data/aiderlib");
        let path = layout.uv_path();

        #[cfg(windows)]
        assert!(path.to_string_lossy().ends_with("uv.exe"));

        #[cfg(not(windows))]
        assert!(path.to_string_lossy().ends_with("bin/uv"));
    }

    #[test]
    fn test_interpreter_lives_inside_venv() {
        let layout = InstallLayout::new("/data/aiderlib");
        assert!(layout.interpreter_path().starts_with(layout.venv_dir()));
    }

    #[test]
    fn test_marker_lives_inside_venv() {
        let layout = InstallLayout::new("/data/aiderlib");
        let marker = layout.marker_path();
        assert!(marker.starts_with(layout.venv_dir()));
        assert!(marker.to_string_lossy().ends_with(SETUP_MARKER_NAME));
    }

    #[test]
    fn test_entrypoint_under_python_project() {
        let layout = InstallLayout::new("/data/aiderlib");
        assert!(layout
            .entrypoint_path()
            .starts_with(layout.python_project_dir()));
    }
}
