//! Isolated interpreter environment provisioning.
//!
//! Deploys the embedded Python project, creates a version-pinned virtualenv
//! with the acquired uv binary, syncs the declared dependency set, and
//! installs the runner package so the entrypoint module resolves. A marker
//! file written after full success is the sole idempotency signal; its
//! absence means "must (re)provision". Repeated calls are safe, concurrent
//! calls are not (the marker check plus later write is not atomic).

use std::fs;
use std::path::{Path, PathBuf};

use aiderlib_core::InstallLayout;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Python version the virtualenv is pinned to unless overridden.
pub const DEFAULT_PYTHON_VERSION: &str = "3.11";

/// Environment variable pointing uv's dependency sync at the virtualenv.
const VIRTUAL_ENV_VAR: &str = "VIRTUAL_ENV";

const ENTRYPOINT_SOURCE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/aider_entrypoint.py"
));

const PYPROJECT_SOURCE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/pyproject.toml"
));

/// Errors that can occur during environment provisioning.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Failed to create virtualenv at {path}: {reason}")]
    CreateEnvFailed { path: PathBuf, reason: String },

    /// The virtualenv was created but its interpreter is absent; creation
    /// completed silently incomplete.
    #[error("Interpreter missing after virtualenv creation at {path}")]
    InterpreterMissing { path: PathBuf },

    #[error("Failed to sync Python dependencies: {0}")]
    DependencySyncFailed(String),

    #[error("Failed to install the runner package into the virtualenv: {0}")]
    PackageInstallFailed(String),

    #[error("Failed to deploy the Python project to {path}: {reason}")]
    ProjectDeployFailed { path: PathBuf, reason: String },

    #[error("Failed to write completion marker at {path}: {reason}")]
    MarkerWriteFailed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A provisioned interpreter environment.
#[derive(Debug, Clone)]
pub struct ProvisionedEnvironment {
    /// Root of the virtualenv.
    pub root: PathBuf,
    /// Python interpreter inside the virtualenv.
    pub interpreter: PathBuf,
    /// Completion marker whose existence gates re-provisioning.
    pub marker: PathBuf,
}

/// Provisions the isolated interpreter environment using the acquired uv
/// binary.
pub struct Provisioner {
    layout: InstallLayout,
    uv: PathBuf,
}

impl Provisioner {
    pub fn new(layout: InstallLayout, uv: impl Into<PathBuf>) -> Self {
        Self {
            layout,
            uv: uv.into(),
        }
    }

    /// Provision the environment, or return the existing one.
    ///
    /// When the completion marker exists the descriptor is returned without
    /// invoking uv at all. Any failure triggers best-effort removal of the
    /// partially created environment before propagating; no marker is
    /// written and no retry happens.
    pub async fn provision(
        &self,
        python_version: &str,
    ) -> Result<ProvisionedEnvironment, ProvisionError> {
        let env = self.environment();
        if env.marker.exists() {
            debug!(marker = %env.marker.display(), "environment already provisioned, skipping");
            return Ok(env);
        }

        if let Err(e) = self.provision_fresh(&env, python_version).await {
            self.rollback(&env);
            return Err(e);
        }

        Ok(env)
    }

    /// The environment descriptor for this layout, whether or not it has
    /// been provisioned yet.
    pub fn environment(&self) -> ProvisionedEnvironment {
        ProvisionedEnvironment {
            root: self.layout.venv_dir(),
            interpreter: self.layout.interpreter_path(),
            marker: self.layout.marker_path(),
        }
    }

    async fn provision_fresh(
        &self,
        env: &ProvisionedEnvironment,
        python_version: &str,
    ) -> Result<(), ProvisionError> {
        if let Some(parent) = env.root.parent() {
            fs::create_dir_all(parent)?;
        }
        self.deploy_python_project()?;

        info!(path = %env.root.display(), python = %python_version, "creating virtualenv");
        let status = Command::new(&self.uv)
            .arg("venv")
            .arg(&env.root)
            .arg("--python")
            .arg(python_version)
            .status()
            .await
            .map_err(|e| ProvisionError::CreateEnvFailed {
                path: env.root.clone(),
                reason: e.to_string(),
            })?;
        if !status.success() {
            return Err(ProvisionError::CreateEnvFailed {
                path: env.root.clone(),
                reason: format!("uv venv exited with {status}"),
            });
        }

        if !env.interpreter.exists() {
            return Err(ProvisionError::InterpreterMissing {
                path: env.interpreter.clone(),
            });
        }

        let project = self.layout.python_project_dir();

        info!("syncing Python dependencies");
        let status = Command::new(&self.uv)
            .arg("sync")
            .current_dir(&project)
            .env(VIRTUAL_ENV_VAR, &env.root)
            .status()
            .await
            .map_err(|e| ProvisionError::DependencySyncFailed(e.to_string()))?;
        if !status.success() {
            return Err(ProvisionError::DependencySyncFailed(format!(
                "uv sync exited with {status}"
            )));
        }

        // Install the runner package itself so the entrypoint module is
        // importable from the virtualenv.
        info!("installing the runner package");
        let status = Command::new(&self.uv)
            .arg("pip")
            .arg("install")
            .arg("--python")
            .arg(&env.interpreter)
            .arg(&project)
            .status()
            .await
            .map_err(|e| ProvisionError::PackageInstallFailed(e.to_string()))?;
        if !status.success() {
            return Err(ProvisionError::PackageInstallFailed(format!(
                "uv pip install exited with {status}"
            )));
        }

        write_marker(&env.marker)
    }

    /// Write the embedded entrypoint script and pyproject into the layout.
    fn deploy_python_project(&self) -> Result<(), ProvisionError> {
        let dir = self.layout.python_project_dir();
        fs::create_dir_all(&dir).map_err(|e| ProvisionError::ProjectDeployFailed {
            path: dir.clone(),
            reason: e.to_string(),
        })?;

        for (path, source) in [
            (self.layout.entrypoint_path(), ENTRYPOINT_SOURCE),
            (self.layout.pyproject_path(), PYPROJECT_SOURCE),
        ] {
            fs::write(&path, source).map_err(|e| ProvisionError::ProjectDeployFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Best-effort removal of a partially created environment.
    fn rollback(&self, env: &ProvisionedEnvironment) {
        if env.root.exists() {
            warn!(path = %env.root.display(), "removing partially provisioned environment");
            if let Err(e) = fs::remove_dir_all(&env.root) {
                warn!(error = %e, "failed to remove partial environment");
            }
        }
    }
}

fn write_marker(marker: &Path) -> Result<(), ProvisionError> {
    let content = format!("Setup completed on {}", chrono::Utc::now().to_rfc3339());
    fs::write(marker, content).map_err(|e| ProvisionError::MarkerWriteFailed {
        path: marker.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_in(dir: &Path) -> InstallLayout {
        InstallLayout::new(dir)
    }

    #[tokio::test]
    async fn test_marker_short_circuits_provisioning() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout_in(dir.path());

        fs::create_dir_all(layout.venv_dir()).unwrap();
        fs::write(layout.marker_path(), "Setup completed earlier").unwrap();

        // The uv path points nowhere; any invocation would fail loudly.
        let provisioner = Provisioner::new(layout.clone(), "/nonexistent/uv");
        let env = provisioner.provision(DEFAULT_PYTHON_VERSION).await.unwrap();

        assert_eq!(env.root, layout.venv_dir());
        assert_eq!(env.interpreter, layout.interpreter_path());
        assert!(env.marker.exists());
    }

    #[tokio::test]
    async fn test_failed_provisioning_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout_in(dir.path());

        // A stale partial environment without a marker must be swept away
        // when the fresh attempt fails.
        fs::create_dir_all(layout.venv_dir()).unwrap();
        fs::write(layout.venv_dir().join("stale"), "leftover").unwrap();

        let provisioner = Provisioner::new(layout.clone(), "/nonexistent/uv");
        let err = provisioner
            .provision(DEFAULT_PYTHON_VERSION)
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::CreateEnvFailed { .. }));
        assert!(!layout.venv_dir().exists());
        assert!(!layout.marker_path().exists());
    }

    #[tokio::test]
    async fn test_python_project_deployed_before_venv_creation() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout_in(dir.path());

        let provisioner = Provisioner::new(layout.clone(), "/nonexistent/uv");
        let _ = provisioner.provision(DEFAULT_PYTHON_VERSION).await;

        let entrypoint = fs::read_to_string(layout.entrypoint_path()).unwrap();
        assert!(entrypoint.contains("def main()"));

        let pyproject = fs::read_to_string(layout.pyproject_path()).unwrap();
        assert!(pyproject.contains("aider-chat"));
    }

    #[test]
    fn test_marker_content_is_informational_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        write_marker(&marker).unwrap();

        let content = fs::read_to_string(&marker).unwrap();
        assert!(content.starts_with("Setup completed on "));
    }
}
