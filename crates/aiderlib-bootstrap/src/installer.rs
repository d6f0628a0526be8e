//! Install-time orchestration: acquire uv, then provision the environment.
//!
//! This is the single entry point the installer binary calls. Both halves
//! are idempotent, so running the installer repeatedly is cheap: an
//! already-acquired binary short-circuits the download and an existing
//! completion marker short-circuits provisioning.

use aiderlib_core::InstallLayout;
use thiserror::Error;

use crate::provision::{Provisioner, ProvisionedEnvironment, ProvisionError, DEFAULT_PYTHON_VERSION};
use crate::uv::{ensure_uv, AcquireError, ProgressCallback};

/// Errors surfaced by [`run_install`].
#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

/// Options for one installer run.
pub struct InstallOptions<'a> {
    /// Python version the virtualenv is pinned to.
    pub python_version: &'a str,
    /// Optional download progress callback for the uv archive.
    pub progress: Option<ProgressCallback<'a>>,
}

impl InstallOptions<'_> {
    pub fn new() -> Self {
        Self {
            python_version: DEFAULT_PYTHON_VERSION,
            progress: None,
        }
    }
}

impl Default for InstallOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Acquire the uv binary and provision the interpreter environment.
pub async fn run_install(
    layout: &InstallLayout,
    options: InstallOptions<'_>,
) -> Result<ProvisionedEnvironment, InstallError> {
    let uv = ensure_uv(layout, options.progress).await?;
    let provisioner = Provisioner::new(layout.clone(), uv);
    Ok(provisioner.provision(options.python_version).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fully_provisioned_install_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(dir.path());

        // Seed both idempotency signals: the binary and the marker.
        std::fs::create_dir_all(layout.bin_dir()).unwrap();
        std::fs::write(layout.uv_path(), b"fake uv").unwrap();
        std::fs::create_dir_all(layout.venv_dir()).unwrap();
        std::fs::write(layout.marker_path(), "Setup completed earlier").unwrap();

        let env = run_install(&layout, InstallOptions::new()).await.unwrap();
        assert_eq!(env.root, layout.venv_dir());
        // The seeded binary was not replaced.
        assert_eq!(std::fs::read(layout.uv_path()).unwrap(), b"fake uv");
    }
}
