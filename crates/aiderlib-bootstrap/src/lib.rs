//! Install-time bootstrapping for aiderlib.
//!
//! Guarantees the aider runtime is available before the first request:
//! - `platform`: maps the host OS/architecture to a uv release artifact
//! - `uv`: downloads and extracts the uv binary (idempotent)
//! - `provision`: creates the isolated interpreter environment and installs
//!   the dependency set (idempotent via a completion marker)
//! - `installer`: chains the two for the installer binary
//!
//! All failure paths clean up after themselves (temp archives, partial
//! binaries, partial environments) and propagate unchanged; nothing here
//! retries.

pub mod installer;
pub mod platform;
pub mod provision;
pub mod uv;

pub use installer::{run_install, InstallError, InstallOptions};
pub use platform::{host_target, resolve_target, ArchiveKind, PlatformError, PlatformTarget};
pub use provision::{
    Provisioner, ProvisionedEnvironment, ProvisionError, DEFAULT_PYTHON_VERSION,
};
pub use uv::{ensure_uv, AcquireError, ProgressCallback, UV_RELEASE_BASE_URL};
