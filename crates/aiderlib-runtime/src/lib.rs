//! Run-time half of aiderlib: the process bridge.
//!
//! Consumes the artifacts the bootstrapper produced (the provisioned
//! interpreter) and runs one aider session per request, streaming and
//! aggregating the child's output. No retries anywhere; every failure is
//! surfaced verbatim with as much captured context as exists.

pub mod bridge;
pub mod error;

pub use bridge::{AiderBridge, ExecuteOptions, OutputCallback};
pub use error::BridgeError;

use aiderlib_core::{resolve, AiderOutput, AiderRequest, AmbientCredentials, InstallLayout};

/// Validate, normalize, and execute a request in one call.
///
/// The one-stop entry point for callers that don't need streaming or
/// cancellation: resolution failures surface before any subprocess or
/// filesystem mutation happens.
pub async fn run_aider(
    layout: &InstallLayout,
    request: AiderRequest,
    ambient: &AmbientCredentials,
) -> Result<AiderOutput, BridgeError> {
    let resolved = resolve(request, ambient)?;
    AiderBridge::new(layout).execute(&resolved).await
}
