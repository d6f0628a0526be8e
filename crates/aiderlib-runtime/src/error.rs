//! Run-time error types.
//!
//! One unified error for executing a request, keeping error plumbing out of
//! the bridge itself. Resolution errors pass through unchanged so callers
//! can still tell a malformed request from a missing installation.

use aiderlib_core::{EnvironmentError, ResolveError, ValidationError};
use thiserror::Error;

/// Errors that can occur while executing a request.
#[derive(Debug, Error)]
pub enum BridgeError {
    // === Request resolution ===
    /// The request was malformed or incomplete.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request or the installation does not match the filesystem.
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    // === Child process ===
    /// The wire payload could not be serialized.
    #[error("Failed to serialize the request payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The child process could not be started at all.
    #[error("Failed to start the interpreter: {reason}")]
    Spawn { reason: String },

    /// The child ran but exited non-zero. Carries the full captured output
    /// so the failure can be diagnosed without re-running.
    #[error("Interpreter exited with code {code:?}")]
    Subprocess {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The run was cancelled and the child was killed.
    #[error("Run cancelled")]
    Cancelled,

    /// IO failure while supervising the child.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ResolveError> for BridgeError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Validation(e) => Self::Validation(e),
            ResolveError::Environment(e) => Self::Environment(e),
        }
    }
}
