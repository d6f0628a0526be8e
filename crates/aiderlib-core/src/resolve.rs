//! Request validation and normalization.
//!
//! Validation is ordered and fails before any subprocess or network work:
//! prompt, then model, then repository path, then credentials. The only
//! filesystem access is the repository-path existence check.

use std::path::PathBuf;

use thiserror::Error;

use crate::credentials::{AmbientCredentials, OPENAI_API_KEY_VAR};
use crate::request::{AiderRequest, ResolvedRequest};

/// Routing prefix instructing aider to send requests to an
/// OpenAI-compatible endpoint instead of the model's default provider.
pub const OPENAI_ROUTE_PREFIX: &str = "openai/";

/// A malformed or incomplete request. Raised before any I/O happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'prompt' is a required option and cannot be empty")]
    MissingPrompt,

    #[error("'model' is a required option and cannot be empty")]
    MissingModel,

    #[error(
        "when 'api_base' is set, either 'api_key' must be provided or \
         {OPENAI_API_KEY_VAR} must be present in the ambient credentials"
    )]
    MissingApiCredential,
}

/// A request or installation that does not match the filesystem.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("repository path {0} does not exist")]
    RepoNotFound(PathBuf),

    #[error("repository path {0} exists but is not a directory")]
    RepoNotADirectory(PathBuf),

    /// The provisioned interpreter is absent. Distinguishes "bootstrap
    /// never ran" from "subprocess crashed".
    #[error("interpreter not found at {path}; run 'aiderlib install' first")]
    InterpreterMissing { path: PathBuf },
}

/// Errors produced by [`resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}

/// Validate a request and normalize it into its executable form.
///
/// When `api_base` is set the model identifier gains the routing prefix,
/// applied at most once: an identifier already starting with `openai/` is
/// left untouched. The key override is populated only when the caller
/// supplied both `api_base` and `api_key`; an ambient-only credential stays
/// in the environment and reaches the child through plain inheritance.
pub fn resolve(
    request: AiderRequest,
    ambient: &AmbientCredentials,
) -> Result<ResolvedRequest, ResolveError> {
    if request.prompt.is_empty() {
        return Err(ValidationError::MissingPrompt.into());
    }
    if request.model.is_empty() {
        return Err(ValidationError::MissingModel.into());
    }

    if !request.repo_path.exists() {
        return Err(EnvironmentError::RepoNotFound(request.repo_path).into());
    }
    if !request.repo_path.is_dir() {
        return Err(EnvironmentError::RepoNotADirectory(request.repo_path).into());
    }

    let (model, api_key_override) = if request.api_base.is_some() {
        if request.api_key.is_none() && ambient.openai_api_key.is_none() {
            return Err(ValidationError::MissingApiCredential.into());
        }
        (routed_model(&request.model), request.api_key)
    } else {
        (request.model, None)
    };

    Ok(ResolvedRequest {
        prompt: request.prompt,
        model,
        repo_path: request.repo_path,
        editable_files: request.editable_files,
        read_only_files: request.read_only_files,
        api_base: request.api_base,
        api_key_override,
        verbose: request.verbose,
    })
}

/// Apply the routing prefix exactly once.
fn routed_model(model: &str) -> String {
    if model.starts_with(OPENAI_ROUTE_PREFIX) {
        model.to_string()
    } else {
        format!("{OPENAI_ROUTE_PREFIX}{model}")
    }
}
