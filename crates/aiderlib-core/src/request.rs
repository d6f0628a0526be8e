//! Request model and the wire payload handed to the interpreter entrypoint.
//!
//! `AiderRequest` is what callers build; `ResolvedRequest` is the validated
//! and normalized form produced by [`crate::resolve::resolve`]. The wire
//! payload is a single JSON document passed as one positional argument to
//! the entrypoint script; the API key is deliberately absent from it and
//! travels via the child environment instead.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// A request to run aider against a repository.
#[derive(Debug, Clone)]
pub struct AiderRequest {
    /// The instruction given to aider.
    pub prompt: String,
    /// Model identifier, e.g. `gpt-4o` or `openai/gpt-4o-mini`.
    pub model: String,
    /// Repository aider operates in; becomes the child's working directory.
    pub repo_path: PathBuf,
    /// Files aider may edit, relative to `repo_path`.
    pub editable_files: Vec<String>,
    /// Files aider may read but not edit.
    pub read_only_files: Vec<String>,
    /// Custom OpenAI-compatible endpoint (proxy, OpenRouter, ...).
    pub api_base: Option<String>,
    /// Key for `api_base`; overrides the ambient credential for one call.
    pub api_key: Option<String>,
    /// Verbose aider output.
    pub verbose: bool,
}

impl AiderRequest {
    /// Create a request with the three required fields.
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        repo_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            repo_path: repo_path.into(),
            editable_files: Vec::new(),
            read_only_files: Vec::new(),
            api_base: None,
            api_key: None,
            verbose: false,
        }
    }

    /// Set the files aider may edit.
    pub fn with_editable_files(mut self, files: Vec<String>) -> Self {
        self.editable_files = files;
        self
    }

    /// Set the files aider may read but not edit.
    pub fn with_read_only_files(mut self, files: Vec<String>) -> Self {
        self.read_only_files = files;
        self
    }

    /// Route requests through a custom OpenAI-compatible endpoint.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Provide the key for the custom endpoint.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Enable verbose aider output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// A validated and normalized request, ready to execute.
///
/// Produced by [`crate::resolve::resolve`]; the model identifier carries
/// the routing prefix when `api_base` is set, and `api_key_override` is the
/// single effective key to inject into the child environment (present only
/// when the caller supplied both `api_base` and `api_key`).
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub prompt: String,
    pub model: String,
    pub repo_path: PathBuf,
    pub editable_files: Vec<String>,
    pub read_only_files: Vec<String>,
    pub api_base: Option<String>,
    pub api_key_override: Option<String>,
    pub verbose: bool,
}

impl ResolvedRequest {
    /// Serialize the wire payload for the entrypoint script.
    pub fn payload_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&EntrypointPayload {
            prompt: &self.prompt,
            editable_files: &self.editable_files,
            read_only_files: &self.read_only_files,
            model_name: &self.model,
            repo_path: &self.repo_path,
            api_base: self.api_base.as_deref(),
            verbose: self.verbose,
        })
    }
}

/// Wire schema consumed by the entrypoint script.
///
/// Key casing matches what the script's JSON loader expects. The API key is
/// never part of this payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntrypointPayload<'a> {
    prompt: &'a str,
    editable_files: &'a [String],
    read_only_files: &'a [String],
    model_name: &'a str,
    repo_path: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_base: Option<&'a str>,
    verbose: bool,
}

/// Captured output of one completed interpreter run.
///
/// Each buffer is the exact concatenation, in arrival order, of the chunks
/// observed on that stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiderOutput {
    pub stdout: String,
    pub stderr: String,
}
