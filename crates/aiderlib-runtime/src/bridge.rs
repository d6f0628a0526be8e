//! The process bridge.
//!
//! Spawns the provisioned interpreter once per request, streams its output
//! incrementally, and turns the terminal state into a structured result.
//! Concurrent `execute` calls are independent (separate children, separate
//! buffers); the only shared resource is the inherited environment, which
//! this module never mutates.

use std::path::PathBuf;
use std::process::Stdio;

use aiderlib_core::credentials::OPENAI_API_KEY_VAR;
use aiderlib_core::{AiderOutput, EnvironmentError, InstallLayout, ResolvedRequest};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::BridgeError;

/// Callback observing one output chunk as it arrives.
pub type OutputCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Per-call execution options.
#[derive(Default)]
pub struct ExecuteOptions {
    /// Cancels the run: the child is killed and `execute_with` returns
    /// [`BridgeError::Cancelled`] instead of hanging on the child.
    pub cancel_token: Option<CancellationToken>,
    /// Observes stdout chunks in arrival order.
    pub on_stdout: Option<OutputCallback>,
    /// Observes stderr chunks in arrival order.
    pub on_stderr: Option<OutputCallback>,
}

/// Bridge to the provisioned interpreter.
///
/// Holds only paths; each call owns exactly one child process for its
/// lifetime and neither owns nor mutates the installation.
pub struct AiderBridge {
    interpreter: PathBuf,
    entrypoint: PathBuf,
}

impl AiderBridge {
    /// Bridge over the given install layout.
    pub fn new(layout: &InstallLayout) -> Self {
        Self {
            interpreter: layout.interpreter_path(),
            entrypoint: layout.entrypoint_path(),
        }
    }

    /// Bridge with explicit interpreter and entrypoint paths.
    pub fn with_paths(interpreter: impl Into<PathBuf>, entrypoint: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            entrypoint: entrypoint.into(),
        }
    }

    /// Execute a resolved request to completion.
    pub async fn execute(&self, request: &ResolvedRequest) -> Result<AiderOutput, BridgeError> {
        self.execute_with(request, ExecuteOptions::default()).await
    }

    /// Execute a resolved request with cancellation and chunk observers.
    pub async fn execute_with(
        &self,
        request: &ResolvedRequest,
        options: ExecuteOptions,
    ) -> Result<AiderOutput, BridgeError> {
        // Distinguishes "bootstrap never ran" from "subprocess crashed",
        // before any spawn primitive runs.
        if !self.interpreter.exists() {
            return Err(EnvironmentError::InterpreterMissing {
                path: self.interpreter.clone(),
            }
            .into());
        }

        let payload = request.payload_json()?;

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&self.entrypoint)
            .arg(&payload)
            .current_dir(&request.repo_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // The override shadows the ambient credential for this child only;
        // the parent environment is never touched. With an ambient-only
        // credential the child sees it through plain inheritance.
        if let Some(key) = &request.api_key_override {
            cmd.env(OPENAI_API_KEY_VAR, key);
        }

        debug!(
            interpreter = %self.interpreter.display(),
            repo = %request.repo_path.display(),
            model = %request.model,
            "spawning aider interpreter"
        );

        let mut child = cmd.spawn().map_err(|e| BridgeError::Spawn {
            reason: e.to_string(),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| BridgeError::Spawn {
            reason: "missing stdout pipe".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| BridgeError::Spawn {
            reason: "missing stderr pipe".to_string(),
        })?;

        let stdout_task = spawn_chunk_reader(stdout, "stdout", options.on_stdout);
        let stderr_task = spawn_chunk_reader(stderr, "stderr", options.on_stderr);

        let status = if let Some(token) = options.cancel_token {
            tokio::select! {
                () = token.cancelled() => {
                    let _ = child.kill().await;
                    return Err(BridgeError::Cancelled);
                }
                status = child.wait() => status?,
            }
        } else {
            child.wait().await?
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        debug!(code = ?status.code(), "aider interpreter exited");

        if status.success() {
            Ok(AiderOutput { stdout, stderr })
        } else {
            Err(BridgeError::Subprocess {
                code: status.code(),
                stdout,
                stderr,
            })
        }
    }
}

/// Read a stream as byte lines with lossy UTF-8 decoding.
///
/// Each chunk is forwarded to the observer and appended to the accumulator;
/// the returned buffer is the exact concatenation of the forwarded chunks
/// in arrival order. Terminators are kept. Read errors end the stream with
/// whatever arrived before them; the exit status governs the outcome.
fn spawn_chunk_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    stream_name: &'static str,
    observer: Option<OutputCallback>,
) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut accumulated = String::new();
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    let chunk = String::from_utf8_lossy(&buf);
                    debug!(stream = %stream_name, "{}", chunk.trim_end());
                    if let Some(ref cb) = observer {
                        cb(&chunk);
                    }
                    accumulated.push_str(&chunk);
                }
                Err(e) => {
                    debug!(stream = %stream_name, error = %e, "output reader exiting on read error");
                    break;
                }
            }
        }

        accumulated
    })
}
