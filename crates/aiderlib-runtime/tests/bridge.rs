//! Bridge integration tests against fake interpreter processes.
//!
//! Each test stands up a shell script in place of the provisioned Python
//! interpreter. The bridge passes the entrypoint path as the first argument
//! and the JSON payload as the second, so scripts can inspect both.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use aiderlib_core::{resolve, AiderRequest, AmbientCredentials, ResolvedRequest};
use aiderlib_runtime::{AiderBridge, BridgeError, ExecuteOptions};
use tokio_util::sync::CancellationToken;

fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake_interpreter.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn bridge_with(script: &Path, dir: &Path) -> AiderBridge {
    AiderBridge::with_paths(script, dir.join("aider_entrypoint.py"))
}

fn request_in(repo: &Path) -> ResolvedRequest {
    resolve(
        AiderRequest::new("say hello", "gpt-4o-mini", repo),
        &AmbientCredentials::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn captures_stdout_and_stderr_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "printf 'hello'\nprintf 'warn' >&2\nexit 0");

    let output = bridge_with(&script, dir.path())
        .execute(&request_in(dir.path()))
        .await
        .unwrap();

    assert_eq!(output.stdout, "hello");
    assert_eq!(output.stderr, "warn");
}

#[tokio::test]
async fn nonzero_exit_carries_captured_output() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "printf 'partial'\nprintf 'boom' >&2\nexit 1");

    let err = bridge_with(&script, dir.path())
        .execute(&request_in(dir.path()))
        .await
        .unwrap_err();

    match err {
        BridgeError::Subprocess {
            code,
            stdout,
            stderr,
        } => {
            assert_eq!(code, Some(1));
            assert_eq!(stdout, "partial");
            assert_eq!(stderr, "boom");
        }
        other => panic!("expected Subprocess error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_interpreter_fails_before_spawn() {
    let dir = tempfile::tempdir().unwrap();

    let bridge = AiderBridge::with_paths(
        "/definitely/not/a/python",
        dir.path().join("aider_entrypoint.py"),
    );
    let err = bridge.execute(&request_in(dir.path())).await.unwrap_err();

    assert!(matches!(
        err,
        BridgeError::Environment(aiderlib_core::EnvironmentError::InterpreterMissing { .. })
    ));
}

#[tokio::test]
async fn payload_is_delivered_as_single_json_argument() {
    let dir = tempfile::tempdir().unwrap();
    // $1 is the entrypoint path, $2 the payload.
    let script = write_script(dir.path(), "printf '%s' \"$2\"");

    let output = bridge_with(&script, dir.path())
        .execute(&request_in(dir.path()))
        .await
        .unwrap();

    let payload: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(payload["prompt"], "say hello");
    assert_eq!(payload["modelName"], "gpt-4o-mini");
    assert!(payload.get("apiKey").is_none());
}

#[tokio::test]
async fn api_key_override_reaches_the_child_only() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "printf '%s' \"$OPENAI_API_KEY\"");

    let request = resolve(
        AiderRequest::new("say hello", "gpt-4o-mini", dir.path())
            .with_api_base("https://proxy.local/v1")
            .with_api_key("sk-override"),
        &AmbientCredentials::default(),
    )
    .unwrap();

    let ambient_before = std::env::var("OPENAI_API_KEY").ok();
    let output = bridge_with(&script, dir.path())
        .execute(&request)
        .await
        .unwrap();

    assert_eq!(output.stdout, "sk-override");
    // The parent environment was never mutated.
    assert_eq!(std::env::var("OPENAI_API_KEY").ok(), ambient_before);
}

#[tokio::test]
async fn chunks_concatenate_to_the_final_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "printf 'one\\ntwo\\n'\nprintf 'three\\n'");

    let chunks: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&chunks);
    let options = ExecuteOptions {
        on_stdout: Some(Box::new(move |chunk: &str| {
            sink.lock().unwrap().push(chunk.to_string());
        })),
        ..ExecuteOptions::default()
    };

    let output = bridge_with(&script, dir.path())
        .execute_with(&request_in(dir.path()), options)
        .await
        .unwrap();

    assert_eq!(output.stdout, "one\ntwo\nthree\n");
    let observed: String = chunks.lock().unwrap().concat();
    assert_eq!(observed, output.stdout);
}

#[tokio::test]
async fn cancellation_kills_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "sleep 5");

    let token = CancellationToken::new();
    let options = ExecuteOptions {
        cancel_token: Some(token.clone()),
        ..ExecuteOptions::default()
    };

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = bridge_with(&script, dir.path())
        .execute_with(&request_in(dir.path()), options)
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn child_runs_inside_the_repository() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().canonicalize().unwrap();
    let script = write_script(&repo, "pwd");

    let output = bridge_with(&script, &repo)
        .execute(&request_in(&repo))
        .await
        .unwrap();

    assert_eq!(
        PathBuf::from(output.stdout.trim()).canonicalize().unwrap(),
        repo
    );
}
