//! Daemon lifecycle specs (spec.md §4.4, §4.7, §6): the binary starts the
//! IPC timer server and the orchestrator loop, answers `/health`, and
//! shuts down cleanly (exit 0) on SIGTERM without killing in-flight work.

use crate::prelude::*;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn binary_path() -> std::path::PathBuf {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug/panicforged");
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("panicforged");
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

#[test]
fn starts_ipc_server_and_shuts_down_cleanly_on_sigterm() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store_path = tmp.path().join("store.sqlite");
    let base_repo_path = tmp.path().to_path_buf();
    let port = free_port();
    let config_path = write_config(tmp.path(), port, &store_path, &base_repo_path);

    let mut child = Command::new(binary_path())
        .arg(&config_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn panicforged");

    let client = reqwest::blocking::Client::new();
    let health_url = format!("http://127.0.0.1:{port}/health");
    let deadline = Instant::now() + STARTUP_TIMEOUT;
    let mut healthy = false;
    while Instant::now() < deadline {
        if let Ok(resp) = client.get(&health_url).send() {
            if resp.status().is_success() {
                let body: serde_json::Value = resp.json().expect("health body is json");
                assert_eq!(body["status"], "ok");
                assert_eq!(body["trackedPanics"], 0);
                healthy = true;
                break;
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    assert!(healthy, "panicforged never became healthy on {health_url}");

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).expect("send SIGTERM");

    let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
    let status = loop {
        if let Some(status) = child.try_wait().expect("try_wait") {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("panicforged did not exit within {SHUTDOWN_TIMEOUT:?} of SIGTERM");
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    assert!(status.success(), "expected clean exit, got {status:?}");
}
