// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Sandbox Executor (spec.md §4.1): runs shell commands inside a named,
//! copy-on-write session. Session creation is implicit on first `run`; the
//! executor composes commands as `sandbox-cli run --session <name> <command>`,
//! matching the teacher's own direct-`tokio::process::Command` style for
//! shelling out (`engine::executor::Effect::Shell`).

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to spawn {binary}: {source}")]
    SpawnFailed {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("io error communicating with sandbox: {0}")]
    Io(#[from] std::io::Error),
}

/// Optional per-call knobs for [`SandboxExecutor::run`] (spec.md §4.1).
/// Command-level timeouts here are advisory (spec.md §5): callers opt in
/// per call, the executor does not impose one on its own.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub timeout: Option<Duration>,
    pub cwd: Option<PathBuf>,
}

/// `{stdout, stderr, exit_code}` (spec.md §4.1). Non-zero exit codes are
/// reported here, not raised as an error — only spawn failures are errors.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// The terminal outcome of a spawned agent process, reported once over
/// [`SpawnedAgent::exit`]. `stderr` is the process's full stderr, captured
/// in memory the same way `run`'s is (spec.md §4.5: "Collect stdout/stderr
/// in full").
#[derive(Debug, Clone)]
pub struct ExitOutcome {
    pub exit_code: i32,
    pub stderr: String,
}

/// A live handle to a spawned, long-running agent process (spec.md §4.5).
/// Unlike [`SandboxExecutor::run`], this does not block until the process
/// exits: the caller polls the IPC timer independently and can request a
/// graceful-then-forceful shutdown while the process is still running.
pub struct SpawnedAgent {
    pub pid: Option<u32>,
    pub stdout_lines: mpsc::Receiver<String>,
    pub exit: oneshot::Receiver<ExitOutcome>,
    pub(crate) term_tx: Option<oneshot::Sender<()>>,
    pub(crate) kill_tx: Option<oneshot::Sender<()>>,
}

impl SpawnedAgent {
    /// Requests a graceful shutdown (SIGTERM for the OS backend). A no-op
    /// if already requested.
    pub fn request_terminate(&mut self) {
        if let Some(tx) = self.term_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Requests a forceful shutdown (SIGKILL for the OS backend). A no-op
    /// if already requested.
    pub fn request_kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Runs shell commands inside a named, copy-on-write session
/// (spec.md §4.1). Implementors must be safely shareable across the
/// concurrently-driven per-item tasks (spec.md §5).
#[async_trait]
pub trait SandboxExecutor: Send + Sync + 'static {
    /// Runs `command` (a single shell line; quoting is the caller's
    /// responsibility) to completion, capturing stdout/stderr fully in
    /// memory. Session creation is implicit on first call.
    async fn run(&self, session: &str, command: &str, opts: RunOptions) -> Result<CommandOutput, SandboxError>;

    /// Idempotent; a no-op if the session is already absent.
    async fn delete(&self, session: &str) -> Result<(), SandboxError>;

    async fn exists(&self, session: &str) -> Result<bool, SandboxError>;

    /// Spawns `command` as a long-running process inside `session` without
    /// waiting for it to exit (spec.md §4.5). `env` is passed through to
    /// the spawned process, e.g. `PANIC_LOCATION`.
    async fn spawn_agent(
        &self,
        session: &str,
        command: &str,
        env: &[(String, String)],
    ) -> Result<SpawnedAgent, SandboxError>;
}

/// Real implementation: shells out to `sandbox-cli`.
pub struct OsSandboxExecutor {
    base_repo_path: PathBuf,
    binary: String,
}

impl OsSandboxExecutor {
    /// A construction helper binding a base repository path as the default
    /// `cwd` for sandbox operations (spec.md §4.1).
    pub fn new(base_repo_path: impl Into<PathBuf>) -> Self {
        Self {
            base_repo_path: base_repo_path.into(),
            binary: "sandbox-cli".to_string(),
        }
    }

    /// Overrides the `sandbox-cli` binary name; used by tests that stub a
    /// fake binary on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn base_command(&self, session: &str, subcommand: &str, opts: &RunOptions) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(opts.cwd.as_deref().unwrap_or(&self.base_repo_path));
        cmd.arg(subcommand).arg("--session").arg(session);
        cmd
    }
}

#[async_trait]
impl SandboxExecutor for OsSandboxExecutor {
    async fn run(&self, session: &str, command: &str, opts: RunOptions) -> Result<CommandOutput, SandboxError> {
        let mut cmd = self.base_command(session, "run", &opts);
        cmd.arg(command);

        let output_fut = cmd.output();
        let output = match opts.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, output_fut).await {
                Ok(result) => result,
                Err(_) => {
                    return Ok(CommandOutput {
                        stdout: String::new(),
                        stderr: format!("command timed out after {timeout:?}"),
                        exit_code: -1,
                    })
                }
            },
            None => output_fut.await,
        };

        let output = output.map_err(|source| SandboxError::SpawnFailed {
            binary: self.binary.clone(),
            source,
        })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    async fn delete(&self, session: &str) -> Result<(), SandboxError> {
        let mut cmd = self.base_command(session, "delete", &RunOptions::default());
        match cmd.output().await {
            Ok(_) => Ok(()),
            // ENOENT on session deletion is ignored (spec.md §7): the
            // binary itself might be missing a worktree for this session,
            // which is indistinguishable from "already deleted" at this
            // boundary.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SandboxError::SpawnFailed {
                binary: self.binary.clone(),
                source,
            }),
        }
    }

    async fn exists(&self, session: &str) -> Result<bool, SandboxError> {
        let mut cmd = self.base_command(session, "exists", &RunOptions::default());
        let status = cmd
            .status()
            .await
            .map_err(|source| SandboxError::SpawnFailed {
                binary: self.binary.clone(),
                source,
            })?;
        Ok(status.success())
    }

    async fn spawn_agent(
        &self,
        session: &str,
        command: &str,
        env: &[(String, String)],
    ) -> Result<SpawnedAgent, SandboxError> {
        let mut cmd = self.base_command(session, "run", &RunOptions::default());
        cmd.arg(command);
        cmd.envs(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| SandboxError::SpawnFailed {
            binary: self.binary.clone(),
            source,
        })?;
        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (line_tx, line_rx) = mpsc::channel(256);
        let (exit_tx, exit_rx) = oneshot::channel();
        let (term_tx, term_rx) = oneshot::channel();
        let (kill_tx, kill_rx) = oneshot::channel();

        tokio::spawn(run_child_to_completion(child, stdout, stderr, line_tx, exit_tx, term_rx, kill_rx));

        Ok(SpawnedAgent {
            pid,
            stdout_lines: line_rx,
            exit: exit_rx,
            term_tx: Some(term_tx),
            kill_tx: Some(kill_tx),
        })
    }
}

async fn run_child_to_completion(
    mut child: tokio::process::Child,
    stdout: Option<tokio::process::ChildStdout>,
    stderr: Option<tokio::process::ChildStderr>,
    line_tx: mpsc::Sender<String>,
    exit_tx: oneshot::Sender<ExitOutcome>,
    mut term_rx: oneshot::Receiver<()>,
    mut kill_rx: oneshot::Receiver<()>,
) {
    let mut lines = stdout.map(|s| BufReader::new(s).lines());
    // Read stderr to completion on its own task, concurrently with the
    // stdout line loop and the child's own progress; joined just before
    // reporting the exit outcome.
    let stderr_task = stderr.map(|mut s| {
        tokio::spawn(async move {
            let mut buf = String::new();
            let _ = s.read_to_string(&mut buf).await;
            buf
        })
    });
    let mut term_sent = false;
    let mut kill_sent = false;

    loop {
        tokio::select! {
            line = next_line(&mut lines) => {
                match line {
                    Some(l) => {
                        if line_tx.send(l).await.is_err() {
                            // Receiver dropped; keep draining the child
                            // without forwarding so it can still exit.
                        }
                    }
                    None => {
                        // stdout closed (or absent); fall through to wait.
                        break;
                    }
                }
            }
            _ = &mut term_rx, if !term_sent => {
                term_sent = true;
                send_signal(child.id(), nix::sys::signal::Signal::SIGTERM);
            }
            _ = &mut kill_rx, if !kill_sent => {
                kill_sent = true;
                let _ = child.start_kill();
            }
        }
    }

    let status = child.wait().await;
    let exit_code = status.ok().and_then(|s| s.code()).unwrap_or(-1);
    let stderr = match stderr_task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };
    let _ = exit_tx.send(ExitOutcome { exit_code, stderr });
}

async fn next_line(lines: &mut Option<tokio::io::Lines<BufReader<tokio::process::ChildStdout>>>) -> Option<String> {
    match lines {
        Some(l) => l.next_line().await.ok().flatten(),
        None => std::future::pending().await,
    }
}

#[cfg(unix)]
fn send_signal(pid: Option<u32>, signal: nix::sys::signal::Signal) {
    if let Some(pid) = pid {
        let _ = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), signal);
    }
}

#[cfg(not(unix))]
fn send_signal(_pid: Option<u32>, _signal: nix::sys::signal::Signal) {}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
