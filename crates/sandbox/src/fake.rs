// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake sandbox executor for testing.

use crate::executor::{CommandOutput, ExitOutcome, RunOptions, SandboxError, SandboxExecutor, SpawnedAgent};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Recorded sandbox call.
#[derive(Debug, Clone)]
pub enum SandboxCall {
    Run {
        session: String,
        command: String,
    },
    Delete {
        session: String,
    },
    Exists {
        session: String,
    },
    SpawnAgent {
        session: String,
        command: String,
        env: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone)]
struct RunScript {
    output: CommandOutput,
}

fn default_command_output() -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: String::new(),
        exit_code: 0,
    }
}

enum AgentScript {
    Success { lines: Vec<String>, exit_code: i32, stderr: String },
    /// Like `Success`, but the process doesn't exit until `delay` has
    /// elapsed — for tests that need real wall-clock time to pass while
    /// the IPC timer is paused/resumed around the run.
    DelayedSuccess { delay: std::time::Duration, exit_code: i32 },
    Hang,
}

struct FakeState {
    calls: Vec<SandboxCall>,
    run_scripts: HashMap<String, RunScript>,
    command_scripts: Vec<(String, String, CommandOutput)>,
    existing_sessions: HashMap<String, bool>,
    agent_scripts: HashMap<String, std::collections::VecDeque<AgentScript>>,
}

/// Fake sandbox executor for testing.
#[derive(Clone)]
pub struct FakeSandboxExecutor {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeSandboxExecutor {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                run_scripts: HashMap::new(),
                command_scripts: Vec::new(),
                existing_sessions: HashMap::new(),
                agent_scripts: HashMap::new(),
            })),
        }
    }
}

impl FakeSandboxExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SandboxCall> {
        self.inner.lock().calls.clone()
    }

    /// Makes the next `run()` for `session` return `output` regardless of
    /// the command given.
    pub fn script_run(&self, session: &str, output: CommandOutput) {
        self.inner
            .lock()
            .run_scripts
            .insert(session.to_string(), RunScript { output });
    }

    /// Makes `run()` for `session` return `output` only when `command`
    /// contains `command_substring`; takes priority over [`Self::script_run`]'s
    /// session-wide default. Scripts are checked in registration order.
    pub fn script_run_for_command(&self, session: &str, command_substring: &str, output: CommandOutput) {
        self.inner
            .lock()
            .command_scripts
            .push((session.to_string(), command_substring.to_string(), output));
    }

    pub fn set_exists(&self, session: &str, exists: bool) {
        self.inner.lock().existing_sessions.insert(session.to_string(), exists);
    }

    /// Makes the next `spawn_agent()` for `session` emit `lines` over
    /// stdout, then exit cleanly with `exit_code`. Scripts for a session
    /// are consumed in FIFO order, one per call — register one per
    /// expected `spawn_agent` invocation (e.g. reproducer, then fixer).
    pub fn script_agent_success(&self, session: &str, lines: Vec<String>, exit_code: i32) {
        self.script_agent_outcome(session, lines, exit_code, String::new());
    }

    /// Like [`Self::script_agent_success`], but also sets the process's
    /// captured stderr — for exercising `AgentRunResult::stderr` on a
    /// failing agent run.
    pub fn script_agent_outcome(&self, session: &str, lines: Vec<String>, exit_code: i32, stderr: String) {
        self.inner
            .lock()
            .agent_scripts
            .entry(session.to_string())
            .or_default()
            .push_back(AgentScript::Success { lines, exit_code, stderr });
    }

    /// Makes the next `spawn_agent()` for `session` exit cleanly with
    /// `exit_code` only after `delay` real time has passed, emitting no
    /// stdout lines. FIFO-queued alongside the other `script_agent_*`
    /// helpers.
    pub fn script_agent_delayed_success(&self, session: &str, delay: std::time::Duration, exit_code: i32) {
        self.inner
            .lock()
            .agent_scripts
            .entry(session.to_string())
            .or_default()
            .push_back(AgentScript::DelayedSuccess { delay, exit_code });
    }

    /// Makes the next `spawn_agent()` for `session` never exit on its own;
    /// it only terminates once `request_terminate`/`request_kill` is
    /// called. FIFO-queued alongside [`Self::script_agent_success`].
    pub fn script_agent_hang(&self, session: &str) {
        self.inner
            .lock()
            .agent_scripts
            .entry(session.to_string())
            .or_default()
            .push_back(AgentScript::Hang);
    }
}

#[async_trait]
impl SandboxExecutor for FakeSandboxExecutor {
    async fn run(&self, session: &str, command: &str, _opts: RunOptions) -> Result<CommandOutput, SandboxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SandboxCall::Run {
            session: session.to_string(),
            command: command.to_string(),
        });
        let matched = inner
            .command_scripts
            .iter()
            .find(|(s, substr, _)| s == session && command.contains(substr.as_str()))
            .map(|(_, _, output)| output.clone());
        Ok(matched.unwrap_or_else(|| {
            inner
                .run_scripts
                .get(session)
                .map(|s| s.output.clone())
                .unwrap_or_else(default_command_output)
        }))
    }

    async fn delete(&self, session: &str) -> Result<(), SandboxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SandboxCall::Delete {
            session: session.to_string(),
        });
        inner.existing_sessions.insert(session.to_string(), false);
        Ok(())
    }

    async fn exists(&self, session: &str) -> Result<bool, SandboxError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SandboxCall::Exists {
            session: session.to_string(),
        });
        Ok(inner.existing_sessions.get(session).copied().unwrap_or(false))
    }

    async fn spawn_agent(
        &self,
        session: &str,
        command: &str,
        env: &[(String, String)],
    ) -> Result<SpawnedAgent, SandboxError> {
        let script = {
            let mut inner = self.inner.lock();
            inner.calls.push(SandboxCall::SpawnAgent {
                session: session.to_string(),
                command: command.to_string(),
                env: env.to_vec(),
            });
            inner
                .agent_scripts
                .get_mut(session)
                .and_then(|queue| queue.pop_front())
        };

        let (line_tx, line_rx) = mpsc::channel(256);
        let (exit_tx, exit_rx) = oneshot::channel();
        let (term_tx, term_rx) = oneshot::channel();
        let (kill_tx, kill_rx) = oneshot::channel();

        match script {
            Some(AgentScript::Success { lines, exit_code, stderr }) => {
                tokio::spawn(async move {
                    for line in lines {
                        if line_tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    let _ = exit_tx.send(ExitOutcome { exit_code, stderr });
                });
            }
            Some(AgentScript::DelayedSuccess { delay, exit_code }) => {
                tokio::spawn(async move {
                    drop(line_tx);
                    tokio::time::sleep(delay).await;
                    let _ = exit_tx.send(ExitOutcome { exit_code, stderr: String::new() });
                });
            }
            Some(AgentScript::Hang) | None => {
                tokio::spawn(async move {
                    drop(line_tx);
                    let mut term_rx = term_rx;
                    let mut kill_rx = kill_rx;
                    loop {
                        tokio::select! {
                            _ = &mut term_rx => {}
                            _ = &mut kill_rx => {
                                let _ = exit_tx.send(ExitOutcome { exit_code: -1, stderr: String::new() });
                                break;
                            }
                        }
                    }
                });
                return Ok(SpawnedAgent {
                    pid: Some(0),
                    stdout_lines: line_rx,
                    exit: exit_rx,
                    term_tx: Some(term_tx),
                    kill_tx: Some(kill_tx),
                });
            }
        }

        Ok(SpawnedAgent {
            pid: Some(0),
            stdout_lines: line_rx,
            exit: exit_rx,
            term_tx: Some(term_tx),
            kill_tx: Some(kill_tx),
        })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
