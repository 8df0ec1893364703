// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Runner (spec.md §4.5): drives one coding-agent invocation to
//! completion inside a sandbox session, enforcing the IPC-timer-aware wall
//! clock budget and capturing streamed stdout.

use crate::escape::shell_single_quote_escape;
use crate::executor::{ExitOutcome, SandboxError, SandboxExecutor};
use crate::stream_event::{parse_stream_line, StreamEvent};
use panicforge_timer::TimerRegistry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Lines are buffered up to this many bytes; oldest lines are dropped at
/// line boundaries once the cap is exceeded (spec.md §4.5).
const OUTPUT_BUFFER_CAP_BYTES: usize = 1024 * 1024;

/// How often the runner polls the IPC timer for a timeout while the agent
/// is still running (spec.md §4.5).
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Grace period between SIGTERM and SIGKILL when the timer expires
/// (spec.md §4.5).
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum AgentRunError {
    #[error("sandbox error: {0}")]
    Sandbox(#[from] SandboxError),
}

/// The outcome of one agent invocation (spec.md §4.5). `timed_out` is set
/// when the runner terminated the process itself; `exit_code` still
/// reflects whatever the process reported (or -1 if killed before it
/// could report one).
#[derive(Debug, Clone)]
pub struct AgentRunResult {
    pub success: bool,
    pub timed_out: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed_ms: u64,
}

/// A capped ring buffer over line-buffered text: appending past the byte
/// cap drops the oldest complete lines first.
#[derive(Default)]
struct CappedLines {
    lines: std::collections::VecDeque<String>,
    bytes: usize,
    cap: usize,
}

impl CappedLines {
    fn new(cap: usize) -> Self {
        Self {
            lines: std::collections::VecDeque::new(),
            bytes: 0,
            cap,
        }
    }

    fn push(&mut self, line: String) {
        self.bytes += line.len() + 1;
        self.lines.push_back(line);
        while self.bytes > self.cap {
            if let Some(dropped) = self.lines.pop_front() {
                self.bytes -= dropped.len() + 1;
            } else {
                break;
            }
        }
    }

    fn join(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

/// Drives a single agent invocation, streaming parsed events to an
/// optional callback while polling the IPC timer for expiry
/// (spec.md §4.5).
pub struct AgentRunner<E: SandboxExecutor> {
    executor: Arc<E>,
    timer: Arc<TimerRegistry>,
}

impl<E: SandboxExecutor> AgentRunner<E> {
    pub fn new(executor: Arc<E>, timer: Arc<TimerRegistry>) -> Self {
        Self { executor, timer }
    }

    /// Runs `prompt` as the agent's task inside `session`, tracking it
    /// against `panic_location`'s timer budget (`budget_ms`). `on_event`,
    /// if given, is invoked for every successfully parsed stdout line, in
    /// order, as the agent runs.
    pub async fn run_agent(
        &self,
        session: &str,
        panic_location: &str,
        prompt: &str,
        budget_ms: u64,
        command_template: &str,
        mut on_event: Option<&mut dyn FnMut(StreamEvent)>,
    ) -> Result<AgentRunResult, AgentRunError> {
        let escaped_prompt = shell_single_quote_escape(prompt);
        let command = command_template.replace("{prompt}", &escaped_prompt);
        let env = vec![("PANIC_LOCATION".to_string(), panic_location.to_string())];

        self.timer.start_tracking(panic_location);

        let mut agent = match self.executor.spawn_agent(session, &command, &env).await {
            Ok(agent) => agent,
            Err(e) => {
                self.timer.stop_tracking(panic_location);
                return Err(e.into());
            }
        };

        let mut stdout_buf = CappedLines::new(OUTPUT_BUFFER_CAP_BYTES);
        let mut timed_out = false;
        let mut term_sent = false;
        let mut term_sent_at: Option<Instant> = None;
        let mut stdout_closed = false;

        let mut exit_outcome: Option<ExitOutcome> = None;
        let mut poll = tokio::time::interval(POLL_INTERVAL);

        loop {
            tokio::select! {
                line = agent.stdout_lines.recv(), if !stdout_closed => {
                    match line {
                        Some(line) => {
                            if let Some(event) = parse_stream_line(&line) {
                                if let Some(cb) = on_event.as_deref_mut() {
                                    cb(event);
                                }
                            }
                            stdout_buf.push(line);
                        }
                        None => {
                            stdout_closed = true;
                        }
                    }
                }
                result = &mut agent.exit => {
                    exit_outcome = result.ok();
                    break;
                }
                _ = poll.tick() => {
                    if !term_sent && self.timer.has_timed_out(panic_location, budget_ms) {
                        timed_out = true;
                        term_sent = true;
                        term_sent_at = Some(Instant::now());
                        agent.request_terminate();
                    } else if term_sent {
                        if let Some(sent_at) = term_sent_at {
                            if sent_at.elapsed() >= TERMINATE_GRACE {
                                agent.request_kill();
                            }
                        }
                    }
                }
            }
        }

        // Capture elapsed time net of simulator pauses before the entry is
        // torn down (spec.md §4.5 step 5): `elapsed_ms` must reflect the
        // IPC timer's view, not raw wall clock.
        let elapsed_ms = self.timer.elapsed_ms(panic_location);
        self.timer.stop_tracking(panic_location);

        let exit_code = exit_outcome.as_ref().map(|o| o.exit_code).unwrap_or(-1);
        let stderr = exit_outcome.map(|o| o.stderr).unwrap_or_default();

        Ok(AgentRunResult {
            success: !timed_out && exit_code == 0,
            timed_out,
            exit_code,
            stdout: stdout_buf.join(),
            stderr,
            elapsed_ms,
        })
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
