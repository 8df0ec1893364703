// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Sandbox Executor and Agent Runner (spec.md §4.1, §4.5): the only crate
//! that touches the process/filesystem namespace of a session.

mod escape;
mod executor;
mod runner;
mod stream_event;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use escape::shell_single_quote_escape;
pub use executor::{CommandOutput, ExitOutcome, OsSandboxExecutor, RunOptions, SandboxError, SandboxExecutor, SpawnedAgent};
pub use runner::{AgentRunError, AgentRunner, AgentRunResult};
pub use stream_event::{parse_stream_line, StreamEvent};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSandboxExecutor, SandboxCall};
