// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reproducing (spec.md §4.6.3): installs tool bindings, runs the
//! reproducer agent against the reproducer prompt, and commits its
//! findings.

use crate::error::HandlerError;
use crate::handler::{Handler, HandlerResult, WorkflowContext};
use async_trait::async_trait;
use panicforge_core::{Phase, Status};
use panicforge_sandbox::{AgentRunner, RunOptions, SandboxExecutor};

pub struct ReproducingHandler;

/// One-shot setup so in-session tools (including the IPC-timer bridge) are
/// available before the agent runs (spec.md §4.6.3).
const TOOL_BINDINGS_SETUP_CMD: &str = "panicforge-bindings install";

const AGENT_FLAGS: &str = "--dangerously-skip-permissions --output-format stream-json --prompt {prompt}";

async fn run_step<E: SandboxExecutor>(
    ctx: &WorkflowContext<E>,
    step: &'static str,
    command: &str,
) -> Result<panicforge_sandbox::CommandOutput, HandlerError> {
    ctx.sandbox
        .run(&ctx.session, command, RunOptions::default())
        .await
        .map_err(|e| HandlerError::Unexpected(format!("{step}: {e}")))
}

fn is_nothing_to_commit(output: &panicforge_sandbox::CommandOutput) -> bool {
    output.stdout.contains("nothing to commit") || output.stderr.contains("nothing to commit")
}

#[async_trait]
impl<E: SandboxExecutor> Handler<E> for ReproducingHandler {
    async fn handle(&self, ctx: &WorkflowContext<E>) -> HandlerResult {
        match self.run(ctx).await {
            Ok(result) => result,
            Err(e) => HandlerResult::needs_human_review(e.into_workflow_error(Phase::Reproducing)),
        }
    }
}

impl ReproducingHandler {
    async fn run<E: SandboxExecutor>(&self, ctx: &WorkflowContext<E>) -> Result<HandlerResult, HandlerError> {
        let setup = run_step(ctx, "install tool bindings", TOOL_BINDINGS_SETUP_CMD).await?;
        if setup.exit_code != 0 {
            return Err(HandlerError::SandboxStepFailed {
                step: "install tool bindings".to_string(),
                stderr: setup.stderr,
            });
        }

        let prompt_path = &ctx.config.agents.reproducer_prompt_path;
        let prompt = std::fs::read_to_string(prompt_path).map_err(|e| {
            HandlerError::Unexpected(format!("failed to read prompt file {}: {e}", prompt_path.display()))
        })?;

        let command_template = format!("{} {AGENT_FLAGS}", ctx.config.agents.binary);
        let runner = AgentRunner::new(ctx.sandbox.clone(), ctx.timer.clone());
        let run_result = runner
            .run_agent(
                &ctx.session,
                &ctx.item.panic_location,
                &prompt,
                ctx.config.budgets.reproducer_ms,
                &command_template,
                None,
            )
            .await
            .map_err(|e| HandlerError::Unexpected(e.to_string()))?;

        if run_result.timed_out {
            return Err(HandlerError::AgentTimeout);
        }
        if run_result.exit_code != 0 {
            return Err(HandlerError::AgentNonZeroExit {
                exit_code: run_result.exit_code,
                stderr: run_result.stderr,
            });
        }

        let add = run_step(ctx, "git add", "git add -A").await?;
        if add.exit_code != 0 {
            return Err(HandlerError::SandboxStepFailed {
                step: "git add".to_string(),
                stderr: add.stderr,
            });
        }
        let commit = run_step(
            ctx,
            "git commit",
            &format!("git commit -m 'reproducer: {}'", ctx.item.panic_location),
        )
        .await?;
        if commit.exit_code != 0 {
            if is_nothing_to_commit(&commit) {
                tracing::warn!(
                    panic_location = %ctx.item.panic_location,
                    "reproducer produced no changes to commit"
                );
            } else {
                return Err(HandlerError::SandboxStepFailed {
                    step: "git commit".to_string(),
                    stderr: commit.stderr,
                });
            }
        }

        Ok(HandlerResult::advance(Status::Fixing))
    }
}

#[cfg(test)]
#[path = "reproducing_tests.rs"]
mod tests;
