// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixing (spec.md §4.6.4): runs the fixer agent against the fixer prompt,
//! then the language-appropriate lint-fix and formatter, then commits.

use crate::error::HandlerError;
use crate::handler::{Handler, HandlerResult, WorkflowContext};
use async_trait::async_trait;
use panicforge_core::{Phase, Status};
use panicforge_sandbox::{AgentRunner, RunOptions, SandboxExecutor};

pub struct FixingHandler;

const AGENT_FLAGS: &str = "--dangerously-skip-permissions --output-format stream-json --prompt {prompt}";

/// Lint-fix and formatter commands are non-fatal (spec.md §4.6.4): a
/// failing linter or formatter must not block shipping a working fix.
const LINT_FIX_CMD: &str = "make lint-fix";
const FORMAT_CMD: &str = "make format";

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

async fn run_non_fatal<E: SandboxExecutor>(ctx: &WorkflowContext<E>, step: &'static str, command: &str) {
    match run_step(ctx, step, command).await {
        Ok(output) if output.exit_code != 0 => {
            tracing::warn!(
                panic_location = %ctx.item.panic_location,
                step,
                stderr = %output.stderr,
                "non-fatal step failed"
            );
        }
        Err(e) => {
            tracing::warn!(panic_location = %ctx.item.panic_location, step, error = %e, "non-fatal step errored");
        }
        Ok(_) => {}
    }
}

fn is_nothing_to_commit(output: &panicforge_sandbox::CommandOutput) -> bool {
    output.stdout.contains("nothing to commit") || output.stderr.contains("nothing to commit")
}

#[async_trait]
impl<E: SandboxExecutor> Handler<E> for FixingHandler {
    async fn handle(&self, ctx: &WorkflowContext<E>) -> HandlerResult {
        match self.run(ctx).await {
            Ok(result) => result,
            Err(e) => HandlerResult::needs_human_review(e.into_workflow_error(Phase::Fixing)),
        }
    }
}

impl FixingHandler {
    async fn run<E: SandboxExecutor>(&self, ctx: &WorkflowContext<E>) -> Result<HandlerResult, HandlerError> {
        let prompt_path = &ctx.config.agents.fixer_prompt_path;
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
                ctx.config.budgets.fixer_ms,
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

        run_non_fatal(ctx, "lint-fix", LINT_FIX_CMD).await;
        run_non_fatal(ctx, "format", FORMAT_CMD).await;

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
            &format!("git commit -m 'fix: {}'", ctx.item.panic_location),
        )
        .await?;
        if commit.exit_code != 0 {
            if is_nothing_to_commit(&commit) {
                tracing::warn!(
                    panic_location = %ctx.item.panic_location,
                    "fixer produced no changes to commit"
                );
            } else {
                return Err(HandlerError::SandboxStepFailed {
                    step: "git commit".to_string(),
                    stderr: commit.stderr,
                });
            }
        }

        Ok(HandlerResult::advance(Status::Shipping))
    }
}

#[cfg(test)]
#[path = "fixing_tests.rs"]
mod tests;
