// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Preflight (spec.md §4.6.1): sanity-checks that the base repository
//! builds and tests pass before any agent work begins.

use crate::error::HandlerError;
use crate::handler::{Handler, HandlerResult, WorkflowContext};
use async_trait::async_trait;
use panicforge_core::{Phase, Status};
use panicforge_sandbox::{RunOptions, SandboxExecutor};

pub struct PreflightHandler;

async fn run_step<E: SandboxExecutor>(
    ctx: &WorkflowContext<E>,
    command: &str,
) -> Result<panicforge_sandbox::CommandOutput, HandlerError> {
    ctx.sandbox
        .run(&ctx.session, command, RunOptions::default())
        .await
        .map_err(|e| HandlerError::Unexpected(e.to_string()))
}

#[async_trait]
impl<E: SandboxExecutor> Handler<E> for PreflightHandler {
    async fn handle(&self, ctx: &WorkflowContext<E>) -> HandlerResult {
        match self.run(ctx).await {
            Ok(result) => result,
            Err(e) => HandlerResult::needs_human_review(e.into_workflow_error(Phase::Preflight)),
        }
    }
}

impl PreflightHandler {
    async fn run<E: SandboxExecutor>(&self, ctx: &WorkflowContext<E>) -> Result<HandlerResult, HandlerError> {
        let build = run_step(ctx, "make").await?;
        if build.exit_code != 0 {
            return Err(HandlerError::BuildFailed { stderr: build.stderr });
        }

        let test = run_step(ctx, "make test").await?;
        if test.exit_code != 0 {
            return Err(HandlerError::TestsFailed { stderr: test.stderr });
        }

        Ok(HandlerResult::advance(Status::RepoSetup))
    }
}

#[cfg(test)]
#[path = "preflight_tests.rs"]
mod tests;
