// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repo Setup (spec.md §4.6.2): creates the feature branch, writes the
//! auto-generated simulator test file derived from `sql_statements`, seeds
//! the context document, and commits.

use crate::error::HandlerError;
use crate::handler::{Handler, HandlerResult, WorkflowContext};
use async_trait::async_trait;
use panicforge_core::{ContextData, Phase, Status};
use panicforge_sandbox::{RunOptions, SandboxExecutor};
use panicforge_storage::ContextDocument;
use serde_json::json;

pub struct RepoSetupHandler;

/// Deterministic filename for the generated simulator test, matching the
/// `tcl_test_file` field the context document records (spec.md §3).
fn tcl_test_file_name(panic_location: &str) -> String {
    let sanitized: String = panic_location
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("test_{sanitized}.tcl")
}

/// A minimal TCL test harness seeding the simulator with the reported SQL
/// statements (spec.md §3 `sql_statements`: "newline-joined seed
/// statements"). The reproducer agent extends this until the panic is
/// deterministically triggered.
fn tcl_test_file_contents(panic_location: &str, panic_message: &str, sql_statements: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Auto-generated by panicforge for {panic_location}\n"));
    out.push_str(&format!("# Reported panic: {panic_message}\n\n"));
    for statement in sql_statements.lines() {
        if statement.trim().is_empty() {
            continue;
        }
        out.push_str(&format!("execsql {{{statement}}}\n"));
    }
    out
}

async fn run_step<E: SandboxExecutor>(
    ctx: &WorkflowContext<E>,
    step: &'static str,
    command: &str,
) -> Result<(), HandlerError> {
    let output = ctx
        .sandbox
        .run(&ctx.session, command, RunOptions::default())
        .await
        .map_err(|e| HandlerError::Unexpected(e.to_string()))?;
    if output.exit_code != 0 {
        return Err(HandlerError::SandboxStepFailed {
            step: step.to_string(),
            stderr: output.stderr,
        });
    }
    Ok(())
}

#[async_trait]
impl<E: SandboxExecutor> Handler<E> for RepoSetupHandler {
    async fn handle(&self, ctx: &WorkflowContext<E>) -> HandlerResult {
        match self.run(ctx).await {
            Ok(result) => result,
            Err(e) => HandlerResult::needs_human_review(e.into_workflow_error(Phase::RepoSetup)),
        }
    }
}

impl RepoSetupHandler {
    async fn run<E: SandboxExecutor>(&self, ctx: &WorkflowContext<E>) -> Result<HandlerResult, HandlerError> {
        run_step(
            ctx,
            "git checkout -b",
            &format!("git checkout -b {}", ctx.branch),
        )
        .await?;

        let tcl_test_file = tcl_test_file_name(&ctx.item.panic_location);
        let contents = tcl_test_file_contents(&ctx.item.panic_location, &ctx.item.panic_message, &ctx.item.sql_statements);
        let session_root = ctx.session_root();
        std::fs::create_dir_all(&session_root).map_err(|e| {
            HandlerError::SandboxStepFailed {
                step: "create session root".to_string(),
                stderr: e.to_string(),
            }
        })?;
        std::fs::write(session_root.join(&tcl_test_file), &contents).map_err(|e| {
            HandlerError::SandboxStepFailed {
                step: "write test file".to_string(),
                stderr: e.to_string(),
            }
        })?;

        let mut context_data = ContextData::new();
        context_data.0.insert("panic_location".to_string(), json!(ctx.item.panic_location));
        context_data.0.insert("panic_message".to_string(), json!(ctx.item.panic_message));
        context_data.0.insert("tcl_test_file".to_string(), json!(tcl_test_file));
        ContextDocument::new(ctx.context_doc_path())
            .write(&context_data)
            .map_err(|e| HandlerError::SandboxStepFailed {
                step: "write context document".to_string(),
                stderr: e.to_string(),
            })?;

        run_step(ctx, "git add", "git add -A").await?;
        run_step(
            ctx,
            "git commit",
            &format!("git commit -m 'setup: {}'", ctx.item.panic_location),
        )
        .await?;

        Ok(HandlerResult::advance_with_branch(Status::Reproducing, ctx.branch.clone()))
    }
}

#[cfg(test)]
#[path = "repo_setup_tests.rs"]
mod tests;
