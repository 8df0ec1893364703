// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shipping (spec.md §4.6.5): validates the context document, squashes the
//! branch to a single commit, pushes, and opens a draft PR (or, in
//! dry-run, writes the artifacts without calling out).

use crate::commit_message::{build_commit_message, CommitFields};
use crate::error::HandlerError;
use crate::git::{create_draft_pr, push_branch, render_pr_body, squash_to_one_commit};
use crate::handler::{Handler, HandlerResult, WorkflowContext};
use async_trait::async_trait;
use panicforge_core::{validate, Phase, Status, ValidationPhase};
use panicforge_sandbox::SandboxExecutor;
use panicforge_storage::ContextDocument;

pub struct ShippingHandler;

const PR_BODY_TEMPLATE: &str = "\
## Bug

{{bug_description}}

## Fix

{{fix_description}}

## Reproduction

Location: {{panic_location}}
Failing seed: {{failing_seed}}
Why the simulator missed it: {{why_simulator_missed}}
Simulator changes: {{simulator_changes}}
Generated test: {{tcl_test_file}}
";

fn field_str<'a>(value: Option<&'a serde_json::Value>) -> Option<&'a str> {
    value.and_then(|v| v.as_str())
}

#[async_trait]
impl<E: SandboxExecutor> Handler<E> for ShippingHandler {
    async fn handle(&self, ctx: &WorkflowContext<E>) -> HandlerResult {
        match self.run(ctx).await {
            Ok(result) => result,
            Err(e) => HandlerResult::needs_human_review(e.into_workflow_error(Phase::Shipping)),
        }
    }
}

impl ShippingHandler {
    async fn run<E: SandboxExecutor>(&self, ctx: &WorkflowContext<E>) -> Result<HandlerResult, HandlerError> {
        let doc = ContextDocument::new(ctx.context_doc_path());
        let data = doc.read().map_err(|e| match e {
            panicforge_storage::ContextDocError::NotFound(path) => {
                HandlerError::ContextMissing(path.display().to_string())
            }
            other => HandlerError::ContextMalformed(other.to_string()),
        })?;

        let validation = validate(&data, ValidationPhase::Ship);
        if !validation.valid {
            return Err(HandlerError::ContextIncomplete(validation.errors));
        }

        // Best-effort cleanup; the presence of the file in a completed PR
        // is a bug, but a deletion failure must not block shipping.
        if let Err(e) = doc.delete() {
            tracing::warn!(
                panic_location = %ctx.item.panic_location,
                error = %e,
                "failed to delete context document"
            );
        }

        let failing_seed = data
            .get("failing_seed")
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0);
        let bug_description = field_str(data.get("bug_description")).unwrap_or("");
        let fix_description = field_str(data.get("fix_description")).unwrap_or("");
        let why_simulator_missed = field_str(data.get("why_simulator_missed")).unwrap_or("");

        let commit_message = build_commit_message(&CommitFields {
            panic_message: &ctx.item.panic_message,
            panic_location: &ctx.item.panic_location,
            bug_description,
            fix_description,
            failing_seed,
            why_simulator_missed,
        });

        squash_to_one_commit(
            ctx.sandbox.as_ref(),
            &ctx.session,
            &ctx.config.git.default_branch,
            &commit_message,
        )
        .await
        .map_err(|e| HandlerError::SandboxStepFailed {
            step: "squash".to_string(),
            stderr: e.to_string(),
        })?;

        push_branch(ctx.sandbox.as_ref(), &ctx.session, &ctx.branch)
            .await
            .map_err(|e| HandlerError::SandboxStepFailed {
                step: "git push".to_string(),
                stderr: e.to_string(),
            })?;

        let failing_seed_str = failing_seed.to_string();
        let body = render_pr_body(
            PR_BODY_TEMPLATE,
            &[
                ("bug_description", Some(bug_description)),
                ("fix_description", Some(fix_description)),
                ("panic_location", Some(ctx.item.panic_location.as_str())),
                ("failing_seed", Some(failing_seed_str.as_str())),
                ("why_simulator_missed", Some(why_simulator_missed)),
                ("simulator_changes", field_str(data.get("simulator_changes"))),
                ("tcl_test_file", field_str(data.get("tcl_test_file"))),
            ],
        );
        let title = format!("fix: {}", ctx.item.panic_message);

        let pr_url = create_draft_pr(ctx.sandbox.as_ref(), &ctx.session, &ctx.config, &title, &body)
            .await
            .map_err(|e| HandlerError::PrCreationFailed(e.to_string()))?;

        Ok(HandlerResult::ship(
            Status::PrOpen,
            pr_url,
            serde_json::Value::Object(data.0),
        ))
    }
}

#[cfg(test)]
#[path = "shipping_tests.rs"]
mod tests;
