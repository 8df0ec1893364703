// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal handler error kinds (spec.md §7). Never escapes a handler:
//! every handler catches its own `HandlerError`s and folds them into the
//! `WorkflowError` carried by its `HandlerResult` before returning.

use panicforge_core::{Phase, WorkflowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Build failed")]
    BuildFailed { stderr: String },
    #[error("Tests failed")]
    TestsFailed { stderr: String },
    #[error("sandbox step failed: {step}")]
    SandboxStepFailed { step: String, stderr: String },
    #[error("agent timed out")]
    AgentTimeout,
    #[error("agent exited non-zero: {exit_code}")]
    AgentNonZeroExit { exit_code: i32, stderr: String },
    #[error("context document missing: {0}")]
    ContextMissing(String),
    #[error("context document malformed: {0}")]
    ContextMalformed(String),
    #[error("context document incomplete: {0}")]
    ContextIncomplete(Vec<String>),
    #[error("PR creation failed: {0}")]
    PrCreationFailed(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl HandlerError {
    /// Folds this error into the structured `{phase, error, timestamp}`
    /// record persisted by the orchestrator (spec.md §7). Long stderr is
    /// truncated to ~200 characters.
    pub fn into_workflow_error(self, phase: Phase) -> WorkflowError {
        match self {
            HandlerError::BuildFailed { stderr } => {
                WorkflowError::truncated(phase, "Build failed", &stderr)
            }
            HandlerError::TestsFailed { stderr } => {
                WorkflowError::truncated(phase, "Tests failed", &stderr)
            }
            HandlerError::SandboxStepFailed { step, stderr } => {
                WorkflowError::truncated(phase, &format!("{step} failed"), &stderr)
            }
            HandlerError::AgentTimeout => WorkflowError::new(phase, "Agent timed out"),
            HandlerError::AgentNonZeroExit { exit_code, stderr } => WorkflowError::truncated(
                phase,
                &format!("Agent exited with code {exit_code}"),
                &stderr,
            ),
            HandlerError::ContextMissing(path) => {
                WorkflowError::new(phase, format!("Context document missing at {path}"))
            }
            HandlerError::ContextMalformed(detail) => {
                WorkflowError::new(phase, format!("Context document malformed: {detail}"))
            }
            HandlerError::ContextIncomplete(errors) => {
                WorkflowError::new(phase, errors.join("; "))
            }
            HandlerError::PrCreationFailed(detail) => {
                WorkflowError::new(phase, format!("PR creation failed: {detail}"))
            }
            HandlerError::Unexpected(detail) => WorkflowError::new(phase, detail),
        }
    }
}
