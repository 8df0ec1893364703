// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorkflowContext`, `HandlerResult`, and the `Handler` trait: the
//! per-state contract the orchestrator drives (spec.md §4.6).
//!
//! Handlers are pure with respect to the store — they never call it
//! themselves. The orchestrator persists whatever transition a
//! `HandlerResult` describes.

use async_trait::async_trait;
use panicforge_core::{Config, PanicWorkItem, WorkflowError};
use panicforge_sandbox::SandboxExecutor;
use panicforge_storage::Store;
use panicforge_timer::TimerRegistry;
use panicforge_core::Status;
use std::path::PathBuf;
use std::sync::Arc;

/// Name of the context document inside a session's working tree
/// (spec.md §6).
const CONTEXT_DOC_FILENAME: &str = "panic_context.json";

/// Immutable per-item context a handler is invoked with (spec.md §4.6): a
/// snapshot of the work-item, its derived session/branch names,
/// configuration, and the shared subsystem handles it needs to act.
pub struct WorkflowContext<E: SandboxExecutor> {
    pub item: PanicWorkItem,
    pub session: String,
    pub branch: String,
    pub config: Arc<Config>,
    pub sandbox: Arc<E>,
    pub store: Arc<Store>,
    pub timer: Arc<TimerRegistry>,
}

impl<E: SandboxExecutor> Clone for WorkflowContext<E> {
    fn clone(&self) -> Self {
        Self {
            item: self.item.clone(),
            session: self.session.clone(),
            branch: self.branch.clone(),
            config: Arc::clone(&self.config),
            sandbox: Arc::clone(&self.sandbox),
            store: Arc::clone(&self.store),
            timer: Arc::clone(&self.timer),
        }
    }
}

impl<E: SandboxExecutor> WorkflowContext<E> {
    /// Local filesystem root of this item's sandbox session. The sandbox
    /// product materializes each copy-on-write session as a directory
    /// alongside the base repository, named after the session handle —
    /// direct filesystem access here is how the Context Document (a
    /// `panicforge-storage` concern, not a `SandboxExecutor` one) and the
    /// generated test file get written without a shell round trip.
    pub fn session_root(&self) -> PathBuf {
        self.config.base_repo_path.join(".sessions").join(&self.session)
    }

    pub fn context_doc_path(&self) -> PathBuf {
        self.session_root().join(CONTEXT_DOC_FILENAME)
    }
}

/// What a handler returns (spec.md §4.6): either the next live state, or an
/// `error`, which the orchestrator reads as "move to `needs_human_review`".
/// A handler never raises out of band.
#[derive(Debug, Default)]
pub struct HandlerResult {
    pub next_status: Option<Status>,
    pub branch_name: Option<String>,
    pub context_data: Option<serde_json::Value>,
    pub pr_url: Option<String>,
    pub error: Option<WorkflowError>,
}

impl HandlerResult {
    pub fn advance(next_status: Status) -> Self {
        Self {
            next_status: Some(next_status),
            ..Default::default()
        }
    }

    /// `repo_setup`'s success path: the orchestrator carries `branch_name`
    /// specifically when leaving `repo_setup` (spec.md §4.7).
    pub fn advance_with_branch(next_status: Status, branch_name: String) -> Self {
        Self {
            next_status: Some(next_status),
            branch_name: Some(branch_name),
            ..Default::default()
        }
    }

    pub fn ship(next_status: Status, pr_url: String, context_data: serde_json::Value) -> Self {
        Self {
            next_status: Some(next_status),
            context_data: Some(context_data),
            pr_url: Some(pr_url),
            ..Default::default()
        }
    }

    pub fn needs_human_review(error: WorkflowError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }
}

/// One state's behavior (spec.md §4.6). Implementors must never panic or
/// propagate an error out of band — every failure path folds into
/// [`HandlerResult::needs_human_review`].
#[async_trait]
pub trait Handler<E: SandboxExecutor>: Send + Sync {
    async fn handle(&self, ctx: &WorkflowContext<E>) -> HandlerResult;
}
