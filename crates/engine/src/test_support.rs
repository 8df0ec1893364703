// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for handler tests: a minimal [`Config`] and a
//! [`WorkflowContext`] wired to a [`FakeSandboxExecutor`] and in-memory
//! [`Store`].

#![cfg(test)]

use crate::handler::WorkflowContext;
use panicforge_core::config::{AgentConfig, Budgets, GitConfig};
use panicforge_core::{naming, test_support::s1_work_item, Config, PanicLocation, PanicWorkItem};
use panicforge_sandbox::FakeSandboxExecutor;
use panicforge_storage::Store;
use panicforge_timer::TimerRegistry;
use std::sync::Arc;

pub fn base_config(dry_run: bool) -> Config {
    base_config_with_repo("/tmp/panicforge-test-repo", dry_run)
}

pub fn base_config_with_repo(base_repo_path: impl Into<std::path::PathBuf>, dry_run: bool) -> Config {
    Config {
        store_path: "/tmp/panicforge-test.sqlite3".into(),
        store_auth_token: None,
        base_repo_path: base_repo_path.into(),
        max_parallel_panics: 2,
        budgets: Budgets {
            reproducer_ms: 60_000,
            fixer_ms: 60_000,
            reproducer_split: None,
            fixer_split: None,
        },
        git: GitConfig {
            host_token: "ghp_x".to_string(),
            repo_slug: "org/repo".to_string(),
            pr_reviewer: "octocat".to_string(),
            pr_labels: vec!["bug".to_string()],
            default_branch: "main".to_string(),
        },
        agents: AgentConfig::default(),
        ipc_port: 7878,
        dry_run,
        min_log_level: None,
    }
}

/// A [`WorkflowContext`] for scenario S1's work item, backed by a fresh
/// [`FakeSandboxExecutor`] and an in-memory [`Store`].
pub fn s1_context(dry_run: bool) -> WorkflowContext<FakeSandboxExecutor> {
    s1_context_for(s1_work_item(), dry_run)
}

pub fn s1_context_for(item: PanicWorkItem, dry_run: bool) -> WorkflowContext<FakeSandboxExecutor> {
    s1_context_for_with_repo(item, "/tmp/panicforge-test-repo", dry_run)
}

pub fn s1_context_for_with_repo(
    item: PanicWorkItem,
    base_repo_path: impl Into<std::path::PathBuf>,
    dry_run: bool,
) -> WorkflowContext<FakeSandboxExecutor> {
    let loc = PanicLocation::new(item.panic_location.clone());
    let session = naming::session_handle(&loc);
    let branch = naming::branch_name(&loc);
    WorkflowContext {
        item,
        session,
        branch,
        config: Arc::new(base_config_with_repo(base_repo_path, dry_run)),
        sandbox: Arc::new(FakeSandboxExecutor::new()),
        store: Arc::new(Store::open_in_memory().expect("in-memory store")),
        timer: Arc::new(TimerRegistry::new()),
    }
}
