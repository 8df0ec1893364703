// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Git/PR Boundary (spec.md §4.6.5, §6): squash, push, and open a
//! draft PR from a sandbox session. Free functions over `SandboxExecutor`
//! so handler tests can fake them trivially, mirroring the teacher's
//! one-module-per-external-boundary convention.

use panicforge_core::Config;
use panicforge_sandbox::{shell_single_quote_escape, RunOptions, SandboxExecutor};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("{step} failed (exit {exit_code}): {stderr}")]
    StepFailed {
        step: &'static str,
        exit_code: i32,
        stderr: String,
    },
    #[error("sandbox error: {0}")]
    Sandbox(#[from] panicforge_sandbox::SandboxError),
    #[error("no PR URL found in output: {0}")]
    NoUrlInOutput(String),
    #[error("failed to write dry-run artifact {path}: {source}")]
    DryRunWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

async fn run_step<E: SandboxExecutor>(
    sandbox: &E,
    session: &str,
    step: &'static str,
    command: &str,
) -> Result<String, GitError> {
    let output = sandbox.run(session, command, RunOptions::default()).await?;
    if output.exit_code != 0 {
        return Err(GitError::StepFailed {
            step,
            exit_code: output.exit_code,
            stderr: output.stderr,
        });
    }
    Ok(output.stdout)
}

/// Squashes all commits on the current branch since its merge-base with
/// `default_branch` into a single commit with `message` (spec.md §4.6.5).
pub async fn squash_to_one_commit<E: SandboxExecutor>(
    sandbox: &E,
    session: &str,
    default_branch: &str,
    message: &str,
) -> Result<(), GitError> {
    let merge_base = run_step(
        sandbox,
        session,
        "git merge-base",
        &format!("git merge-base {default_branch} HEAD"),
    )
    .await?;
    let merge_base = merge_base.trim();

    run_step(
        sandbox,
        session,
        "git reset --soft",
        &format!("git reset --soft {merge_base}"),
    )
    .await?;

    // `reset --soft` leaves the index as it was on HEAD, which still holds
    // anything (e.g. the context document) deleted from the working tree
    // since then. Re-stage the working tree so the squashed commit reflects
    // it, not the pre-deletion index.
    run_step(sandbox, session, "git add -A", "git add -A").await?;

    let escaped_message = shell_single_quote_escape(message);
    run_step(
        sandbox,
        session,
        "git commit",
        &format!("git commit -m {escaped_message}"),
    )
    .await?;
    Ok(())
}

/// `git push -u origin <branch>` (spec.md §4.6.5).
pub async fn push_branch<E: SandboxExecutor>(sandbox: &E, session: &str, branch: &str) -> Result<(), GitError> {
    run_step(
        sandbox,
        session,
        "git push",
        &format!("git push -u origin {branch}"),
    )
    .await?;
    Ok(())
}

/// Substitutes `{{field}}` placeholders in `template` with `values`;
/// fields absent from `values` are replaced with the empty string
/// (spec.md §6).
pub fn render_pr_body(template: &str, values: &[(&str, Option<&str>)]) -> String {
    let mut body = template.to_string();
    for (field, value) in values {
        let placeholder = format!("{{{{{field}}}}}");
        body = body.replace(&placeholder, value.unwrap_or(""));
    }
    body
}

/// Scans `stdout` line by line for the first PR URL (Testable Property
/// S6). Returns `None` if no line looks like one.
pub fn extract_pr_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("http://") || line.starts_with("https://"))
        .map(|line| line.to_string())
}

/// Creates a draft PR via the `gh` CLI boundary, or in dry-run mode, writes
/// the body and command to temp files and returns a sentinel URL
/// (spec.md §4.6.5, Glossary "Dry run").
pub async fn create_draft_pr<E: SandboxExecutor>(
    sandbox: &E,
    session: &str,
    config: &Config,
    title: &str,
    body: &str,
) -> Result<String, GitError> {
    let mut command = format!(
        "gh pr create --title {} --body {} --draft --reviewer {}",
        shell_single_quote_escape(title),
        shell_single_quote_escape(body),
        shell_single_quote_escape(&config.git.pr_reviewer),
    );
    for label in &config.git.pr_labels {
        command.push_str(" --label ");
        command.push_str(&shell_single_quote_escape(label));
    }

    if config.dry_run {
        let dir = std::env::temp_dir();
        let body_path = dir.join(format!("panicforge-pr-body-{session}.txt"));
        let command_path = dir.join(format!("panicforge-pr-command-{session}.txt"));
        std::fs::write(&body_path, body).map_err(|source| GitError::DryRunWrite {
            path: body_path.clone(),
            source,
        })?;
        std::fs::write(&command_path, &command).map_err(|source| GitError::DryRunWrite {
            path: command_path.clone(),
            source,
        })?;
        return Ok(format!("dry-run://{}", command_path.display()));
    }

    let stdout = run_step(sandbox, session, "gh pr create", &command).await?;
    extract_pr_url(&stdout).ok_or(GitError::NoUrlInOutput(stdout))
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
