use super::*;
use crate::test_support::base_config_with_repo;
use panicforge_core::test_support::work_item_in_status;
use panicforge_sandbox::{CommandOutput, FakeSandboxExecutor};
use panicforge_storage::Store;
use panicforge_timer::TimerRegistry;
use std::sync::Arc;

fn ctx_with_prompt(prompt_contents: &str) -> (tempfile::TempDir, WorkflowContext<FakeSandboxExecutor>) {
    let dir = tempfile::tempdir().unwrap();
    let prompt_path = dir.path().join("reproducer.md");
    std::fs::write(&prompt_path, prompt_contents).unwrap();

    let mut config = base_config_with_repo(dir.path(), false);
    config.agents.reproducer_prompt_path = prompt_path;

    let item = work_item_in_status(Status::RepoSetup);
    let ctx = WorkflowContext {
        session: "fix-panic-src-vdbe.c-1234".to_string(),
        branch: "fix/panic-src-vdbe.c-1234".to_string(),
        item,
        config: Arc::new(config),
        sandbox: Arc::new(FakeSandboxExecutor::new()),
        store: Arc::new(Store::open_in_memory().unwrap()),
        timer: Arc::new(TimerRegistry::new()),
    };
    (dir, ctx)
}

fn ok_output() -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: String::new(),
        exit_code: 0,
    }
}

#[tokio::test]
async fn success_path_advances_to_fixing() {
    let (_dir, ctx) = ctx_with_prompt("reproduce the panic");
    ctx.sandbox.script_run(&ctx.session, ok_output());
    ctx.sandbox.script_agent_success(&ctx.session, vec![], 0);

    let result = ReproducingHandler.handle(&ctx).await;

    assert!(matches!(result.next_status, Some(Status::Fixing)));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn nothing_to_commit_is_downgraded_to_success() {
    let (_dir, ctx) = ctx_with_prompt("reproduce the panic");
    ctx.sandbox.script_run(&ctx.session, ok_output());
    ctx.sandbox.script_run_for_command(
        &ctx.session,
        "git commit",
        CommandOutput {
            stdout: "nothing to commit, working tree clean".to_string(),
            stderr: String::new(),
            exit_code: 1,
        },
    );
    ctx.sandbox.script_agent_success(&ctx.session, vec![], 0);

    let result = ReproducingHandler.handle(&ctx).await;

    assert!(matches!(result.next_status, Some(Status::Fixing)));
}

#[tokio::test]
async fn agent_timeout_yields_needs_human_review() {
    let (_dir, mut ctx) = ctx_with_prompt("reproduce the panic");
    Arc::get_mut(&mut ctx.config).unwrap().budgets.reproducer_ms = 0;
    ctx.sandbox.script_run(&ctx.session, ok_output());
    ctx.sandbox.script_agent_hang(&ctx.session);

    let result = ReproducingHandler.handle(&ctx).await;

    assert!(result.next_status.is_none());
    let error = result.error.expect("expected workflow error");
    assert_eq!(error.phase, Phase::Reproducing);
    assert!(error.error.contains("timed out"));
}

#[tokio::test]
async fn missing_prompt_file_reports_path_in_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config_with_repo(dir.path(), false);
    config.agents.reproducer_prompt_path = dir.path().join("missing.md");
    let ctx = WorkflowContext {
        session: "sess-1".to_string(),
        branch: "fix/panic-a-1".to_string(),
        item: work_item_in_status(Status::RepoSetup),
        config: Arc::new(config),
        sandbox: Arc::new(FakeSandboxExecutor::new()),
        store: Arc::new(Store::open_in_memory().unwrap()),
        timer: Arc::new(TimerRegistry::new()),
    };
    ctx.sandbox.script_run(&ctx.session, ok_output());

    let result = ReproducingHandler.handle(&ctx).await;

    let error = result.error.expect("expected workflow error");
    assert!(error.error.contains("missing.md"));
}
