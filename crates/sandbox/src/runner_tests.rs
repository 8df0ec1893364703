use super::*;
use crate::fake::FakeSandboxExecutor;
use panicforge_timer::TimerRegistry;

fn runner(executor: FakeSandboxExecutor) -> AgentRunner<FakeSandboxExecutor> {
    AgentRunner::new(Arc::new(executor), Arc::new(TimerRegistry::new()))
}

#[tokio::test]
async fn successful_run_reports_exit_code_zero() {
    let executor = FakeSandboxExecutor::new();
    executor.script_agent_success("sess-1", vec!["{\"type\":\"text\",\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"hi\"}]}}".to_string()], 0);
    let r = runner(executor);

    let result = r
        .run_agent("sess-1", "src/foo.rs:10", "fix it", 60_000, "agent --prompt {prompt}", None)
        .await
        .unwrap();

    assert!(result.success);
    assert!(!result.timed_out);
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.contains("\"text\":\"hi\""));
}

#[tokio::test]
async fn failing_exit_code_is_not_success() {
    let executor = FakeSandboxExecutor::new();
    executor.script_agent_success("sess-1", vec![], 1);
    let r = runner(executor);

    let result = r
        .run_agent("sess-1", "src/foo.rs:10", "fix it", 60_000, "agent --prompt {prompt}", None)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.exit_code, 1);
}

#[tokio::test]
async fn failing_agent_reports_captured_stderr() {
    let executor = FakeSandboxExecutor::new();
    executor.script_agent_outcome("sess-1", vec![], 1, "panic in reproducer step".to_string());
    let r = runner(executor);

    let result = r
        .run_agent("sess-1", "src/foo.rs:10", "fix it", 60_000, "agent --prompt {prompt}", None)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.stderr, "panic in reproducer step");
}

#[tokio::test]
async fn elapsed_ms_excludes_simulator_pause_time() {
    use std::time::Duration;

    let timer = Arc::new(TimerRegistry::new());
    let executor = FakeSandboxExecutor::new();
    // The agent process runs for ~300ms of real wall-clock time; the test
    // pauses the timer (simulating the simulator running) for most of it.
    executor.script_agent_delayed_success("sess-1", Duration::from_millis(300), 0);
    let r = AgentRunner::new(Arc::new(executor), Arc::clone(&timer));

    let loc = "src/foo.rs:10";
    let pause_timer = Arc::clone(&timer);
    let pauser = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        pause_timer.simulator_started(loc);
        tokio::time::sleep(Duration::from_millis(200)).await;
        pause_timer.simulator_finished(loc);
    });

    let result = r
        .run_agent("sess-1", loc, "fix it", 60_000, "agent --prompt {prompt}", None)
        .await
        .unwrap();
    pauser.await.unwrap();

    assert!(result.success);
    // Net of the ~200ms pause, elapsed time should be well under the
    // ~300ms the process actually ran for. A generous bound keeps this
    // robust to scheduler jitter while still catching a regression back
    // to raw wall-clock `start.elapsed()`.
    assert!(
        result.elapsed_ms < 200,
        "elapsed_ms {} should exclude simulator pause time",
        result.elapsed_ms
    );
}

#[tokio::test]
async fn timeout_terminates_agent() {
    let executor = FakeSandboxExecutor::new();
    executor.script_agent_hang("sess-1");
    let r = runner(executor);

    // budget_ms of 0 means has_timed_out is true on the very first poll tick.
    let result = r
        .run_agent("sess-1", "src/foo.rs:10", "fix it", 0, "agent --prompt {prompt}", None)
        .await
        .unwrap();

    assert!(result.timed_out);
    assert!(!result.success);
}

#[tokio::test]
async fn on_event_callback_receives_parsed_events() {
    let executor = FakeSandboxExecutor::new();
    executor.script_agent_success(
        "sess-1",
        vec!["{\"type\":\"text\",\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"hello\"}]}}".to_string()],
        0,
    );
    let r = runner(executor);

    let mut seen = Vec::new();
    let mut cb = |event: StreamEvent| seen.push(event);
    r.run_agent("sess-1", "loc", "p", 60_000, "agent {prompt}", Some(&mut cb))
        .await
        .unwrap();

    assert_eq!(seen.len(), 1);
    assert!(matches!(&seen[0], StreamEvent::Text(t) if t == "hello"));
}

#[test]
fn capped_lines_drops_oldest_once_over_cap() {
    let mut buf = CappedLines::new(10);
    buf.push("aaaaa".to_string());
    buf.push("bbbbb".to_string());
    buf.push("ccccc".to_string());
    let joined = buf.join();
    assert!(!joined.contains("aaaaa"));
    assert!(joined.contains("ccccc"));
}
