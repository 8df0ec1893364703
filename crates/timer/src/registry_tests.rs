use super::*;
use std::thread::sleep;

#[test]
fn unknown_location_reports_zero_elapsed_and_no_timeout() {
    let registry = TimerRegistry::new();
    assert_eq!(registry.elapsed_ms("nope:1"), 0);
    assert!(!registry.is_paused("nope:1"));
    assert!(!registry.has_timed_out("nope:1", 0));
}

#[test]
fn elapsed_grows_while_not_paused() {
    let registry = TimerRegistry::new();
    registry.start_tracking("a:1");
    sleep(Duration::from_millis(20));
    assert!(registry.elapsed_ms("a:1") >= 15);
}

#[test]
fn pause_excludes_simulator_time_from_elapsed() {
    let registry = TimerRegistry::new();
    registry.start_tracking("a:1");
    sleep(Duration::from_millis(10));
    registry.simulator_started("a:1");
    assert!(registry.is_paused("a:1"));
    sleep(Duration::from_millis(50));
    registry.simulator_finished("a:1");
    assert!(!registry.is_paused("a:1"));

    let elapsed = registry.elapsed_ms("a:1");
    assert!(elapsed < 40, "elapsed {elapsed}ms should exclude the 50ms pause");
}

#[test]
fn repeated_started_while_paused_is_idempotent() {
    let registry = TimerRegistry::new();
    registry.start_tracking("a:1");
    registry.simulator_started("a:1");
    let paused_at_first_call = registry.elapsed_ms("a:1");
    sleep(Duration::from_millis(10));
    registry.simulator_started("a:1");
    sleep(Duration::from_millis(10));
    registry.simulator_finished("a:1");

    let elapsed = registry.elapsed_ms("a:1");
    assert!(elapsed <= paused_at_first_call + 5, "a second 'started' must not reset the pause clock");
}

#[test]
fn repeated_finished_while_resumed_is_idempotent() {
    let registry = TimerRegistry::new();
    registry.start_tracking("a:1");
    registry.simulator_started("a:1");
    registry.simulator_finished("a:1");
    registry.simulator_finished("a:1");
    assert!(!registry.is_paused("a:1"));
}

#[test]
fn has_timed_out_compares_elapsed_to_budget() {
    let registry = TimerRegistry::new();
    registry.start_tracking("a:1");
    assert!(!registry.has_timed_out("a:1", 10_000));
    sleep(Duration::from_millis(15));
    assert!(registry.has_timed_out("a:1", 10));
}

#[test]
fn stop_tracking_removes_the_entry() {
    let registry = TimerRegistry::new();
    registry.start_tracking("a:1");
    registry.stop_tracking("a:1");
    assert_eq!(registry.elapsed_ms("a:1"), 0);
    assert_eq!(registry.tracked_count(), 0);
}

#[test]
fn snapshot_all_reflects_live_timers() {
    let registry = TimerRegistry::new();
    registry.start_tracking("a:1");
    registry.start_tracking("b:2");
    registry.simulator_started("b:2");

    let snapshot = registry.snapshot_all();
    assert_eq!(snapshot.len(), 2);
    assert!(!snapshot["a:1"].is_paused);
    assert!(snapshot["b:2"].is_paused);
}
