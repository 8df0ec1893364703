use super::*;
use panicforge_core::WorkflowError;

fn store() -> Store {
    Store::open_in_memory().unwrap()
}

#[test]
fn create_inserts_pending_item() {
    let store = store();
    store.create("src/vdbe.c:1234", "assertion failed", "SELECT 1;").unwrap();
    let item = store.get("src/vdbe.c:1234").unwrap().unwrap();
    assert_eq!(item.status, Status::Pending);
    assert_eq!(item.panic_message, "assertion failed");
    assert_eq!(item.retry_count, 0);
}

#[test]
fn get_unknown_location_returns_none() {
    let store = store();
    assert!(store.get("src/nope.c:1").unwrap().is_none());
}

#[test]
fn get_pending_is_oldest_first_and_respects_limit() {
    let store = store();
    store.create("a:1", "msg", "sql").unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    store.create("b:2", "msg", "sql").unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    store.create("c:3", "msg", "sql").unwrap();

    let page = store.get_pending(2).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].panic_location, "a:1");
    assert_eq!(page[1].panic_location, "b:2");
}

#[test]
fn update_status_carries_branch_name_and_refreshes_updated_at() {
    let store = store();
    store.create("a:1", "msg", "sql").unwrap();
    let before = store.get("a:1").unwrap().unwrap().updated_at;

    std::thread::sleep(std::time::Duration::from_millis(5));
    store
        .update_status(
            "a:1",
            Status::RepoSetup,
            StatusUpdate {
                branch_name: Some("fix/panic-a-1".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let item = store.get("a:1").unwrap().unwrap();
    assert_eq!(item.status, Status::RepoSetup);
    assert_eq!(item.branch_name.as_deref(), Some("fix/panic-a-1"));
    assert!(item.updated_at > before);
}

#[test]
fn update_status_on_unknown_location_errors() {
    let store = store();
    let err = store
        .update_status("missing:1", Status::RepoSetup, StatusUpdate::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn terminal_items_can_still_be_updated() {
    let store = store();
    store.create("a:1", "msg", "sql").unwrap();
    store
        .update_status("a:1", Status::PrOpen, StatusUpdate {
            pr_url: Some("https://example.invalid/pr/1".to_string()),
            ..Default::default()
        })
        .unwrap();
    store
        .update_status("a:1", Status::PrOpen, StatusUpdate {
            pr_url: Some("https://example.invalid/pr/1-updated".to_string()),
            ..Default::default()
        })
        .unwrap();
    let item = store.get("a:1").unwrap().unwrap();
    assert_eq!(item.pr_url.as_deref(), Some("https://example.invalid/pr/1-updated"));
}

#[test]
fn mark_needs_human_review_persists_workflow_error() {
    let store = store();
    store.create("a:1", "msg", "sql").unwrap();
    let wf_err = WorkflowError::new(Phase::Preflight, "Build failed: exit 1");
    store.mark_needs_human_review("a:1", wf_err.clone()).unwrap();

    let item = store.get("a:1").unwrap().unwrap();
    assert_eq!(item.status, Status::NeedsHumanReview);
    assert_eq!(item.workflow_error.unwrap().error, wf_err.error);
}

#[test]
fn increment_and_reset_retry() {
    let store = store();
    store.create("a:1", "msg", "sql").unwrap();
    store.increment_retry("a:1").unwrap();
    store.increment_retry("a:1").unwrap();
    assert_eq!(store.get("a:1").unwrap().unwrap().retry_count, 2);
    store.reset_retry("a:1").unwrap();
    assert_eq!(store.get("a:1").unwrap().unwrap().retry_count, 0);
}

#[test]
fn logs_round_trip_and_order_newest_first() {
    let store = store();
    store
        .insert_log(&LogRecord::for_panic(
            LogLevel::Info,
            "a:1",
            Phase::Preflight,
            "running make",
        ))
        .unwrap();
    store
        .insert_log(&LogRecord::system(LogLevel::Warn, "slow poll"))
        .unwrap();

    let all = store.get_logs(LogQuery { limit: 10 }).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].message, "slow poll");
    assert_eq!(all[1].panic_location.as_deref(), Some("a:1"));

    let scoped = store
        .get_logs_by_location("a:1", LogQuery { limit: 10 })
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].message, "running make");
}
