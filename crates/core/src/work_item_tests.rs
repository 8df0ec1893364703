use super::*;

#[test]
fn new_item_starts_pending_with_no_retries() {
    let item = PanicWorkItem::new("src/vdbe.c:1234", "assertion failed", "SELECT 1;");
    assert_eq!(item.status, Status::Pending);
    assert_eq!(item.retry_count, 0);
    assert!(item.branch_name.is_none());
    assert!(item.pr_url.is_none());
    assert!(item.workflow_error.is_none());
    assert_eq!(item.created_at, item.updated_at);
}
