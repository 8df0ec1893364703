use super::*;

#[test]
fn truncates_stderr_to_200_chars_with_suffix() {
    let long = "x".repeat(500);
    let err = WorkflowError::truncated(Phase::Preflight, "Build failed", &long);
    assert!(err.error.starts_with("Build failed: "));
    let body = err.error.strip_prefix("Build failed: ").unwrap();
    assert!(body.ends_with("..."));
    assert_eq!(body.len(), 200 + 3);
}

#[test]
fn short_stderr_is_not_suffixed() {
    let err = WorkflowError::truncated(Phase::Preflight, "Tests failed", "boom");
    assert_eq!(err.error, "Tests failed: boom");
}
