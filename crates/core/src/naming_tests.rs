use super::*;

#[test]
fn session_handle_matches_spec_derivation() {
    let loc = PanicLocation::new("src/vdbe.c:1234");
    assert_eq!(session_handle(&loc), "fix-panic-src-vdbe.c-1234");
}

#[test]
fn branch_name_matches_s1_scenario() {
    let loc = PanicLocation::new("src/vdbe.c:1234");
    assert_eq!(branch_name(&loc), "fix/panic-src-vdbe.c-1234");
}

#[test]
fn handles_multiple_slashes_and_colons() {
    let loc = PanicLocation::new("a/b/c.c:10:20");
    assert_eq!(session_handle(&loc), "fix-panic-a-b-c.c-10-20");
}
