use super::*;

#[test]
fn displays_as_inner_string() {
    let loc = PanicLocation::new("src/vdbe.c:1234");
    assert_eq!(loc.to_string(), "src/vdbe.c:1234");
    assert_eq!(loc.as_str(), "src/vdbe.c:1234");
}

#[test]
fn equal_by_value() {
    let a = PanicLocation::new("src/vdbe.c:1234");
    let b = PanicLocation::from("src/vdbe.c:1234");
    assert_eq!(a, b);
}

#[test]
fn borrows_as_str_for_map_lookup() {
    use std::collections::HashMap;
    let mut map: HashMap<PanicLocation, u32> = HashMap::new();
    map.insert(PanicLocation::new("src/vdbe.c:1234"), 42);
    assert_eq!(map.get("src/vdbe.c:1234"), Some(&42));
}
