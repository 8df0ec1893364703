// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{ContextData, PanicWorkItem, Status};

/// A `pending` work item for scenario S1 (spec.md §8).
pub fn s1_work_item() -> PanicWorkItem {
    PanicWorkItem::new("src/vdbe.c:1234", "assertion failed", "SELECT 1;")
}

pub fn work_item_in_status(status: Status) -> PanicWorkItem {
    let mut item = s1_work_item();
    item.status = status;
    item
}

/// Build a [`ContextData`] from `(field, JSON value)` pairs.
pub fn context_data(pairs: &[(&str, serde_json::Value)]) -> ContextData {
    let mut map = serde_json::Map::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v.clone());
    }
    ContextData(map)
}

/// A complete, ship-ready context document for scenario S1.
pub fn s1_complete_context() -> ContextData {
    use serde_json::json;
    context_data(&[
        ("panic_location", json!("src/vdbe.c:1234")),
        ("panic_message", json!("assertion failed")),
        ("tcl_test_file", json!("test_vdbe_1234.tcl")),
        ("failing_seed", json!(42)),
        ("why_simulator_missed", json!("edge case")),
        ("simulator_changes", json!("added path")),
        ("bug_description", json!("np deref")),
        ("fix_description", json!("null check")),
    ])
}
