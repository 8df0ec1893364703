// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic derivation of [`crate::PanicLocation`]-scoped names.
//!
//! Both the sandbox session handle and the git branch name are derived by
//! substituting `/` and `:` with `-` (spec.md §3). The substitution is only
//! reversible-enough for a human triaging a failed item because the
//! `panic_location` alphabet is otherwise disjoint from `-` (spec.md §9).

use crate::id::PanicLocation;

fn sanitize(loc: &PanicLocation) -> String {
    loc.as_str().replace(['/', ':'], "-")
}

/// Sandbox session handle for a panic: `fix-panic-<sanitized location>`.
pub fn session_handle(loc: &PanicLocation) -> String {
    format!("fix-panic-{}", sanitize(loc))
}

/// Git branch name for a panic: `fix/panic-<sanitized location>`.
pub fn branch_name(loc: &PanicLocation) -> String {
    format!("fix/panic-{}", sanitize(loc))
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
