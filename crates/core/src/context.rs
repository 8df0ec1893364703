// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The context document's field schema and the pure `validate` predicate
//! (spec.md §3, §4.3).
//!
//! The I/O primitives (`read`/`write`/`merge`) live in `panicforge-storage`,
//! since they touch the sandbox filesystem; this module only owns the
//! shape of the data and the validator, which has no I/O.

use serde::{Deserialize, Serialize};

/// The machine-readable JSON document accumulated across agent phases
/// (spec.md §3). A thin wrapper over a JSON object so unknown fields are
/// trivially preserved across `merge` (spec.md §4.3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextData(pub serde_json::Map<String, serde_json::Value>);

impl ContextData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    /// `{...current, ...partial}` — partial's keys win, all other keys from
    /// `self` are preserved (spec.md §4.3).
    pub fn merged_with(&self, partial: &ContextData) -> ContextData {
        let mut merged = self.0.clone();
        for (k, v) in &partial.0 {
            merged.insert(k.clone(), v.clone());
        }
        ContextData(merged)
    }
}

/// The phase a context-document validation pass is checked against
/// (spec.md §4.3). Distinct from [`crate::status::Phase`], which names the
/// handler/workflow-error phases — the spec gives these four their own,
/// narrower vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPhase {
    RepoSetup,
    Reproducer,
    Fixer,
    Ship,
}

/// One field the given [`Phase`] requires, with its expected JSON shape.
#[derive(Debug, Clone, Copy)]
pub struct RequiredField {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    /// Non-negative 32-bit (i.e. fits in a signed 32-bit int) integer,
    /// per spec.md §8's boundary behaviors for `failing_seed`.
    NonNegativeI32,
}

/// Fields required by each phase, in the order `spec.md` §3 introduces them.
/// Cumulative: `Reproducer` includes `RepoSetup`'s fields, `Fixer` includes
/// `Reproducer`'s, `Ship` requires the full union (spec.md §3: "ship
/// requires all of the above").
pub fn required_fields(phase: ValidationPhase) -> Vec<RequiredField> {
    const REPO_SETUP: &[RequiredField] = &[
        RequiredField { name: "panic_location", kind: FieldKind::String },
        RequiredField { name: "panic_message", kind: FieldKind::String },
        RequiredField { name: "tcl_test_file", kind: FieldKind::String },
    ];
    const REPRODUCER_ONLY: &[RequiredField] = &[
        RequiredField { name: "failing_seed", kind: FieldKind::NonNegativeI32 },
        RequiredField { name: "why_simulator_missed", kind: FieldKind::String },
        RequiredField { name: "simulator_changes", kind: FieldKind::String },
    ];
    const FIXER_ONLY: &[RequiredField] = &[
        RequiredField { name: "bug_description", kind: FieldKind::String },
        RequiredField { name: "fix_description", kind: FieldKind::String },
    ];

    match phase {
        ValidationPhase::RepoSetup => REPO_SETUP.to_vec(),
        ValidationPhase::Reproducer => [REPO_SETUP, REPRODUCER_ONLY].concat(),
        ValidationPhase::Fixer | ValidationPhase::Ship => [REPO_SETUP, REPRODUCER_ONLY, FIXER_ONLY].concat(),
    }
}

/// Result of [`validate`]: `{valid, errors}` (spec.md §4.3, Testable Property 5).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn ok() -> Self {
        Self { valid: true, errors: Vec::new() }
    }
}

fn describe_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn check_field(field: &RequiredField, value: &serde_json::Value) -> Option<String> {
    match field.kind {
        FieldKind::String => {
            if value.is_string() {
                None
            } else {
                Some(format!(
                    "Invalid type for {}: expected string, got {}",
                    field.name,
                    describe_type(value)
                ))
            }
        }
        FieldKind::NonNegativeI32 => match value.as_u64() {
            Some(n) if n <= i32::MAX as u64 => None,
            Some(n) => Some(format!(
                "Invalid type for {}: expected non-negative 32-bit integer, got {}",
                field.name, n
            )),
            None => Some(format!(
                "Invalid type for {}: expected non-negative 32-bit integer, got {}",
                field.name,
                describe_type(value)
            )),
        },
    }
}

/// Pure predicate: checks presence and type of the fields `phase` requires.
/// Never touches the filesystem (spec.md §4.3).
pub fn validate(data: &ContextData, phase: ValidationPhase) -> ValidationResult {
    let mut errors = Vec::new();
    for field in required_fields(phase) {
        match data.get(field.name) {
            None => errors.push(format!("Missing required field: {}", field.name)),
            Some(value) => {
                if let Some(err) = check_field(&field, value) {
                    errors.push(err);
                }
            }
        }
    }

    if errors.is_empty() {
        ValidationResult::ok()
    } else {
        ValidationResult { valid: false, errors }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
