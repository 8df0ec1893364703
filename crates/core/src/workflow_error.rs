// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `{phase, error, timestamp}` structured error record (spec.md §3).

use crate::status::Phase;
use serde::{Deserialize, Serialize};

/// Recorded when a [`crate::PanicWorkItem`] moves to `needs_human_review`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowError {
    pub phase: Phase,
    pub error: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl WorkflowError {
    pub fn new(phase: Phase, error: impl Into<String>) -> Self {
        Self {
            phase,
            error: error.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Long stderr is truncated to ~200 characters in error fields (spec.md §7).
    pub fn truncated(phase: Phase, prefix: &str, stderr: &str) -> Self {
        const MAX: usize = 200;
        let truncated: String = stderr.chars().take(MAX).collect();
        let suffix = if stderr.chars().count() > MAX { "..." } else { "" };
        Self::new(phase, format!("{prefix}: {truncated}{suffix}"))
    }
}

#[cfg(test)]
#[path = "workflow_error_tests.rs"]
mod tests;
