// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PanicWorkItem`, the durable unit of work (spec.md §3).

use crate::status::Status;
use crate::workflow_error::WorkflowError;
use serde::{Deserialize, Serialize};

/// A panic report moving through the orchestrator's state machine.
/// Keyed by `panic_location`, which is unique (spec.md §3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanicWorkItem {
    pub panic_location: String,
    pub status: Status,
    pub panic_message: String,
    pub sql_statements: String,
    pub branch_name: Option<String>,
    pub pr_url: Option<String>,
    pub retry_count: u32,
    pub workflow_error: Option<WorkflowError>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PanicWorkItem {
    /// Construct a freshly-created, `pending` item. `created_at`/`updated_at`
    /// are stamped by the store on insert, not by the caller.
    pub fn new(
        panic_location: impl Into<String>,
        panic_message: impl Into<String>,
        sql_statements: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            panic_location: panic_location.into(),
            status: Status::Pending,
            panic_message: panic_message.into(),
            sql_statements: sql_statements.into(),
            branch_name: None,
            pr_url: None,
            retry_count: 0,
            workflow_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[path = "work_item_tests.rs"]
mod tests;
