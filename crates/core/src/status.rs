// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work-item status and the state diagram from spec.md §4.6.6.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a [`crate::PanicWorkItem`]. Transitions only along the edges
/// enumerated in spec.md §4.6.6; `PrOpen` and `NeedsHumanReview` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    RepoSetup,
    Reproducing,
    Fixing,
    Shipping,
    PrOpen,
    NeedsHumanReview,
}

impl Status {
    /// Terminal states are never left and never reprocessed (Testable Property 1).
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::PrOpen | Status::NeedsHumanReview)
    }

    /// The live (non-terminal) state a successful handler for this status
    /// advances to, per the state diagram. Returns `None` for terminal states
    /// and for `Pending` (whose successor depends on the preflight handler's
    /// outcome, not a fixed edge).
    pub fn next_on_success(self) -> Option<Status> {
        match self {
            Status::Pending => Some(Status::RepoSetup),
            Status::RepoSetup => Some(Status::Reproducing),
            Status::Reproducing => Some(Status::Fixing),
            Status::Fixing => Some(Status::Shipping),
            Status::Shipping => Some(Status::PrOpen),
            Status::PrOpen | Status::NeedsHumanReview => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pending => "pending",
            Status::RepoSetup => "repo_setup",
            Status::Reproducing => "reproducing",
            Status::Fixing => "fixing",
            Status::Shipping => "shipping",
            Status::PrOpen => "pr_open",
            Status::NeedsHumanReview => "needs_human_review",
        };
        write!(f, "{s}")
    }
}

/// Error returned when parsing an unrecognized status string from storage.
#[derive(Debug, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "repo_setup" => Ok(Status::RepoSetup),
            "reproducing" => Ok(Status::Reproducing),
            "fixing" => Ok(Status::Fixing),
            "shipping" => Ok(Status::Shipping),
            "pr_open" => Ok(Status::PrOpen),
            "needs_human_review" => Ok(Status::NeedsHumanReview),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// The phase a [`crate::WorkflowError`] or a context-document validation
/// pass is attributed to. Mirrors the handler chain (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Preflight,
    RepoSetup,
    Reproducing,
    Fixing,
    Shipping,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Preflight => "preflight",
            Phase::RepoSetup => "repo_setup",
            Phase::Reproducing => "reproducing",
            Phase::Fixing => "fixing",
            Phase::Shipping => "shipping",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
