// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The Workflow Orchestrator (spec.md §4.7): the `panicforged` binary's
//! event loop, exposed as a library so it can be driven from tests without
//! going through `main`.

pub mod orchestrator;

pub use orchestrator::Orchestrator;
