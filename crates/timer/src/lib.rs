// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The IPC Timer: tracks, per `panic_location`, a wall-clock budget that
//! excludes time spent waiting on the simulator. A small HTTP server lets
//! the simulator (an out-of-process tool) pause and resume the clock;
//! the Agent Runner reads it directly via the in-process registry.

mod encoding;
mod registry;
mod server;

pub use encoding::encode_location;
pub use registry::{TrackerSnapshot, TimerRegistry};
pub use server::{serve, TimerServerError};
