// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct TimerEntry {
    started_at: Instant,
    paused_at: Option<Instant>,
    total_paused: Duration,
}

impl TimerEntry {
    fn elapsed(&self, now: Instant) -> Duration {
        let paused_now = match self.paused_at {
            Some(at) => now.saturating_duration_since(at),
            None => Duration::ZERO,
        };
        now.saturating_duration_since(self.started_at)
            .saturating_sub(self.total_paused)
            .saturating_sub(paused_now)
    }
}

/// A snapshot of one tracked timer, as reported by `/debug/trackers`.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct TrackerSnapshot {
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    #[serde(rename = "totalPausedMs")]
    pub total_paused_ms: u64,
    #[serde(rename = "isPaused")]
    pub is_paused: bool,
}

/// The live map of per-`panic_location` timers, shared between the HTTP
/// server's handlers and the in-process Agent Runner. Both sides acquire
/// the same mutex — there is no separate synchronization path.
#[derive(Default)]
pub struct TimerRegistry {
    entries: Mutex<HashMap<String, TimerEntry>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Created only by the Agent Runner; overwrites any stale entry for the
    /// same location (the runner never tracks two runs for one location at
    /// once).
    pub fn start_tracking(&self, loc: &str) {
        self.entries.lock().insert(
            loc.to_string(),
            TimerEntry {
                started_at: Instant::now(),
                paused_at: None,
                total_paused: Duration::ZERO,
            },
        );
    }

    /// Destroyed only by the Agent Runner.
    pub fn stop_tracking(&self, loc: &str) {
        self.entries.lock().remove(loc);
    }

    pub fn elapsed_ms(&self, loc: &str) -> u64 {
        let guard = self.entries.lock();
        guard
            .get(loc)
            .map(|entry| entry.elapsed(Instant::now()).as_millis() as u64)
            .unwrap_or(0)
    }

    pub fn is_paused(&self, loc: &str) -> bool {
        self.entries
            .lock()
            .get(loc)
            .map(|entry| entry.paused_at.is_some())
            .unwrap_or(false)
    }

    pub fn has_timed_out(&self, loc: &str, budget_ms: u64) -> bool {
        self.elapsed_ms(loc) >= budget_ms
    }

    /// Idempotent: a second `started` delivered while already paused is a
    /// no-op, and an unknown `loc` is silently accepted so the simulator
    /// never has to coordinate with orchestrator liveness.
    pub fn simulator_started(&self, loc: &str) {
        let mut guard = self.entries.lock();
        if let Some(entry) = guard.get_mut(loc) {
            if entry.paused_at.is_none() {
                entry.paused_at = Some(Instant::now());
            }
        }
    }

    /// Idempotent: a second `finished` delivered while already resumed is a
    /// no-op.
    pub fn simulator_finished(&self, loc: &str) {
        let mut guard = self.entries.lock();
        if let Some(entry) = guard.get_mut(loc) {
            if let Some(paused_at) = entry.paused_at.take() {
                entry.total_paused += Instant::now().saturating_duration_since(paused_at);
            }
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn snapshot_all(&self) -> HashMap<String, TrackerSnapshot> {
        let guard = self.entries.lock();
        let now = Instant::now();
        guard
            .iter()
            .map(|(loc, entry)| {
                (
                    loc.clone(),
                    TrackerSnapshot {
                        elapsed_ms: entry.elapsed(now).as_millis() as u64,
                        total_paused_ms: entry.total_paused.as_millis() as u64,
                        is_paused: entry.paused_at.is_some(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
