// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Workflow Orchestrator (spec.md §4.7): polls the store for pending
//! items, admits up to `max_parallel_panics` concurrently, drives each
//! through its handler chain, persists transitions, and handles shutdown.

use panicforge_core::{LogLevel, LogRecord, PanicWorkItem, Phase, Status, WorkflowError};
use panicforge_engine::handlers::{FixingHandler, PreflightHandler, RepoSetupHandler, ReproducingHandler, ShippingHandler};
use panicforge_engine::{Handler, HandlerResult, WorkflowContext};
use panicforge_sandbox::SandboxExecutor;
use panicforge_storage::{StatusUpdate, Store};
use panicforge_timer::TimerRegistry;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;

/// Poll loop intervals (spec.md §4.7).
const SATURATED_SLEEP: Duration = Duration::from_secs(1);
const IDLE_SLEEP: Duration = Duration::from_secs(5);
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The phase a given live [`Status`] is attributed to when its handler
/// reports an unexpected panic (spec.md §7 "Unexpected exception").
fn phase_for_status(status: Status) -> Phase {
    match status {
        Status::Pending => Phase::Preflight,
        Status::RepoSetup => Phase::RepoSetup,
        Status::Reproducing => Phase::Reproducing,
        Status::Fixing => Phase::Fixing,
        Status::Shipping => Phase::Shipping,
        Status::PrOpen | Status::NeedsHumanReview => Phase::Shipping,
    }
}

fn select_handler<E: SandboxExecutor>(status: Status) -> Option<Arc<dyn Handler<E>>> {
    match status {
        Status::Pending => Some(Arc::new(PreflightHandler)),
        Status::RepoSetup => Some(Arc::new(RepoSetupHandler)),
        Status::Reproducing => Some(Arc::new(ReproducingHandler)),
        Status::Fixing => Some(Arc::new(FixingHandler)),
        Status::Shipping => Some(Arc::new(ShippingHandler)),
        Status::PrOpen | Status::NeedsHumanReview => None,
    }
}

/// Drives a single invocation of `handler.handle(ctx)` on its own task so a
/// handler panic is caught as a `JoinError` rather than taking down the
/// per-item driver (spec.md §4.7: "converts any unexpected exception into
/// `needs_human_review`").
async fn invoke_handler<E: SandboxExecutor>(
    handler: Arc<dyn Handler<E>>,
    ctx: WorkflowContext<E>,
    status: Status,
) -> HandlerResult {
    match tokio::spawn(async move { handler.handle(&ctx).await }).await {
        Ok(result) => result,
        Err(join_error) => HandlerResult::needs_human_review(WorkflowError::new(
            phase_for_status(status),
            format!("handler task panicked: {join_error}"),
        )),
    }
}

/// The full per-item drive loop (spec.md §4.7's "per-item task"), run as
/// its own `tokio::spawn`ed task by [`Orchestrator::run`].
async fn drive_item<E: SandboxExecutor>(
    store: Arc<Store>,
    sandbox: Arc<E>,
    timer: Arc<TimerRegistry>,
    config: Arc<panicforge_core::Config>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    item: PanicWorkItem,
) {
    use panicforge_core::naming;
    let loc = item.panic_location.clone();
    let panic_location = panicforge_core::PanicLocation::new(loc.clone());
    let session = naming::session_handle(&panic_location);
    let branch = naming::branch_name(&panic_location);

    let mut ctx = WorkflowContext {
        item,
        session: session.clone(),
        branch,
        config: Arc::clone(&config),
        sandbox: Arc::clone(&sandbox),
        store: Arc::clone(&store),
        timer: Arc::clone(&timer),
    };

    loop {
        let status = ctx.item.status;
        if status.is_terminal() {
            break;
        }

        let Some(handler) = select_handler::<E>(status) else {
            let error = WorkflowError::new(phase_for_status(status), format!("no handler registered for status {status}"));
            if let Err(e) = store.mark_needs_human_review(&loc, error) {
                tracing::error!(panic_location = %loc, error = %e, "failed to persist needs_human_review");
            }
            break;
        };

        let result = invoke_handler(handler, ctx.clone(), status).await;

        if let Some(error) = result.error {
            tracing::warn!(
                panic_location = %loc,
                phase = %error.phase,
                session = %session,
                "moving to needs_human_review; sandbox session retained for debugging"
            );
            if let Err(e) = store.mark_needs_human_review(&loc, error.clone()) {
                tracing::error!(panic_location = %loc, error = %e, "failed to persist needs_human_review");
            }
            let _ = store.insert_log(&LogRecord::for_panic(
                LogLevel::Error,
                loc.clone(),
                error.phase,
                error.error.clone(),
            ));
            break;
        }

        let Some(next) = result.next_status else {
            tracing::error!(panic_location = %loc, "handler returned neither a next status nor an error");
            break;
        };

        let mut update = StatusUpdate::default();
        if status == Status::RepoSetup {
            update.branch_name = result.branch_name.clone();
        }
        if status == Status::Shipping {
            update.pr_url = result.pr_url.clone();
        }

        if let Err(e) = store.update_status(&loc, next, update) {
            tracing::error!(panic_location = %loc, error = %e, "failed to persist status transition");
            break;
        }
        let _ = store.insert_log(&LogRecord::for_panic(
            LogLevel::Info,
            loc.clone(),
            phase_for_status(status),
            format!("{status} -> {next}"),
        ));

        ctx.item.status = next;
        if let Some(branch_name) = result.branch_name {
            ctx.item.branch_name = Some(branch_name);
        }
        if let Some(pr_url) = result.pr_url {
            ctx.item.pr_url = Some(pr_url);
        }

        if next == Status::PrOpen {
            if config.dry_run {
                tracing::info!(panic_location = %loc, session = %session, "dry-run: retaining sandbox session");
            } else if let Err(e) = sandbox.delete(&session).await {
                tracing::warn!(panic_location = %loc, session = %session, error = %e, "failed to release sandbox session");
            }
            break;
        }
    }

    in_flight.lock().remove(&loc);
}

/// Single loop, bounded-concurrency state machine over pending work-items
/// (spec.md §4.7).
pub struct Orchestrator<E: SandboxExecutor> {
    store: Arc<Store>,
    sandbox: Arc<E>,
    timer: Arc<TimerRegistry>,
    config: Arc<panicforge_core::Config>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    shutdown_requested: Arc<AtomicBool>,
    shutdown_requests: Arc<AtomicUsize>,
    shutdown_notify: Arc<tokio::sync::Notify>,
}

impl<E: SandboxExecutor> Orchestrator<E> {
    pub fn new(
        store: Arc<Store>,
        sandbox: Arc<E>,
        timer: Arc<TimerRegistry>,
        config: Arc<panicforge_core::Config>,
    ) -> Self {
        Self {
            store,
            sandbox,
            timer,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            shutdown_requests: Arc::new(AtomicUsize::new(0)),
            shutdown_notify: Arc::new(tokio::sync::Notify::new()),
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Idempotent; logs the in-flight count on first call. On the second
    /// invocation, force exits the process (spec.md §4.7).
    pub fn request_shutdown(&self) {
        let previous = self.shutdown_requests.fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            self.shutdown_requested.store(true, Ordering::SeqCst);
            tracing::info!(in_flight = self.in_flight_count(), "shutdown requested");
            self.shutdown_notify.notify_waiters();
        } else {
            tracing::warn!("shutdown requested again, forcing exit");
            std::process::exit(1);
        }
    }

    /// Polls until the in-flight set is empty.
    pub async fn wait_for_in_flight(&self) {
        while self.in_flight_count() > 0 {
            tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
        }
    }

    /// Sleeps for `duration` unless shutdown is requested first.
    async fn interruptible_sleep(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.shutdown_notify.notified() => {}
        }
    }

    /// The main loop (spec.md §4.7). Returns once shutdown is requested;
    /// callers should then await [`Self::wait_for_in_flight`] before
    /// exiting the process.
    pub async fn run(&self) {
        loop {
            if self.is_shutdown_requested() {
                tracing::info!("orchestrator no longer admitting new items");
                return;
            }

            let in_flight_count = self.in_flight_count();
            let max_parallel = self.config.max_parallel_panics as usize;
            if in_flight_count >= max_parallel {
                self.interruptible_sleep(SATURATED_SLEEP).await;
                continue;
            }

            let capacity = (max_parallel - in_flight_count) as u32;
            let pending = match self.store.get_pending(capacity) {
                Ok(items) => items,
                Err(e) => {
                    tracing::error!(error = %e, "failed to poll store for pending items");
                    self.interruptible_sleep(IDLE_SLEEP).await;
                    continue;
                }
            };

            if pending.is_empty() {
                self.interruptible_sleep(IDLE_SLEEP).await;
                continue;
            }

            for item in pending {
                let loc = item.panic_location.clone();
                let mut guard = self.in_flight.lock();
                if guard.contains(&loc) {
                    continue;
                }
                guard.insert(loc.clone());
                drop(guard);

                tracing::info!(panic_location = %loc, "admitting item");
                tokio::spawn(drive_item(
                    Arc::clone(&self.store),
                    Arc::clone(&self.sandbox),
                    Arc::clone(&self.timer),
                    Arc::clone(&self.config),
                    Arc::clone(&self.in_flight),
                    item,
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
