// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP face of the IPC Timer. Handlers only touch the shared
//! [`TimerRegistry`] — all the pause/resume arithmetic lives there.

use crate::registry::TimerRegistry;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimerServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(rename = "trackedPanics")]
    tracked_panics: usize,
}

async fn started(
    State(registry): State<Arc<TimerRegistry>>,
    Path(loc): Path<String>,
) -> StatusCode {
    registry.simulator_started(&loc);
    StatusCode::OK
}

async fn finished(
    State(registry): State<Arc<TimerRegistry>>,
    Path(loc): Path<String>,
) -> StatusCode {
    registry.simulator_finished(&loc);
    StatusCode::OK
}

async fn health(State(registry): State<Arc<TimerRegistry>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        tracked_panics: registry.tracked_count(),
    })
}

async fn debug_trackers(State(registry): State<Arc<TimerRegistry>>) -> impl axum::response::IntoResponse {
    Json(registry.snapshot_all())
}

fn router(registry: Arc<TimerRegistry>) -> Router {
    Router::new()
        .route("/sim/:loc/started", post(started))
        .route("/sim/:loc/finished", post(finished))
        .route("/health", get(health))
        .route("/debug/trackers", get(debug_trackers))
        .with_state(registry)
}

/// Binds and serves the IPC Timer HTTP API until the returned future is
/// dropped or the process is signalled — callers race this against their
/// own shutdown future.
pub async fn serve(port: u16, registry: Arc<TimerRegistry>) -> Result<(), TimerServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| TimerServerError::Bind { addr, source })?;
    tracing::info!(%addr, "ipc timer server listening");
    axum::serve(listener, router(registry))
        .await
        .map_err(TimerServerError::Serve)
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
