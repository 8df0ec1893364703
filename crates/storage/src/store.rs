// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Durable Store: work-items and append-only log records backed by a
//! single-file (or in-memory, for tests) relational engine. Schema is
//! initialized on open if absent.

use crate::migration::{run_migrations, MigrationError};
use chrono::{DateTime, Utc};
use panicforge_core::{LogLevel, LogRecord, PanicWorkItem, Phase, Status, WorkflowError};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no work item at {0}")]
    NotFound(String),
}

/// Optional fields carried by [`Store::update_status`].
#[derive(Debug, Default, Clone)]
pub struct StatusUpdate {
    pub branch_name: Option<String>,
    pub pr_url: Option<String>,
    pub workflow_error: Option<WorkflowError>,
}

/// Selects which log rows [`Store::get_logs`] returns.
#[derive(Debug, Clone, Copy)]
pub struct LogQuery {
    pub limit: u32,
}

/// The Durable Store. A single `Connection` guarded by a mutex — SQLite
/// serializes writers internally, so this only needs to keep Rust's borrow
/// checker and `Send`/`Sync` happy across the `parking_lot` boundary.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a freshly-created `pending` item. No-ops are not supported: a
    /// duplicate `panic_location` is surfaced as a `rusqlite::Error`
    /// (`UNIQUE` violation) since `panic_location` is invariantly unique.
    pub fn create(
        &self,
        panic_location: &str,
        panic_message: &str,
        sql_statements: &str,
    ) -> Result<(), StoreError> {
        let item = PanicWorkItem::new(panic_location, panic_message, sql_statements);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO work_items (
                panic_location, panic_message, sql_statements, status,
                session_handle, branch_name, pr_url, retry_count, last_error,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, NULL, NULL, NULL, 0, NULL, ?5, ?5)",
            rusqlite::params![
                item.panic_location,
                item.panic_message,
                item.sql_statements,
                item.status.to_string(),
                item.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, panic_location: &str) -> Result<Option<PanicWorkItem>, StoreError> {
        let conn = self.conn.lock();
        let item = conn
            .query_row(
                "SELECT panic_location, panic_message, sql_statements, status,
                        branch_name, pr_url, retry_count, last_error, created_at, updated_at
                 FROM work_items WHERE panic_location = ?1",
                [panic_location],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    /// Up to `limit` `pending` items, oldest-first by `created_at`.
    pub fn get_pending(&self, limit: u32) -> Result<Vec<PanicWorkItem>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT panic_location, panic_message, sql_statements, status,
                    branch_name, pr_url, retry_count, last_error, created_at, updated_at
             FROM work_items WHERE status = ?1 ORDER BY created_at ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![Status::Pending.to_string(), limit],
            row_to_item,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Single-row update. Refreshes `updated_at`; atomic with respect to
    /// readers because SQLite serializes writers.
    pub fn update_status(
        &self,
        panic_location: &str,
        status: Status,
        update: StatusUpdate,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let now = Utc::now().to_rfc3339();
        let workflow_error_json = update
            .workflow_error
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let rows = conn.execute(
            "UPDATE work_items SET
                status = ?1,
                branch_name = COALESCE(?2, branch_name),
                pr_url = COALESCE(?3, pr_url),
                last_error = COALESCE(?4, last_error),
                updated_at = ?5
             WHERE panic_location = ?6",
            rusqlite::params![
                status.to_string(),
                update.branch_name,
                update.pr_url,
                workflow_error_json,
                now,
                panic_location,
            ],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(panic_location.to_string()));
        }
        Ok(())
    }

    /// Shorthand for `update_status(.., NeedsHumanReview, {workflow_error})`.
    pub fn mark_needs_human_review(
        &self,
        panic_location: &str,
        workflow_error: WorkflowError,
    ) -> Result<(), StoreError> {
        self.update_status(
            panic_location,
            Status::NeedsHumanReview,
            StatusUpdate {
                workflow_error: Some(workflow_error),
                ..Default::default()
            },
        )
    }

    pub fn increment_retry(&self, panic_location: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE work_items SET retry_count = retry_count + 1, updated_at = ?1
             WHERE panic_location = ?2",
            rusqlite::params![Utc::now().to_rfc3339(), panic_location],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(panic_location.to_string()));
        }
        Ok(())
    }

    pub fn reset_retry(&self, panic_location: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE work_items SET retry_count = 0, updated_at = ?1 WHERE panic_location = ?2",
            rusqlite::params![Utc::now().to_rfc3339(), panic_location],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(panic_location.to_string()));
        }
        Ok(())
    }

    pub fn insert_log(&self, record: &LogRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO logs (panic_location, level, phase, message, metadata, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                record.panic_location,
                record.level.to_string(),
                record.phase.map(|p| p.to_string()),
                record.message,
                serde_json::to_string(&record.metadata)?,
                record.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Newest-first, up to `query.limit`, across all panic locations.
    pub fn get_logs(&self, query: LogQuery) -> Result<Vec<LogRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT panic_location, level, phase, message, metadata, recorded_at
             FROM logs ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([query.limit], row_to_log)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    pub fn get_logs_by_location(
        &self,
        panic_location: &str,
        query: LogQuery,
    ) -> Result<Vec<LogRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT panic_location, level, phase, message, metadata, recorded_at
             FROM logs WHERE panic_location = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(rusqlite::params![panic_location, query.limit], row_to_log)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<PanicWorkItem> {
    let status_str: String = row.get(3)?;
    let status = Status::from_str(&status_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let last_error: Option<String> = row.get(7)?;
    let workflow_error = last_error
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e: serde_json::Error| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(PanicWorkItem {
        panic_location: row.get(0)?,
        panic_message: row.get(1)?,
        sql_statements: row.get(2)?,
        status,
        branch_name: row.get(4)?,
        pr_url: row.get(5)?,
        retry_count: row.get(6)?,
        workflow_error,
        created_at: parse_timestamp(&created_at, 8)?,
        updated_at: parse_timestamp(&updated_at, 9)?,
    })
}

fn row_to_log(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogRecord> {
    let level_str: String = row.get(1)?;
    let level = LogLevel::from_str(&level_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let phase_str: Option<String> = row.get(2)?;
    let phase = phase_str
        .map(|s| parse_phase(&s))
        .transpose()
        .map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            ))
        })?;
    let metadata_str: String = row.get(4)?;
    let metadata = serde_json::from_str(&metadata_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let recorded_at: String = row.get(5)?;
    Ok(LogRecord {
        timestamp: parse_timestamp(&recorded_at, 5)?,
        level,
        panic_location: row.get(0)?,
        phase,
        message: row.get(3)?,
        metadata,
    })
}

fn parse_timestamp(raw: &str, col: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_phase(s: &str) -> Result<Phase, String> {
    match s {
        "preflight" => Ok(Phase::Preflight),
        "repo_setup" => Ok(Phase::RepoSetup),
        "reproducing" => Ok(Phase::Reproducing),
        "fixing" => Ok(Phase::Fixing),
        "shipping" => Ok(Phase::Shipping),
        other => Err(format!("unknown phase: {other}")),
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
