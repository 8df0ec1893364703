// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema migrations for the Durable Store.
//!
//! Each migration is a single idempotent DDL step, applied in order and
//! tracked via SQLite's `user_version` pragma so that an existing store
//! is brought forward to the current schema without re-running steps it
//! already has.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("sqlite error applying migration {step}: {source}")]
    Step {
        step: u32,
        #[source]
        source: rusqlite::Error,
    },
}

struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: r#"
            CREATE TABLE work_items (
                panic_location   TEXT PRIMARY KEY,
                panic_message    TEXT NOT NULL,
                sql_statements   TEXT NOT NULL,
                status           TEXT NOT NULL,
                session_handle   TEXT,
                branch_name      TEXT,
                pr_url           TEXT,
                retry_count      INTEGER NOT NULL DEFAULT 0,
                last_error       TEXT,
                created_at       TEXT NOT NULL,
                updated_at       TEXT NOT NULL
            );
            CREATE INDEX idx_work_items_status ON work_items(status);

            CREATE TABLE logs (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                panic_location TEXT NOT NULL,
                level          TEXT NOT NULL,
                phase          TEXT,
                message        TEXT NOT NULL,
                metadata       TEXT,
                recorded_at    TEXT NOT NULL
            );
            CREATE INDEX idx_logs_panic_location ON logs(panic_location, id);
        "#,
    },
];

/// Apply every migration the store hasn't seen yet.
pub fn run_migrations(conn: &Connection) -> Result<(), MigrationError> {
    let current: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|source| MigrationError::Step { step: 0, source })?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        conn.execute_batch(migration.sql)
            .map_err(|source| MigrationError::Step {
                step: migration.version,
                source,
            })?;
        conn.pragma_update(None, "user_version", migration.version)
            .map_err(|source| MigrationError::Step {
                step: migration.version,
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
