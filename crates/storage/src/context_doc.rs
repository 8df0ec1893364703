// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-item Context Document: a single JSON file in the sandbox
//! working directory that accumulates fields across phases.

use panicforge_core::{validate, ContextData, ValidationPhase, ValidationResult};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextDocError {
    #[error("context document not found at {0}")]
    NotFound(PathBuf),
    #[error("context document at {path} is not valid JSON: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to a context document at a fixed path (normally
/// `<sandbox-root>/panic_context.json`).
pub struct ContextDocument {
    path: PathBuf,
}

impl ContextDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `{data | not_found | parse_error}` — absence and corruption are
    /// distinguished so callers can decide whether `merge` is even possible.
    pub fn read(&self) -> Result<ContextData, ContextDocError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ContextDocError::NotFound(self.path.clone())
            } else {
                ContextDocError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&raw).map_err(|source| ContextDocError::ParseError {
                path: self.path.clone(),
                source,
            })?;
        Ok(ContextData(map))
    }

    /// Atomic replace: serialize to a sibling `.tmp` file, fsync it, then
    /// rename over the real path so a reader never observes a partial write.
    pub fn write(&self, data: &ContextData) -> Result<(), ContextDocError> {
        let tmp_path = self.path.with_extension("json.tmp");
        let serialized = serde_json::to_vec_pretty(&data.0).map_err(|source| {
            ContextDocError::ParseError {
                path: self.path.clone(),
                source,
            }
        })?;

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&serialized)?;
            file.sync_all()?;
            std::fs::rename(&tmp_path, &self.path)?;
            Ok(())
        };
        write().map_err(|source| ContextDocError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Reads current, overlays `partial`'s keys, writes the result back.
    /// Refuses to create the document on absence or corruption: the
    /// `repo_setup`-phase write is the only one allowed to originate it.
    pub fn merge(&self, partial: &ContextData) -> Result<ContextData, ContextDocError> {
        let current = self.read()?;
        let merged = current.merged_with(partial);
        self.write(&merged)?;
        Ok(merged)
    }

    /// Failure here is non-fatal by contract: callers log and continue
    /// rather than propagate it.
    pub fn delete(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Pure predicate over already-loaded data; does not touch the filesystem.
pub fn validate_for_phase(data: &ContextData, phase: ValidationPhase) -> ValidationResult {
    validate(data, phase)
}

#[cfg(test)]
#[path = "context_doc_tests.rs"]
mod tests;
