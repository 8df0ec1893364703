// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator configuration, loaded from a single TOML file at startup
//! (spec.md §6). Every option here has an observable effect somewhere in
//! the system; this module only defines the schema and the loader — it
//! does not overlay environment variables or support hot reload, since the
//! spec names neither.

use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_max_parallel_panics() -> u32 {
    2
}

fn default_dry_run() -> bool {
    false
}

/// Upper bound on any agent wall-clock budget (spec.md §8: "Simulator
/// budget rejects values ≤0 and >3600 seconds").
const MAX_BUDGET_MS: u64 = 3_600_000;

/// Optional split of an agent budget into planner/implementer sub-budgets
/// (spec.md §6: "plus optional planner/implementer splits").
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetSplit {
    pub planner_ms: u64,
    pub implementer_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Budgets {
    pub reproducer_ms: u64,
    pub fixer_ms: u64,
    #[serde(default)]
    pub reproducer_split: Option<BudgetSplit>,
    #[serde(default)]
    pub fixer_split: Option<BudgetSplit>,
}

/// Agent invocation knobs (spec.md §4.5, §6): the CLI binary name and the
/// prompt files read for the reproducer and fixer phases.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub binary: String,
    pub reproducer_prompt_path: PathBuf,
    pub fixer_prompt_path: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary: "agent-cli".to_string(),
            reproducer_prompt_path: PathBuf::from("prompts/reproducer.md"),
            fixer_prompt_path: PathBuf::from("prompts/fixer.md"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitConfig {
    pub host_token: String,
    pub repo_slug: String,
    pub pr_reviewer: String,
    #[serde(default)]
    pub pr_labels: Vec<String>,
    /// Default branch to squash-merge-base against (spec.md §4.6.5).
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store_path: PathBuf,
    #[serde(default)]
    pub store_auth_token: Option<String>,
    pub base_repo_path: PathBuf,
    #[serde(default = "default_max_parallel_panics")]
    pub max_parallel_panics: u32,
    pub budgets: Budgets,
    pub git: GitConfig,
    #[serde(default)]
    pub agents: AgentConfig,
    pub ipc_port: u16,
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    #[serde(default)]
    pub min_log_level: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid ipc_port: must be 1-65535")]
    InvalidIpcPort,
    #[error("invalid budget {field}: {ms}ms must be >0 and <= {MAX_BUDGET_MS}ms (3600s)")]
    InvalidBudget { field: &'static str, ms: u64 },
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ipc_port == 0 {
            return Err(ConfigError::InvalidIpcPort);
        }
        self.budgets.validate()?;
        Ok(())
    }
}

fn validate_budget_ms(field: &'static str, ms: u64) -> Result<(), ConfigError> {
    if ms == 0 || ms > MAX_BUDGET_MS {
        return Err(ConfigError::InvalidBudget { field, ms });
    }
    Ok(())
}

impl Budgets {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_budget_ms("budgets.reproducer_ms", self.reproducer_ms)?;
        validate_budget_ms("budgets.fixer_ms", self.fixer_ms)?;
        if let Some(split) = &self.reproducer_split {
            validate_budget_ms("budgets.reproducer_split.planner_ms", split.planner_ms)?;
            validate_budget_ms("budgets.reproducer_split.implementer_ms", split.implementer_ms)?;
        }
        if let Some(split) = &self.fixer_split {
            validate_budget_ms("budgets.fixer_split.planner_ms", split.planner_ms)?;
            validate_budget_ms("budgets.fixer_split.implementer_ms", split.implementer_ms)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
