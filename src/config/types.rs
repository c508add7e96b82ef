//! Configuration types.

use crate::format::OutputFormat;
use crate::search::DEFAULT_THRESHOLD;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load a single config file, without tier merging.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }
}

/// Where tasks live on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Task file (default: `.taskmaster/tasks/tasks.json`).
    #[serde(default = "default_tasks_path")]
    pub tasks_path: PathBuf,

    /// Tag used when a request does not name one.
    #[serde(default = "default_tag")]
    pub default_tag: String,

    /// Trace each `parentTaskId` correction made while loading.
    #[serde(default)]
    pub log_migrations: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tasks_path: default_tasks_path(),
            default_tag: default_tag(),
            log_migrations: false,
        }
    }
}

fn default_tasks_path() -> PathBuf {
    PathBuf::from(".taskmaster/tasks/tasks.json")
}

fn default_tag() -> String {
    "master".to_string()
}

/// Fuzzy search tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Match threshold for `search` (0.0 exact .. 1.0 anything).
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Match threshold for relevance lookups; the low bucket ends at 0.6.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Most recent tasks appended behind relevance hits.
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            relevance_threshold: default_relevance_threshold(),
            max_results: default_max_results(),
            recent_count: default_recent_count(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_relevance_threshold() -> f64 {
    0.6
}

fn default_max_results() -> usize {
    20
}

fn default_recent_count() -> usize {
    5
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("search:\n  max_results: 3\n").unwrap();
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.search.threshold, 0.3);
        assert_eq!(config.storage.default_tag, "master");
        assert_eq!(config.output.default_format, OutputFormat::Json);
    }

    #[test]
    fn test_output_format_from_yaml() {
        let config: Config = serde_yaml::from_str("output:\n  default_format: markdown\n").unwrap();
        assert_eq!(config.output.default_format, OutputFormat::Markdown);
    }
}
