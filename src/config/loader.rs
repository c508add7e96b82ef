//! Tiered configuration loading.
//!
//! Tiers, lowest priority first: built-in defaults, project
//! `task-fields/config.yaml`, user `~/.task-fields/config.yaml`, then
//! environment variables. YAML tiers are merged key by key.

use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_CONFIG_PATH: &str = "TASK_FIELDS_CONFIG_PATH";
pub const ENV_TASKS_PATH: &str = "TASK_FIELDS_TASKS_PATH";
pub const ENV_TAG: &str = "TASK_FIELDS_TAG";
pub const ENV_USER_DIR: &str = "TASK_FIELDS_USER_DIR";
pub const ENV_PROJECT_DIR: &str = "TASK_FIELDS_PROJECT_DIR";

const CONFIG_FILE: &str = "config.yaml";

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
    /// Explicit config file; replaces the directory tiers when set.
    pub config_file: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Project dir: `TASK_FIELDS_PROJECT_DIR` or `./task-fields`.
    /// User dir: `TASK_FIELDS_USER_DIR` or `~/.task-fields`.
    /// Config file: `TASK_FIELDS_CONFIG_PATH`, if set.
    pub fn discover() -> Self {
        let project_dir = std::env::var(ENV_PROJECT_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("task-fields"));
        let user_dir = std::env::var(ENV_USER_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".task-fields")));

        Self {
            project_dir: Some(project_dir),
            user_dir,
            config_file: std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from),
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
            config_file: None,
        }
    }

    /// Use `path` instead of the directory tiers.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    fn tier_files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        [&self.project_dir, &self.user_dir]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(CONFIG_FILE))
    }
}

/// Loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Merge all tiers found under `paths`.
    ///
    /// An explicit config file replaces the directory tiers. A tier file
    /// that cannot be read or parsed is skipped with a warning.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        let mut sources = Vec::new();

        let mut config = if let Some(path) = &paths.config_file {
            let config = Config::load(path)?;
            sources.push(path.clone());
            config
        } else {
            let mut merged = serde_json::to_value(Config::default()).context("failed to encode defaults")?;
            for file in paths.tier_files() {
                if let Some(tier) = read_tier(&file) {
                    merge_into(&mut merged, tier);
                    sources.push(file);
                }
            }
            serde_json::from_value(merged).context("invalid merged configuration")?
        };

        apply_env_overrides(&mut config);
        debug!(sources = ?sources, "Configuration loaded");

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that contributed, lowest priority first.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

fn read_tier(file: &Path) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let parsed = std::fs::read_to_string(file)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(file = %file.display(), %error, "Skipping unreadable config file");
            None
        }
    }
}

/// Merge `overlay` into `base`: objects key by key, everything else
/// replaced. A `null` overlay leaves `base` alone.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(tasks_path) = std::env::var(ENV_TASKS_PATH) {
        config.storage.tasks_path = PathBuf::from(tasks_path);
    }
    if let Ok(tag) = std::env::var(ENV_TAG) {
        config.storage.default_tag = tag;
    }
}
