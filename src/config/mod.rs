//! Configuration.
//!
//! Merged from defaults, project `task-fields/config.yaml` and user
//! `~/.task-fields/config.yaml`, then environment overrides.
//!
//! ## Environment Variables
//! - `TASK_FIELDS_CONFIG_PATH` - Explicit config file (replaces the file tiers)
//! - `TASK_FIELDS_TASKS_PATH` - Task file path
//! - `TASK_FIELDS_TAG` - Default tag
//! - `TASK_FIELDS_USER_DIR` - User config dir (default: `~/.task-fields`)
//! - `TASK_FIELDS_PROJECT_DIR` - Project config dir (default: `./task-fields`)

mod loader;
mod types;

pub use loader::{
    ConfigLoader, ConfigPaths, ENV_CONFIG_PATH, ENV_PROJECT_DIR, ENV_TAG, ENV_TASKS_PATH, ENV_USER_DIR,
    merge_into,
};
pub use types::*;
