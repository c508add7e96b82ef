//! JSON task file persistence.
//!
//! Every load runs the compatibility pass before anything is deserialized,
//! so legacy files and records with missing `customFields` or stale
//! `parentTaskId` values reach callers already normalized. Saves rewrite
//! the whole file through a temporary sibling.

use crate::compat::{
    IntegrityReport, LEGACY_TAG, create_subtask_integrity_report, is_legacy_format, normalize_task_file,
};
use crate::types::{CustomFields, TagData, Task, coerce_field_value};
use crate::validation::{FieldValidation, validate_field_name, validate_subtask_field_name};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("tag \"{tag}\" does not match the task schema: {source}")]
    Schema {
        tag: String,
        source: serde_json::Error,
    },

    #[error("tag \"{0}\" not found")]
    TagNotFound(String),

    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("subtask {parent}.{subtask} not found")]
    SubtaskNotFound { parent: u64, subtask: u64 },

    #[error("{0}")]
    InvalidFieldName(String),

    #[error("custom field \"{field}\" must be a string, number or boolean, got {kind}")]
    InvalidFieldValue { field: String, kind: &'static str },

    #[error("invalid target \"{0}\": expected a task id or parent.sub")]
    InvalidTarget(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A loaded task file: typed tags plus any other top-level entries, kept
/// verbatim so they survive a save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFile {
    pub tags: BTreeMap<String, TagData>,
    pub other: Map<String, Value>,
}

impl TaskFile {
    /// Split a normalized tagged value into typed tags and passthrough entries.
    pub fn from_value(value: Value) -> StoreResult<Self> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Schema {
                    tag: String::new(),
                    source: <serde_json::Error as serde::de::Error>::custom(format!(
                        "expected an object of tags, got {}",
                        json_type(&other)
                    )),
                });
            }
        };

        let mut file = Self::default();
        for (key, value) in map {
            if is_tag_entry(&value) {
                let tag_data = serde_json::from_value(value)
                    .map_err(|source| StoreError::Schema { tag: key.clone(), source })?;
                file.tags.insert(key, tag_data);
            } else {
                file.other.insert(key, value);
            }
        }
        Ok(file)
    }

    pub fn to_value(&self) -> StoreResult<Value> {
        let mut map = self.other.clone();
        for (name, data) in &self.tags {
            let value = serde_json::to_value(data).map_err(|source| StoreError::Schema {
                tag: name.clone(),
                source,
            })?;
            map.insert(name.clone(), value);
        }
        Ok(Value::Object(map))
    }

    pub fn tag(&self, name: &str) -> StoreResult<&TagData> {
        self.tags
            .get(name)
            .ok_or_else(|| StoreError::TagNotFound(name.to_string()))
    }

    pub fn tag_mut(&mut self, name: &str) -> StoreResult<&mut TagData> {
        self.tags
            .get_mut(name)
            .ok_or_else(|| StoreError::TagNotFound(name.to_string()))
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }
}

fn is_tag_entry(value: &Value) -> bool {
    value.get("tasks").is_some_and(Value::is_array)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// What a custom field update addresses: `"12"` or `"12.3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    Task(u64),
    Subtask { parent: u64, subtask: u64 },
}

impl FromStr for FieldTarget {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidTarget(s.to_string());
        match s.trim().split_once('.') {
            None => s.trim().parse().map(FieldTarget::Task).map_err(|_| invalid()),
            Some((parent, subtask)) => Ok(FieldTarget::Subtask {
                parent: parent.parse().map_err(|_| invalid())?,
                subtask: subtask.parse().map_err(|_| invalid())?,
            }),
        }
    }
}

impl fmt::Display for FieldTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTarget::Task(id) => write!(f, "{}", id),
            FieldTarget::Subtask { parent, subtask } => write!(f, "{}.{}", parent, subtask),
        }
    }
}

/// Changes to apply to one record's custom fields.
///
/// With `replace` the existing map is cleared first. `unset` runs after
/// `set`. A `null` value in `set` removes the key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomFieldsUpdate {
    pub set: Map<String, Value>,
    pub unset: Vec<String>,
    pub replace: bool,
}

impl CustomFieldsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(key.into(), value.into());
        self
    }

    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.unset.push(key.into());
        self
    }

    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.set.keys().map(String::as_str).chain(self.unset.iter().map(String::as_str))
    }

    fn apply(&self, fields: &mut CustomFields) -> StoreResult<()> {
        let mut coerced = Vec::with_capacity(self.set.len());
        for (key, value) in &self.set {
            let value = coerce_field_value(value).map_err(|kind| StoreError::InvalidFieldValue {
                field: key.clone(),
                kind,
            })?;
            coerced.push((key.clone(), value));
        }

        if self.replace {
            fields.clear();
        }
        for (key, value) in coerced {
            match value {
                Some(value) => {
                    fields.insert(key, value);
                }
                None => {
                    fields.remove(&key);
                }
            }
        }
        for key in &self.unset {
            fields.remove(key);
        }
        Ok(())
    }
}

/// Integrity findings for one tag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagIntegrity {
    pub tag: String,
    pub report: IntegrityReport,
}

impl TagIntegrity {
    pub fn is_healthy(&self) -> bool {
        self.report.is_healthy
    }
}

/// Outcome of [`TaskStore::migrate_file`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub was_legacy: bool,
    pub changed: bool,
    pub written: bool,
    /// Findings for the data as it was before migration.
    pub tags: Vec<TagIntegrity>,
}

/// Handle on a single task file.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
    log_migrations: bool,
}

impl TaskStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            log_migrations: false,
        }
    }

    /// Trace each `parentTaskId` correction made while loading.
    pub fn with_log_migrations(mut self, log_migrations: bool) -> Self {
        self.log_migrations = log_migrations;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Parsed file contents without normalization. A missing file reads as `{}`.
    pub fn load_raw(&self) -> StoreResult<Value> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Task file does not exist, using empty collection");
            return Ok(Value::Object(Map::new()));
        }
        let text = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_str(&text).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Load, normalize and deserialize the file.
    pub fn load(&self) -> StoreResult<TaskFile> {
        let raw = self.load_raw()?;
        TaskFile::from_value(normalize_task_file(&raw, self.log_migrations))
    }

    /// Tasks of one tag.
    pub fn tasks_for_tag(&self, tag: &str) -> StoreResult<Vec<Task>> {
        let mut file = self.load()?;
        file.tags
            .remove(tag)
            .map(|data| data.tasks)
            .ok_or_else(|| StoreError::TagNotFound(tag.to_string()))
    }

    pub fn save(&self, file: &TaskFile) -> StoreResult<()> {
        self.write_value(&file.to_value()?)
    }

    fn write_value(&self, value: &Value) -> StoreResult<()> {
        let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text + "\n").map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), "Saved task file");
        Ok(())
    }

    /// Apply `update` to the custom fields of a task or subtask and save.
    ///
    /// Every key is validated first; nothing is written if any key or value
    /// is rejected. Returns the record's fields after the update.
    pub fn update_custom_fields(
        &self,
        tag: &str,
        target: FieldTarget,
        update: &CustomFieldsUpdate,
    ) -> StoreResult<CustomFields> {
        let validate: fn(&str) -> FieldValidation = match target {
            FieldTarget::Task(_) => validate_field_name,
            FieldTarget::Subtask { .. } => validate_subtask_field_name,
        };
        for name in update.names() {
            let check = validate(name);
            if !check.valid {
                return Err(StoreError::InvalidFieldName(
                    check.message.unwrap_or_else(|| format!("invalid field name \"{}\"", name)),
                ));
            }
        }

        let mut file = self.load()?;
        let tag_data = file.tag_mut(tag)?;
        let fields = match target {
            FieldTarget::Task(id) => {
                let task = tag_data.task_mut(id).ok_or(StoreError::TaskNotFound(id))?;
                &mut task.custom_fields
            }
            FieldTarget::Subtask { parent, subtask } => {
                let task = tag_data
                    .task_mut(parent)
                    .ok_or(StoreError::TaskNotFound(parent))?;
                let sub = task
                    .subtask_mut(subtask)
                    .ok_or(StoreError::SubtaskNotFound { parent, subtask })?;
                &mut sub.custom_fields
            }
        };
        update.apply(fields)?;
        let result = fields.clone();
        tag_data.metadata.touch();

        self.save(&file)?;
        info!(tag, target = %target, fields = result.len(), "Updated custom fields");
        Ok(result)
    }

    /// Per-tag integrity findings for the file as stored, without fixing.
    pub fn check(&self, tag: Option<&str>) -> StoreResult<Vec<TagIntegrity>> {
        let raw = self.load_raw()?;
        let tags = raw_tag_tasks(&raw);
        if let Some(name) = tag
            && !tags.iter().any(|(t, _)| t == name)
        {
            return Err(StoreError::TagNotFound(name.to_string()));
        }
        Ok(tags
            .into_iter()
            .filter(|(name, _)| tag.is_none_or(|t| t == name))
            .map(|(name, tasks)| integrity_for(name, tasks))
            .collect())
    }

    /// Normalize the file in place.
    ///
    /// Works on raw JSON so files that cannot be loaded as typed data (for
    /// example subtasks without ids) can still be repaired as far as
    /// possible. Nothing is written when `dry_run` is set or nothing changed.
    pub fn migrate_file(&self, dry_run: bool) -> StoreResult<MigrationReport> {
        let raw = self.load_raw()?;
        let was_legacy = is_legacy_format(&raw);
        let tags = raw_tag_tasks(&raw)
            .into_iter()
            .map(|(name, tasks)| integrity_for(name, tasks))
            .collect();

        let normalized = normalize_task_file(&raw, self.log_migrations);
        let changed = normalized != raw;
        let written = changed && !dry_run;
        if written {
            self.write_value(&normalized)?;
            info!(path = %self.path.display(), was_legacy, "Migrated task file");
        }

        Ok(MigrationReport {
            was_legacy,
            changed,
            written,
            tags,
        })
    }
}

/// `(tag, tasks)` pairs of a raw file; a legacy file is reported under
/// [`LEGACY_TAG`].
fn raw_tag_tasks(raw: &Value) -> Vec<(String, &Value)> {
    if is_legacy_format(raw) {
        return raw
            .get("tasks")
            .map(|tasks| vec![(LEGACY_TAG.to_string(), tasks)])
            .unwrap_or_default();
    }
    raw.as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(name, value)| {
                    value
                        .get("tasks")
                        .filter(|tasks| tasks.is_array())
                        .map(|tasks| (name.clone(), tasks))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn integrity_for(tag: String, tasks: &Value) -> TagIntegrity {
    TagIntegrity {
        tag,
        report: create_subtask_integrity_report(tasks),
    }
}
