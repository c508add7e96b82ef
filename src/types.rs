//! Core types for task files.
//!
//! These are the typed records the query and search paths work on. Raw JSON
//! read from disk goes through [`crate::compat`] first; only normalized data
//! is deserialized into these structs.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// User-defined metadata attached to a task or subtask.
pub type CustomFields = BTreeMap<String, String>;

/// Task status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Done,
    Review,
    Deferred,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Review,
        TaskStatus::Deferred,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
            TaskStatus::Review => "review",
            TaskStatus::Deferred => "deferred",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a status name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency entry: a task id, or a dotted `"parent.sub"` subtask path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyRef {
    Task(u64),
    Path(String),
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyRef::Task(id) => write!(f, "{}", id),
            DependencyRef::Path(path) => f.write_str(path),
        }
    }
}

/// A task in a tag collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "testStrategy", default, skip_serializing_if = "Option::is_none")]
    pub test_strategy: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(
        rename = "customFields",
        default,
        deserialize_with = "deserialize_custom_fields"
    )]
    pub custom_fields: CustomFields,

    /// Attributes this crate does not interpret, kept so saves are lossless.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            details: None,
            test_strategy: None,
            status: TaskStatus::default(),
            priority: None,
            dependencies: Vec::new(),
            subtasks: Vec::new(),
            custom_fields: CustomFields::new(),
            extra: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_custom_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.insert(key.into(), value.into());
        self
    }

    /// Append a subtask, pointing its back-reference at this task.
    pub fn push_subtask(&mut self, mut subtask: Subtask) {
        subtask.parent_task_id = Some(self.id);
        self.subtasks.push(subtask);
    }

    pub fn subtask(&self, id: u64) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    pub fn subtask_mut(&mut self, id: u64) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == id)
    }

    /// Value of a core attribute by its persisted name.
    ///
    /// Query-only parameter names and unknown names return `None`.
    pub fn core_field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id)),
            "title" => Some(Value::String(self.title.clone())),
            "description" => self.description.clone().map(Value::String),
            "details" => self.details.clone().map(Value::String),
            "testStrategy" => self.test_strategy.clone().map(Value::String),
            "status" => Some(Value::String(self.status.as_str().to_string())),
            "priority" => self.priority.map(|p| Value::String(p.as_str().to_string())),
            "dependencies" => serde_json::to_value(&self.dependencies).ok(),
            "subtasks" => serde_json::to_value(&self.subtasks).ok(),
            "customFields" => serde_json::to_value(&self.custom_fields).ok(),
            _ => None,
        }
    }
}

/// A subtask, owned by exactly one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyRef>,
    #[serde(rename = "parentTaskId", default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<u64>,
    #[serde(
        rename = "customFields",
        default,
        deserialize_with = "deserialize_custom_fields"
    )]
    pub custom_fields: CustomFields,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Subtask {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            details: None,
            status: TaskStatus::default(),
            dependencies: Vec::new(),
            parent_task_id: None,
            custom_fields: CustomFields::new(),
            extra: Map::new(),
        }
    }

    pub fn with_custom_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.insert(key.into(), value.into());
        self
    }

    /// Display id in `"parent.sub"` form.
    pub fn display_id(&self, parent_id: u64) -> String {
        format!("{}.{}", parent_id, self.id)
    }
}

/// Per-tag metadata block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TagMetadata {
    /// Fresh metadata with `created`/`updated` set to now.
    pub fn new(description: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            created: Some(now.clone()),
            updated: Some(now),
            description: Some(description.into()),
            extra: Map::new(),
        }
    }

    pub fn touch(&mut self) {
        self.updated = Some(chrono::Utc::now().to_rfc3339());
    }
}

/// One tag's tasks plus metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagData {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub metadata: TagMetadata,
}

impl TagData {
    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

/// Convert a JSON value into a stored custom field value.
///
/// Strings are kept, numbers and booleans become their string form and
/// `null` means "no value". Arrays and objects are rejected with the JSON
/// type name.
pub fn coerce_field_value(value: &Value) -> Result<Option<String>, &'static str> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) => Err("array"),
        Value::Object(_) => Err("object"),
    }
}

/// Deserialize a `customFields` map, treating `null` as empty and coercing
/// scalar values to strings.
pub fn deserialize_custom_fields<'de, D>(deserializer: D) -> Result<CustomFields, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Map<String, Value>> = Option::deserialize(deserializer)?;
    let mut fields = CustomFields::new();
    for (key, value) in raw.unwrap_or_default() {
        match coerce_field_value(&value) {
            Ok(Some(v)) => {
                fields.insert(key, v);
            }
            Ok(None) => {}
            Err(kind) => {
                return Err(D::Error::custom(format!(
                    "custom field \"{}\" must be a string, number or boolean, got {}",
                    key, kind
                )));
            }
        }
    }
    Ok(fields)
}
