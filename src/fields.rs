//! Core field names and field classification.
//!
//! Every consumer that needs to know whether a name belongs to the task
//! schema reads the lists in this module; there are no other copies.

use serde::Serialize;

/// Attributes persisted on every task record.
pub const TASK_FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "details",
    "testStrategy",
    "status",
    "priority",
    "dependencies",
    "subtasks",
    "customFields",
];

/// Parameters accepted by list/search entry points that never appear on a
/// persisted task.
pub const QUERY_ONLY_FIELDS: &[&str] = &["file", "projectRoot", "tag", "withSubtasks", "complexityReport"];

/// Extra attribute reserved on subtasks (back-reference to the owning task).
pub const SUBTASK_PARENT_FIELD: &str = "parentTaskId";

/// Which side of a query a parameter name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Core,
    Custom,
}

/// Classify a parameter name. Matching is exact and case-sensitive, so
/// `Status` is a custom field while `status` is core.
pub fn classify(name: &str) -> FieldKind {
    if is_core_field(name) {
        FieldKind::Core
    } else {
        FieldKind::Custom
    }
}

/// True for persisted task attributes and query-only parameters.
pub fn is_core_field(name: &str) -> bool {
    TASK_FIELDS.contains(&name) || QUERY_ONLY_FIELDS.contains(&name)
}

/// True for query-only parameters (`file`, `tag`, ...).
pub fn is_query_only_field(name: &str) -> bool {
    QUERY_ONLY_FIELDS.contains(&name)
}

/// True when `name` cannot be used as a task-level custom field name.
pub fn is_reserved_field_name(name: &str) -> bool {
    TASK_FIELDS.contains(&name)
}

/// True when `name` cannot be used as a subtask-level custom field name.
pub fn is_reserved_subtask_field_name(name: &str) -> bool {
    is_reserved_field_name(name) || name == SUBTASK_PARENT_FIELD
}

/// All names that `classify` reports as core, in declaration order.
pub fn core_field_names() -> impl Iterator<Item = &'static str> {
    TASK_FIELDS.iter().chain(QUERY_ONLY_FIELDS.iter()).copied()
}
