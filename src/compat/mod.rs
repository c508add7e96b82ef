//! Backward compatibility for task data read from disk.
//!
//! Every transform here works on raw `serde_json::Value` trees so that
//! legacy and malformed records (null subtasks, missing ids, wrong
//! `parentTaskId`) can be repaired or reported instead of failing the load.
//! Inputs are never mutated; each function returns a new value.
//!
//! Read path: [`normalize_task_file`] on the whole file, then typed
//! deserialization per tag.

mod integrity;
mod migrate;
mod normalize;

pub use integrity::{
    IntegrityReport, IntegritySummary, OrphanedSubtask, StructureOptions, StructureReport,
    create_subtask_integrity_report, find_orphaned_subtasks, validate_subtask_structure,
};
pub use migrate::{
    LEGACY_TAG, ensure_data_backward_compatibility, ensure_tag_data_backward_compatibility,
    is_legacy_format, migrate_legacy_format, normalize_task_file,
};
pub use normalize::{
    ensure_custom_fields, ensure_custom_fields_on_tasks, ensure_subtask_parent_ids,
    ensure_tasks_backward_compatibility,
};

use serde_json::Value;

/// Truthiness of a raw JSON value: `null`, `false`, `0` and `""` are falsy.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Id equality where `1` and `1.0` are the same number. Other values
/// compare structurally, so `1` and `"1"` differ.
pub(crate) fn same_id(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Whether a raw entry carries a non-null `id`.
pub(crate) fn has_id(entry: &serde_json::Map<String, Value>) -> bool {
    entry.get("id").is_some_and(|id| !id.is_null())
}

/// Render an id-like value for messages: strings unquoted, everything else as JSON.
pub(crate) fn display_value(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
