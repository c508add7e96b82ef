//! Query translation and filtering over core and custom fields.
//!
//! A flat parameter map (CLI flags or MCP tool arguments) is split into core
//! and custom predicates, then applied to a task list with AND semantics
//! across fields and OR semantics within a comma-separated value.

use crate::fields::{FieldKind, classify, is_query_only_field};
use crate::types::Task;
use crate::validation::{suggest_field_name, validate_field_name};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Flat parameter map as received from a caller.
pub type QueryParams = Map<String, Value>;

/// Parameters split by field kind. Values are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedQuery {
    pub core_fields: Map<String, Value>,
    pub custom_fields: Map<String, Value>,
}

impl TranslatedQuery {
    pub fn is_empty(&self) -> bool {
        self.core_fields.is_empty() && self.custom_fields.is_empty()
    }
}

/// A "did you mean" hint for an unknown custom field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSuggestion {
    pub field: String,
    pub suggestion: String,
}

/// Result of [`validate_query_parameters`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<FieldSuggestion>,
}

/// Route each parameter to `core_fields` or `custom_fields`.
pub fn translate(params: &QueryParams) -> TranslatedQuery {
    let mut translated = TranslatedQuery::default();
    for (key, value) in params {
        let bucket = match classify(key) {
            FieldKind::Core => &mut translated.core_fields,
            FieldKind::Custom => &mut translated.custom_fields,
        };
        bucket.insert(key.clone(), value.clone());
    }
    translated
}

/// Keep the tasks that satisfy every predicate, in input order.
///
/// Predicates whose value is `null` are treated as not supplied, and
/// query-only parameters (`file`, `tag`, ...) never filter.
pub fn filter_tasks(tasks: &[Task], query: &TranslatedQuery) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| matches_query(task, query))
        .cloned()
        .collect()
}

/// True when `task` satisfies every predicate in `query`.
pub fn matches_query(task: &Task, query: &TranslatedQuery) -> bool {
    query
        .core_fields
        .iter()
        .all(|(field, wanted)| matches_core_field(task, field, wanted))
        && query
            .custom_fields
            .iter()
            .all(|(field, wanted)| matches_custom_field(task, field, wanted))
}

/// `filter_tasks(tasks, &translate(params))`.
pub fn query_tasks(tasks: &[Task], params: &QueryParams) -> Vec<Task> {
    filter_tasks(tasks, &translate(params))
}

fn matches_core_field(task: &Task, field: &str, wanted: &Value) -> bool {
    if is_query_only_field(field) {
        return true;
    }
    let Some(wanted_text) = filter_text(wanted) else {
        return true;
    };

    if field == "status" {
        let status = task.status.as_str();
        return if wanted_text.contains(',') {
            split_values(&wanted_text).any(|v| v.to_lowercase() == status)
        } else {
            wanted_text.to_lowercase() == status
        };
    }

    match task.core_field(field) {
        Some(actual) => actual == *wanted || value_text(&actual).contains(&wanted_text),
        None => false,
    }
}

// Empty custom values count as absent: `{"epic": ""}` never matches.
fn matches_custom_field(task: &Task, field: &str, wanted: &Value) -> bool {
    let Some(wanted_text) = filter_text(wanted) else {
        return true;
    };
    let Some(actual) = task.custom_fields.get(field).filter(|v| !v.is_empty()) else {
        return false;
    };

    if wanted_text.contains(',') {
        split_values(&wanted_text).any(|v| v == actual.as_str())
    } else {
        *actual == wanted_text || actual.contains(&wanted_text)
    }
}

fn split_values(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim)
}

fn filter_text(value: &Value) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(value_text(value))
    }
}

/// Plain-text form of a field value used for substring matching.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Every custom field name used by the tasks or their subtasks, unique, in
/// first-seen order.
pub fn extract_custom_field_names(tasks: &[Task]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    let all_fields = tasks.iter().flat_map(|task| {
        std::iter::once(&task.custom_fields).chain(task.subtasks.iter().map(|s| &s.custom_fields))
    });
    for fields in all_fields {
        for name in fields.keys() {
            if seen.insert(name.as_str()) {
                names.push(name.clone());
            }
        }
    }
    names
}

/// Check the custom-field side of a query before running it.
///
/// Reserved or malformed names are errors. Well-formed names that no task
/// uses yet produce a warning and, when something close exists, a
/// suggestion.
pub fn validate_query_parameters(params: &QueryParams, available_custom_fields: &[String]) -> QueryValidation {
    let mut result = QueryValidation::default();

    for name in translate(params).custom_fields.keys() {
        let check = validate_field_name(name);
        if !check.valid {
            if let Some(message) = check.message {
                result.errors.push(message);
            }
            continue;
        }
        if available_custom_fields.iter().any(|f| f == name) {
            continue;
        }
        result
            .warnings
            .push(format!("Custom field \"{}\" is not used by any task", name));
        if let Some(suggestion) = suggest_field_name(name, available_custom_fields) {
            result.suggestions.push(FieldSuggestion {
                field: name.clone(),
                suggestion,
            });
        }
    }

    result.valid = result.errors.is_empty();
    result
}
