//! `customFields` defaulting and `parentTaskId` correction.

use super::{display_value, has_id, is_truthy, same_id};
use crate::fields::SUBTASK_PARENT_FIELD;
use serde_json::{Map, Value};
use tracing::debug;

const CUSTOM_FIELDS: &str = "customFields";

/// Return a copy of `item` whose `customFields` is `{}` when missing or falsy.
///
/// Non-object values are returned unchanged. A non-empty `customFields`
/// (even one of the wrong type) is left alone for the typed layer to reject.
pub fn ensure_custom_fields(item: &Value) -> Value {
    let mut item = item.clone();
    if let Some(map) = item.as_object_mut() {
        default_custom_fields(map);
    }
    item
}

fn default_custom_fields(map: &mut Map<String, Value>) {
    if !is_truthy(map.get(CUSTOM_FIELDS)) {
        map.insert(CUSTOM_FIELDS.to_string(), Value::Object(Map::new()));
    }
}

/// Apply [`ensure_custom_fields`] to every task and every object subtask.
///
/// A `null` `subtasks` becomes `[]`; a missing `subtasks` stays missing.
/// Non-array input is returned unchanged.
pub fn ensure_custom_fields_on_tasks(tasks: &Value) -> Value {
    let Some(list) = tasks.as_array() else {
        return tasks.clone();
    };

    let normalized = list
        .iter()
        .map(|task| {
            let mut task = task.clone();
            if let Some(map) = task.as_object_mut() {
                default_custom_fields(map);
                match map.get_mut("subtasks") {
                    Some(Value::Array(subtasks)) => {
                        for subtask in subtasks.iter_mut() {
                            if let Some(sub) = subtask.as_object_mut() {
                                default_custom_fields(sub);
                            }
                        }
                    }
                    Some(slot @ Value::Null) => *slot = Value::Array(Vec::new()),
                    _ => {}
                }
            }
            task
        })
        .collect();

    Value::Array(normalized)
}

/// Point every subtask's `parentTaskId` at the task that contains it.
///
/// Tasks without an id and subtask entries that are not objects with a
/// non-null `id` are left untouched. A parent id equal in value (`1.0` for
/// task `1`) is kept as written. Order is preserved. With `log_migrations`, each
/// correction and the final count are traced at debug level.
pub fn ensure_subtask_parent_ids(tasks: &Value, log_migrations: bool) -> Value {
    let Some(list) = tasks.as_array() else {
        return tasks.clone();
    };

    let mut corrections = 0usize;
    let fixed: Vec<Value> = list
        .iter()
        .map(|task| {
            let mut task = task.clone();
            let Some(map) = task.as_object_mut() else {
                return task;
            };
            let task_id = match map.get("id") {
                Some(id) if !id.is_null() => id.clone(),
                _ => return task,
            };
            let Some(Value::Array(subtasks)) = map.get_mut("subtasks") else {
                return task;
            };

            for subtask in subtasks.iter_mut() {
                let Some(sub) = subtask.as_object_mut() else {
                    continue;
                };
                if !has_id(sub) {
                    continue;
                }
                let current = sub.get(SUBTASK_PARENT_FIELD);
                if is_truthy(current) && same_id(current, Some(&task_id)) {
                    continue;
                }
                if log_migrations {
                    debug!(
                        subtask = %format!("{}.{}", display_value(Some(&task_id)), display_value(sub.get("id"))),
                        previous = %display_value(current),
                        "Corrected subtask parentTaskId"
                    );
                }
                sub.insert(SUBTASK_PARENT_FIELD.to_string(), task_id.clone());
                corrections += 1;
            }
            task
        })
        .collect();

    if log_migrations && corrections > 0 {
        debug!(corrections, "Subtask parentTaskId migration complete");
    }

    Value::Array(fixed)
}

/// Full read-path normalization for a task list: `customFields` defaults on
/// tasks and subtasks, then `parentTaskId` correction.
pub fn ensure_tasks_backward_compatibility(tasks: &Value) -> Value {
    normalize_tasks(tasks, false)
}

pub(crate) fn normalize_tasks(tasks: &Value, log_migrations: bool) -> Value {
    ensure_subtask_parent_ids(&ensure_custom_fields_on_tasks(tasks), log_migrations)
}
