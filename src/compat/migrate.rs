//! Tag-level and file-level compatibility, including legacy format migration.

use super::normalize::normalize_tasks;
use tracing::info;
use serde_json::{Map, Value, json};

/// Tag that receives the tasks of a legacy (untagged) file.
pub const LEGACY_TAG: &str = "master";

fn has_tasks_array(value: &Value) -> bool {
    value.get("tasks").is_some_and(Value::is_array)
}

/// True when `data` is a bare `{ "tasks": [...] }` object rather than a
/// tag map: it has a top-level `tasks` array and no sibling object that
/// itself holds a `tasks` array.
pub fn is_legacy_format(data: &Value) -> bool {
    let Some(map) = data.as_object() else {
        return false;
    };
    has_tasks_array(data) && !map.values().any(|v| v.is_object() && has_tasks_array(v))
}

/// Normalize `tag_data.tasks` when present; anything else passes through.
pub fn ensure_tag_data_backward_compatibility(tag_data: &Value) -> Value {
    normalize_tag_data(tag_data, false)
}

fn normalize_tag_data(tag_data: &Value, log_migrations: bool) -> Value {
    let mut tag_data = tag_data.clone();
    if let Some(tasks) = tag_data.as_object_mut().and_then(|m| m.get_mut("tasks")) {
        *tasks = normalize_tasks(tasks, log_migrations);
    }
    tag_data
}

/// Wrap a legacy file into tagged form under [`LEGACY_TAG`].
///
/// Tasks are normalized. Caller metadata is kept verbatim; when absent a
/// fresh block is created.
pub fn migrate_legacy_format(legacy: &Value) -> Value {
    migrate_legacy(legacy, false)
}

fn migrate_legacy(legacy: &Value, log_migrations: bool) -> Value {
    let tasks = legacy
        .get("tasks")
        .map(|tasks| normalize_tasks(tasks, log_migrations))
        .unwrap_or_else(|| Value::Array(Vec::new()));

    let metadata = match legacy.get("metadata") {
        Some(metadata) if !metadata.is_null() => metadata.clone(),
        _ => {
            let now = chrono::Utc::now().to_rfc3339();
            json!({
                "created": now,
                "updated": now,
                "description": "Tasks for master context"
            })
        }
    };

    let mut tagged = Map::new();
    tagged.insert(
        LEGACY_TAG.to_string(),
        json!({ "tasks": tasks, "metadata": metadata }),
    );
    Value::Object(tagged)
}

/// Normalize a whole file.
///
/// Legacy files are migrated into tagged form. In tagged files every
/// top-level entry holding a `tasks` array is normalized and every other
/// key is passed through. `null` is returned unchanged.
pub fn ensure_data_backward_compatibility(data: &Value, is_legacy_format: bool) -> Value {
    normalize_data(data, is_legacy_format, false)
}

/// Detect the file format and normalize, tracing `parentTaskId` corrections
/// when `log_migrations` is set. This is what every load runs.
pub fn normalize_task_file(data: &Value, log_migrations: bool) -> Value {
    let legacy = is_legacy_format(data);
    if legacy {
        info!(tag = LEGACY_TAG, "Migrating legacy task file to tagged format");
    }
    normalize_data(data, legacy, log_migrations)
}

fn normalize_data(data: &Value, is_legacy_format: bool, log_migrations: bool) -> Value {
    if data.is_null() {
        return Value::Null;
    }
    if is_legacy_format {
        return migrate_legacy(data, log_migrations);
    }
    let Some(map) = data.as_object() else {
        return data.clone();
    };

    let normalized = map
        .iter()
        .map(|(key, value)| {
            let value = if value.is_object() && has_tasks_array(value) {
                normalize_tag_data(value, log_migrations)
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect();
    Value::Object(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_detection() {
        assert!(is_legacy_format(&json!({"tasks": []})));
        assert!(is_legacy_format(&json!({"tasks": [], "metadata": {"x": 1}})));
        assert!(!is_legacy_format(&json!({"master": {"tasks": []}})));
        assert!(!is_legacy_format(&json!({"tasks": [], "feature": {"tasks": []}})));
        assert!(!is_legacy_format(&json!({"tasks": "nope"})));
        assert!(!is_legacy_format(&json!([])));
    }

    #[test]
    fn test_tag_data_passthrough() {
        assert_eq!(ensure_tag_data_backward_compatibility(&json!(null)), json!(null));
        let no_tasks = json!({"metadata": {"description": "d"}});
        assert_eq!(ensure_tag_data_backward_compatibility(&no_tasks), no_tasks);
    }

    #[test]
    fn test_tag_data_normalizes_tasks() {
        let tag = json!({"tasks": [{"id": 1, "subtasks": [{"id": 1}]}], "metadata": {}});
        let out = ensure_tag_data_backward_compatibility(&tag);
        assert_eq!(out["tasks"][0]["customFields"], json!({}));
        assert_eq!(out["tasks"][0]["subtasks"][0]["parentTaskId"], json!(1));
        assert_eq!(out["metadata"], json!({}));
    }

    #[test]
    fn test_legacy_migration_defaults_metadata() {
        let out = migrate_legacy_format(&json!({"tasks": [{"id": 1, "title": "T1"}]}));
        let master = &out[LEGACY_TAG];
        assert_eq!(master["tasks"][0]["customFields"], json!({}));
        assert_eq!(master["metadata"]["description"], json!("Tasks for master context"));
        assert!(master["metadata"]["created"].is_string());
        assert_eq!(master["metadata"]["created"], master["metadata"]["updated"]);
    }

    #[test]
    fn test_legacy_migration_keeps_metadata() {
        let metadata = json!({"created": "2024-01-01T00:00:00Z", "owner": "ops"});
        let out = migrate_legacy_format(&json!({"tasks": [], "metadata": metadata.clone()}));
        assert_eq!(out[LEGACY_TAG]["metadata"], metadata);
        assert_eq!(out[LEGACY_TAG]["tasks"], json!([]));
    }

    #[test]
    fn test_data_compat_tagged_and_siblings() {
        let data = json!({
            "master": {"tasks": [{"id": 1}], "metadata": {}},
            "feature": {"tasks": [{"id": 2, "customFields": {"epic": "E"}}]},
            "settings": {"currentTag": "master"},
            "version": 3
        });
        let out = ensure_data_backward_compatibility(&data, false);
        assert_eq!(out["master"]["tasks"][0]["customFields"], json!({}));
        assert_eq!(out["feature"]["tasks"][0]["customFields"], json!({"epic": "E"}));
        assert_eq!(out["settings"], data["settings"]);
        assert_eq!(out["version"], json!(3));
    }

    #[test]
    fn test_normalize_task_file_detects_format() {
        let legacy = normalize_task_file(&json!({"tasks": [{"id": 1, "subtasks": [{"id": 1, "parentTaskId": 7}]}]}), true);
        assert_eq!(legacy[LEGACY_TAG]["tasks"][0]["subtasks"][0]["parentTaskId"], json!(1));

        let tagged = json!({"feature": {"tasks": [{"id": 2, "customFields": {}}], "metadata": {}}});
        assert_eq!(normalize_task_file(&tagged, false), tagged);
    }

    #[test]
    fn test_data_compat_null_and_legacy() {
        assert_eq!(ensure_data_backward_compatibility(&json!(null), true), json!(null));
        let out = ensure_data_backward_compatibility(&json!({"tasks": [{"id": 4}]}), true);
        assert_eq!(out[LEGACY_TAG]["tasks"][0]["id"], json!(4));
    }
}
