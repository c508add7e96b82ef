//! Subtask structure validation, orphan detection and integrity reports.

use super::normalize::ensure_subtask_parent_ids;
use super::{display_value, has_id, is_truthy, same_id};
use crate::fields::SUBTASK_PARENT_FIELD;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Options for [`validate_subtask_structure`].
#[derive(Debug, Clone, Copy)]
pub struct StructureOptions {
    /// Correct `parentTaskId` values before scanning.
    pub fix_issues: bool,
    /// Trace each correction (only meaningful with `fix_issues`).
    pub log_migrations: bool,
}

impl Default for StructureOptions {
    fn default() -> Self {
        Self {
            fix_issues: true,
            log_migrations: false,
        }
    }
}

impl StructureOptions {
    /// Report-only mode: scan the input as-is.
    pub fn report_only() -> Self {
        Self {
            fix_issues: false,
            log_migrations: false,
        }
    }
}

/// Result of [`validate_subtask_structure`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureReport {
    /// The scanned tasks (corrected when `fix_issues` was set).
    pub tasks: Value,
    pub issues: Vec<String>,
    pub is_valid: bool,
}

/// A subtask whose `parentTaskId` names a task that does not exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedSubtask {
    #[serde(flatten)]
    pub subtask: Map<String, Value>,
    /// Id of the task whose `subtasks` array holds the entry.
    pub actual_parent_id: Value,
    /// The dangling `parentTaskId`.
    pub invalid_parent_id: Value,
    pub context: String,
}

/// Counters for [`IntegrityReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegritySummary {
    pub total_tasks: usize,
    pub tasks_with_subtasks: usize,
    pub total_subtasks: usize,
    pub subtasks_with_issues: usize,
    pub orphaned_subtasks: usize,
    /// Share of subtasks with a correct `parentTaskId`, e.g. `"87.5%"`.
    /// An empty collection reports `"100%"`.
    pub integrity_score: String,
}

/// Whole-collection subtask health report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub summary: IntegritySummary,
    pub issues: Vec<String>,
    pub orphaned_subtasks: Vec<OrphanedSubtask>,
    pub is_healthy: bool,
}

/// Check subtask structure, optionally repairing `parentTaskId` first.
///
/// Reported problems: missing subtask id, missing or incorrect
/// `parentTaskId`, duplicate subtask id within one task, missing title.
pub fn validate_subtask_structure(tasks: &Value, options: StructureOptions) -> StructureReport {
    if !tasks.is_array() {
        return StructureReport {
            tasks: tasks.clone(),
            issues: vec!["Tasks must be an array".to_string()],
            is_valid: false,
        };
    }

    let tasks = if options.fix_issues {
        ensure_subtask_parent_ids(tasks, options.log_migrations)
    } else {
        tasks.clone()
    };
    let issues = scan_subtask_issues(&tasks);

    StructureReport {
        is_valid: issues.is_empty(),
        tasks,
        issues,
    }
}

fn scan_subtask_issues(tasks: &Value) -> Vec<String> {
    let mut issues = Vec::new();

    for task in tasks.as_array().into_iter().flatten() {
        let Some(task) = task.as_object() else {
            continue;
        };
        let Some(Value::Array(subtasks)) = task.get("subtasks") else {
            continue;
        };
        let task_id = task.get("id");
        let task_label = display_value(task_id);
        let mut seen = HashSet::new();

        for (index, subtask) in subtasks.iter().enumerate() {
            let Some(sub) = subtask.as_object().filter(|sub| has_id(sub)) else {
                issues.push(format!("Task {}: Subtask at index {} missing id", task_label, index));
                continue;
            };
            let sub_id = &sub["id"];
            let sub_label = display_value(Some(sub_id));

            let parent = sub.get(SUBTASK_PARENT_FIELD);
            if !is_truthy(parent) {
                issues.push(format!("Task {}: Subtask {} missing parentTaskId", task_label, sub_label));
            } else if !same_id(parent, task_id) {
                issues.push(format!(
                    "Task {}: Subtask {} has incorrect parentTaskId ({})",
                    task_label,
                    sub_label,
                    display_value(parent)
                ));
            }

            if !seen.insert(sub_id.to_string()) {
                issues.push(format!("Task {}: Duplicate subtask ID {}", task_label, sub_label));
            }

            if !is_truthy(sub.get("title")) {
                issues.push(format!("Task {}: Subtask {} missing title", task_label, sub_label));
            }
        }
    }

    issues
}

/// Find subtasks whose truthy `parentTaskId` matches no task id in the
/// collection. Non-array input yields an empty list.
pub fn find_orphaned_subtasks(tasks: &Value) -> Vec<OrphanedSubtask> {
    let Some(list) = tasks.as_array() else {
        return Vec::new();
    };

    let known_ids: Vec<&Value> = list
        .iter()
        .filter_map(|t| t.as_object().and_then(|t| t.get("id")))
        .collect();

    let mut orphans = Vec::new();
    for task in list.iter().filter_map(Value::as_object) {
        let Some(Value::Array(subtasks)) = task.get("subtasks") else {
            continue;
        };
        let actual_parent_id = task.get("id").cloned().unwrap_or(Value::Null);

        for sub in subtasks.iter().filter_map(Value::as_object) {
            let parent = sub.get(SUBTASK_PARENT_FIELD);
            let Some(invalid_parent_id) = parent.filter(|p| is_truthy(Some(*p))) else {
                continue;
            };
            if known_ids.iter().any(|id| same_id(Some(*id), Some(invalid_parent_id))) {
                continue;
            }
            orphans.push(OrphanedSubtask {
                subtask: sub.clone(),
                context: format!(
                    "Found in task {} but references non-existent parent {}",
                    display_value(Some(&actual_parent_id)),
                    display_value(Some(invalid_parent_id))
                ),
                actual_parent_id: actual_parent_id.clone(),
                invalid_parent_id: invalid_parent_id.clone(),
            });
        }
    }
    orphans
}

/// Build a report over the whole collection without modifying it.
pub fn create_subtask_integrity_report(tasks: &Value) -> IntegrityReport {
    let mut total_tasks = 0;
    let mut tasks_with_subtasks = 0;
    let mut total_subtasks = 0;
    let mut subtasks_with_issues = 0;

    for task in tasks.as_array().into_iter().flatten().filter_map(Value::as_object) {
        total_tasks += 1;
        let subtasks = match task.get("subtasks") {
            Some(Value::Array(subtasks)) if !subtasks.is_empty() => subtasks,
            _ => continue,
        };
        tasks_with_subtasks += 1;
        let task_id = task.get("id");

        for sub in subtasks.iter().filter_map(Value::as_object) {
            total_subtasks += 1;
            let parent = sub.get(SUBTASK_PARENT_FIELD);
            if !is_truthy(parent) || !same_id(parent, task_id) {
                subtasks_with_issues += 1;
            }
        }
    }

    let structure = validate_subtask_structure(tasks, StructureOptions::report_only());
    let orphaned_subtasks = find_orphaned_subtasks(tasks);

    let integrity_score = if total_subtasks == 0 {
        "100%".to_string()
    } else {
        let healthy = (total_subtasks - subtasks_with_issues) as f64;
        format!("{:.1}%", healthy / total_subtasks as f64 * 100.0)
    };

    IntegrityReport {
        summary: IntegritySummary {
            total_tasks,
            tasks_with_subtasks,
            total_subtasks,
            subtasks_with_issues,
            orphaned_subtasks: orphaned_subtasks.len(),
            integrity_score,
        },
        is_healthy: structure.is_valid && orphaned_subtasks.is_empty(),
        issues: structure.issues,
        orphaned_subtasks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_array_is_invalid() {
        let report = validate_subtask_structure(&json!({"tasks": []}), StructureOptions::default());
        assert_eq!(report.issues, vec!["Tasks must be an array"]);
        assert!(!report.is_valid);
    }

    #[test]
    fn test_report_only_lists_every_issue() {
        let tasks = json!([{
            "id": 1,
            "subtasks": [
                {"title": "no id"},
                {"id": 1, "title": "ok?"},
                {"id": 2, "title": "wrong", "parentTaskId": 7},
                {"id": 2, "parentTaskId": 1}
            ]
        }]);
        let report = validate_subtask_structure(&tasks, StructureOptions::report_only());
        assert_eq!(
            report.issues,
            vec![
                "Task 1: Subtask at index 0 missing id",
                "Task 1: Subtask 1 missing parentTaskId",
                "Task 1: Subtask 2 has incorrect parentTaskId (7)",
                "Task 1: Duplicate subtask ID 2",
                "Task 1: Subtask 2 missing title",
            ]
        );
        assert_eq!(report.tasks, tasks);
    }

    #[test]
    fn test_fix_mode_repairs_parent_ids() {
        let tasks = json!([{"id": 3, "subtasks": [{"id": 1, "title": "S", "parentTaskId": 9}]}]);
        let report = validate_subtask_structure(&tasks, StructureOptions::default());
        assert!(report.is_valid, "{:?}", report.issues);
        assert_eq!(report.tasks[0]["subtasks"][0]["parentTaskId"], json!(3));
    }

    #[test]
    fn test_duplicates_scoped_per_task() {
        let tasks = json!([
            {"id": 1, "subtasks": [{"id": 1, "title": "a", "parentTaskId": 1}]},
            {"id": 2, "subtasks": [{"id": 1, "title": "b", "parentTaskId": 2}]}
        ]);
        let report = validate_subtask_structure(&tasks, StructureOptions::report_only());
        assert!(report.is_valid);
    }

    #[test]
    fn test_orphan_detection() {
        let tasks = json!([
            {"id": 1, "subtasks": [{"id": 1, "title": "fine", "parentTaskId": 1}]},
            {"id": 2, "subtasks": [{"id": 1, "title": "lost", "parentTaskId": 999}]}
        ]);
        let orphans = find_orphaned_subtasks(&tasks);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].actual_parent_id, json!(2));
        assert_eq!(orphans[0].invalid_parent_id, json!(999));
        assert_eq!(
            orphans[0].context,
            "Found in task 2 but references non-existent parent 999"
        );
        let value = serde_json::to_value(&orphans[0]).unwrap();
        assert_eq!(value["title"], json!("lost"));
        assert_eq!(value["invalidParentId"], json!(999));
    }

    #[test]
    fn test_float_parent_id_is_healthy() {
        let tasks = json!([{"id": 1, "subtasks": [{"id": 1, "title": "s", "parentTaskId": 1.0}]}]);
        let report = create_subtask_integrity_report(&tasks);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert!(report.orphaned_subtasks.is_empty());
        assert_eq!(report.summary.integrity_score, "100.0%");
        assert!(report.is_healthy);
    }

    #[test]
    fn test_cross_parent_reference_is_not_orphan() {
        // Points at the wrong task, but that task exists.
        let tasks = json!([
            {"id": 1, "subtasks": []},
            {"id": 2, "subtasks": [{"id": 1, "title": "x", "parentTaskId": 1}]}
        ]);
        assert!(find_orphaned_subtasks(&tasks).is_empty());
        assert!(find_orphaned_subtasks(&json!(null)).is_empty());
    }

    #[test]
    fn test_integrity_score_formats() {
        let empty = create_subtask_integrity_report(&json!([{"id": 1, "title": "t"}]));
        assert_eq!(empty.summary.integrity_score, "100%");
        assert!(empty.is_healthy);

        let healthy = create_subtask_integrity_report(&json!([
            {"id": 1, "subtasks": [{"id": 1, "title": "a", "parentTaskId": 1}]}
        ]));
        assert_eq!(healthy.summary.integrity_score, "100.0%");
        assert!(healthy.is_healthy);

        let half = create_subtask_integrity_report(&json!([
            {"id": 1, "subtasks": [
                {"id": 1, "title": "a", "parentTaskId": 1},
                {"id": 2, "title": "b"},
                {"id": 3, "title": "c", "parentTaskId": 1},
                {"id": 4, "title": "d", "parentTaskId": 2}
            ]},
            {"id": 2, "subtasks": []}
        ]));
        assert_eq!(half.summary.total_subtasks, 4);
        assert_eq!(half.summary.subtasks_with_issues, 2);
        assert_eq!(half.summary.integrity_score, "50.0%");
        assert_eq!(half.summary.tasks_with_subtasks, 1);
        assert_eq!(half.summary.total_tasks, 2);
        assert!(!half.is_healthy);
    }
}
