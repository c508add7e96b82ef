//! Integration tests for query translation and filtering over tasks loaded
//! from JSON.

use serde_json::{Value, json};
use task_fields_mcp::query::{
    QueryParams, extract_custom_field_names, query_tasks, translate, validate_query_parameters,
};
use task_fields_mcp::types::Task;

fn tasks() -> Vec<Task> {
    serde_json::from_value(json!([
        {
            "id": 1, "title": "Login form", "status": "pending", "priority": "high",
            "customFields": { "epic": "EPIC-1234", "component": "auth", "sprint": "S1" }
        },
        {
            "id": 2, "title": "Signup flow", "status": "in-progress", "priority": "medium",
            "customFields": { "epic": "EPIC-1234", "component": "auth", "sprint": "S2" }
        },
        {
            "id": 3, "title": "Billing page", "status": "done", "priority": "low",
            "customFields": { "epic": "EPIC-9", "component": "payments", "points": 5 }
        },
        {
            "id": 4, "title": "Unplanned", "status": "pending",
            "customFields": { "epic": "", "component": null }
        },
        {
            "id": 5, "title": "Reports", "status": "review",
            "subtasks": [{ "id": 1, "title": "Export", "customFields": { "owner": "kim" } }]
        }
    ]))
    .unwrap()
}

fn params(value: Value) -> QueryParams {
    value.as_object().cloned().unwrap()
}

fn ids(tasks: &[Task]) -> Vec<u64> {
    tasks.iter().map(|t| t.id).collect()
}

#[test]
fn custom_values_are_coerced_on_load() {
    let tasks = tasks();
    assert_eq!(tasks[2].custom_fields["points"], "5");
    assert!(!tasks[3].custom_fields.contains_key("component"));
}

#[test]
fn fields_across_keys_are_combined_with_and() {
    let tasks = tasks();
    let matched = query_tasks(&tasks, &params(json!({ "epic": "EPIC-1234", "status": "pending" })));
    assert_eq!(ids(&matched), vec![1]);
}

#[test]
fn comma_values_are_combined_with_or() {
    let tasks = tasks();
    let matched = query_tasks(&tasks, &params(json!({ "status": "pending,done" })));
    assert_eq!(ids(&matched), vec![1, 3, 4]);

    let matched = query_tasks(&tasks, &params(json!({ "sprint": "S1, S2" })));
    assert_eq!(ids(&matched), vec![1, 2]);
}

#[test]
fn status_match_ignores_case() {
    let tasks = tasks();
    let matched = query_tasks(&tasks, &params(json!({ "status": "IN-PROGRESS" })));
    assert_eq!(ids(&matched), vec![2]);
}

#[test]
fn single_custom_value_matches_substring_but_comma_list_is_exact() {
    let tasks = tasks();
    let matched = query_tasks(&tasks, &params(json!({ "epic": "EPIC-1" })));
    assert_eq!(ids(&matched), vec![1, 2]);

    let matched = query_tasks(&tasks, &params(json!({ "epic": "EPIC-1,EPIC-9" })));
    assert_eq!(ids(&matched), vec![3]);
}

#[test]
fn empty_custom_values_never_match() {
    let tasks = tasks();
    let matched = query_tasks(&tasks, &params(json!({ "epic": "" })));
    assert!(matched.is_empty());
}

#[test]
fn numeric_filter_matches_coerced_value() {
    let tasks = tasks();
    let matched = query_tasks(&tasks, &params(json!({ "points": 5 })));
    assert_eq!(ids(&matched), vec![3]);
}

#[test]
fn query_only_and_null_filters_are_ignored() {
    let tasks = tasks();
    let matched = query_tasks(
        &tasks,
        &params(json!({ "tag": "master", "withSubtasks": true, "epic": null })),
    );
    assert_eq!(matched.len(), tasks.len());

    let translated = translate(&params(json!({ "tag": "master", "epic": "E" })));
    assert!(translated.core_fields.contains_key("tag"));
    assert!(translated.custom_fields.contains_key("epic"));
}

#[test]
fn custom_field_names_include_subtasks_in_first_seen_order() {
    let names = extract_custom_field_names(&tasks());
    assert_eq!(names, vec!["component", "epic", "sprint", "points", "owner"]);
}

#[test]
fn validation_warns_on_unknown_fields_and_suggests() {
    let available = extract_custom_field_names(&tasks());
    let result = validate_query_parameters(&params(json!({ "epc": "E", "status": "done" })), &available);
    assert!(result.valid);
    assert_eq!(result.warnings, vec!["Custom field \"epc\" is not used by any task"]);
    assert_eq!(result.suggestions.len(), 1);
    assert_eq!(result.suggestions[0].field, "epc");
    assert_eq!(result.suggestions[0].suggestion, "epic");
}

#[test]
fn validation_rejects_malformed_names() {
    let result = validate_query_parameters(&params(json!({ "2fast": "yes" })), &[]);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("2fast"));
}
