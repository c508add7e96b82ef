//! Integration tests for the MCP tool handler: every tool called the way a
//! client would, against a temporary task file.

use serde_json::{Value, json};
use task_fields_mcp::config::Config;
use task_fields_mcp::error::{ErrorCode, ToolError};
use task_fields_mcp::store::TaskStore;
use task_fields_mcp::tools::ToolHandler;
use tempfile::TempDir;

fn setup() -> (TempDir, ToolHandler) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let data = json!({
        "master": {
            "tasks": [
                {
                    "id": 1, "title": "Login form", "status": "pending",
                    "description": "User authentication",
                    "customFields": { "epic": "EPIC-1234", "component": "auth" },
                    "subtasks": [{ "id": 1, "title": "Markup", "parentTaskId": 1 }]
                },
                {
                    "id": 2, "title": "Signup flow", "status": "in-progress",
                    "customFields": { "epic": "EPIC-5678", "component": "auth" }
                },
                { "id": 3, "title": "Billing page", "status": "done" }
            ]
        },
        "sandbox": {
            "tasks": [
                { "id": 1, "title": "Scratch", "subtasks": [{ "id": 1, "title": "s", "parentTaskId": 8 }] }
            ]
        }
    });
    std::fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();
    let handler = ToolHandler::new(TaskStore::open(path), Config::default());
    (dir, handler)
}

fn call(handler: &ToolHandler, name: &str, args: Value) -> Value {
    handler.call_tool(name, args).unwrap()
}

fn call_err(handler: &ToolHandler, name: &str, args: Value) -> ToolError {
    ToolError::from(handler.call_tool(name, args).unwrap_err())
}

fn task_ids(result: &Value) -> Vec<u64> {
    result["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_u64().unwrap())
        .collect()
}

#[test]
fn all_tools_are_listed() {
    let (_dir, handler) = setup();
    let names: Vec<String> = handler.get_tools().iter().map(|t| t.name.to_string()).collect();
    for expected in [
        "list_tasks",
        "search_tasks",
        "find_relevant_tasks",
        "list_custom_fields",
        "set_custom_fields",
        "check_integrity",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing tool {}", expected);
    }
}

#[test]
fn list_tasks_filters_by_custom_and_core_fields() {
    let (_dir, handler) = setup();
    let result = call(&handler, "list_tasks", json!({ "component": "auth", "status": "pending,in-progress" }));
    assert_eq!(task_ids(&result), vec![1, 2]);
    assert_eq!(result["count"], 2);
    assert_eq!(result["tag"], "master");

    let result = call(&handler, "list_tasks", json!({ "epic": "EPIC-5678" }));
    assert_eq!(task_ids(&result), vec![2]);
}

#[test]
fn list_tasks_warns_about_unknown_fields() {
    let (_dir, handler) = setup();
    let result = call(&handler, "list_tasks", json!({ "epik": "EPIC-1234" }));
    assert_eq!(task_ids(&result), Vec::<u64>::new());
    assert_eq!(result["warnings"][0], "Custom field \"epik\" is not used by any task");
    assert_eq!(result["suggestions"][0]["suggestion"], "epic");
}

#[test]
fn list_tasks_rejects_malformed_field_names() {
    let (_dir, handler) = setup();
    let err = call_err(&handler, "list_tasks", json!({ "bad name": "x" }));
    assert_eq!(err.code, ErrorCode::InvalidQuery);
    assert!(err.message.contains("bad name"));
}

#[test]
fn list_tasks_markdown_format() {
    let (_dir, handler) = setup();
    let result = call(&handler, "list_tasks", json!({ "epic": "EPIC-1234", "format": "markdown" }));
    assert_eq!(result["format"], "markdown");
    assert!(result["content"].as_str().unwrap().contains("Login form"));
}

#[test]
fn unknown_tag_is_reported() {
    let (_dir, handler) = setup();
    let err = call_err(&handler, "list_tasks", json!({ "tag": "missing" }));
    assert_eq!(err.code, ErrorCode::TagNotFound);
}

#[test]
fn search_tasks_returns_ranked_results() {
    let (_dir, handler) = setup();
    let result = call(&handler, "search_tasks", json!({ "query": "EPIC-5678" }));
    assert_eq!(result["result_count"], 1);
    assert_eq!(result["results"][0]["task"]["id"], 2);
}

#[test]
fn search_tasks_validates_arguments() {
    let (_dir, handler) = setup();
    assert_eq!(call_err(&handler, "search_tasks", json!({})).code, ErrorCode::MissingRequiredField);
    let err = call_err(&handler, "search_tasks", json!({ "query": "x", "threshold": 2.0 }));
    assert_eq!(err.code, ErrorCode::InvalidFieldValue);
    assert_eq!(err.field.as_deref(), Some("threshold"));
}

#[test]
fn find_relevant_tasks_returns_buckets() {
    let (_dir, handler) = setup();
    let result = call(&handler, "find_relevant_tasks", json!({ "prompt": "billing page" }));
    assert_eq!(result["high"][0]["task"]["id"], 3);
    assert_eq!(result["taskIds"][0], 3);
}

#[test]
fn list_custom_fields_reports_usage() {
    let (_dir, handler) = setup();
    let result = call(&handler, "list_custom_fields", json!({}));
    let fields = result["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0]["name"], "component");
    assert_eq!(fields[0]["taskCount"], 2);
    assert_eq!(fields[1]["name"], "epic");
    assert_eq!(fields[1]["sampleValues"], json!(["EPIC-1234", "EPIC-5678"]));
}

#[test]
fn set_custom_fields_round_trips_through_list() {
    let (_dir, handler) = setup();
    let result = call(
        &handler,
        "set_custom_fields",
        json!({ "target": 3, "set": { "epic": "EPIC-9", "points": 2 } }),
    );
    assert_eq!(result["target"], "3");
    assert_eq!(result["customFields"], json!({ "epic": "EPIC-9", "points": "2" }));

    let listed = call(&handler, "list_tasks", json!({ "points": "2" }));
    assert_eq!(task_ids(&listed), vec![3]);
}

#[test]
fn set_custom_fields_errors() {
    let (_dir, handler) = setup();
    let err = call_err(&handler, "set_custom_fields", json!({ "target": 1, "set": { "title": "x" } }));
    assert_eq!(err.code, ErrorCode::InvalidFieldName);

    let err = call_err(&handler, "set_custom_fields", json!({ "target": "1.7", "set": { "a": "b" } }));
    assert_eq!(err.code, ErrorCode::SubtaskNotFound);

    let err = call_err(&handler, "set_custom_fields", json!({ "target": "x.y", "set": { "a": "b" } }));
    assert_eq!(err.code, ErrorCode::InvalidFieldValue);
    assert_eq!(err.field.as_deref(), Some("target"));

    let err = call_err(&handler, "set_custom_fields", json!({ "target": 1 }));
    assert_eq!(err.code, ErrorCode::InvalidFieldValue);

    let err = call_err(&handler, "set_custom_fields", json!({ "set": { "a": "b" } }));
    assert_eq!(err.code, ErrorCode::MissingRequiredField);
}

#[test]
fn check_integrity_covers_all_tags_and_fixes() {
    let (_dir, handler) = setup();
    let result = call(&handler, "check_integrity", json!({}));
    assert_eq!(result["healthy"], false);
    assert_eq!(result["fixed"], false);
    assert_eq!(result["tags"].as_array().unwrap().len(), 2);

    let result = call(&handler, "check_integrity", json!({ "tag": "master" }));
    assert_eq!(result["healthy"], true);

    let result = call(&handler, "check_integrity", json!({ "fix": true }));
    assert_eq!(result["fixed"], true);
    assert_eq!(result["healthy"], true);
}

#[test]
fn unknown_tool_is_an_error() {
    let (_dir, handler) = setup();
    assert_eq!(call_err(&handler, "nope", json!({})).code, ErrorCode::UnknownTool);
}
