//! Custom field discovery and updates.

use super::{CallContext, get_bool, get_string_array, make_tool, with_common_properties};
use crate::error::ToolError;
use crate::format::{OutputFormat, markdown_to_json};
use crate::query::extract_custom_field_names;
use crate::search::weight_for;
use crate::store::{CustomFieldsUpdate, FieldTarget};
use crate::types::{CustomFields, Task};
use anyhow::Result;
use rmcp::model::Tool;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeSet;

/// Distinct values shown per field.
const SAMPLE_VALUES: usize = 5;

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "list_custom_fields",
            "List the custom fields used in a tag, with how many tasks and subtasks use each, \
             sample values and the weight each field gets in fuzzy search.",
            with_common_properties(json!({})),
            vec![],
        ),
        make_tool(
            "set_custom_fields",
            "Set or remove custom fields on a task (\"12\") or subtask (\"12.3\"). Values must be \
             strings, numbers or booleans; null removes a field. Reserved names (id, title, status, \
             ...) and malformed names are rejected.",
            with_common_properties(json!({
                "target": {
                    "type": ["string", "integer"],
                    "description": "Task id or parent.sub subtask id"
                },
                "set": {
                    "type": "object",
                    "description": "Fields to set, e.g. {\"epic\": \"EPIC-1234\", \"points\": 3}"
                },
                "unset": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Field names to remove"
                },
                "replace": {
                    "type": "boolean",
                    "description": "Clear all existing custom fields before applying 'set' (default: false)"
                }
            })),
            vec!["target"],
        ),
    ]
}

/// How one custom field is used across a task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUsage {
    pub name: String,
    pub task_count: usize,
    pub subtask_count: usize,
    pub search_weight: f64,
    pub sample_values: Vec<String>,
}

/// Usage of every custom field, in first-seen order.
pub fn field_usage(tasks: &[Task]) -> Vec<FieldUsage> {
    extract_custom_field_names(tasks)
        .into_iter()
        .map(|name| {
            let uses = |fields: &CustomFields| fields.contains_key(&name);
            let task_count = tasks.iter().filter(|t| uses(&t.custom_fields)).count();
            let subtask_count = tasks
                .iter()
                .flat_map(|t| &t.subtasks)
                .filter(|s| uses(&s.custom_fields))
                .count();
            let values: BTreeSet<&str> = tasks
                .iter()
                .flat_map(|t| std::iter::once(&t.custom_fields).chain(t.subtasks.iter().map(|s| &s.custom_fields)))
                .filter_map(|fields| fields.get(&name).map(String::as_str))
                .filter(|v| !v.is_empty())
                .collect();
            FieldUsage {
                search_weight: weight_for(&name),
                sample_values: values.into_iter().take(SAMPLE_VALUES).map(String::from).collect(),
                task_count,
                subtask_count,
                name,
            }
        })
        .collect()
}

fn format_usage_markdown(tag: &str, usage: &[FieldUsage]) -> String {
    let mut md = format!("# Custom fields in {} ({})\n\n", tag, usage.len());
    for field in usage {
        md.push_str(&format!(
            "- **{}**: {} tasks, {} subtasks, weight {:.1}",
            field.name, field.task_count, field.subtask_count, field.search_weight
        ));
        if !field.sample_values.is_empty() {
            md.push_str(&format!(" (e.g. {})", field.sample_values.join(", ")));
        }
        md.push('\n');
    }
    md
}

pub fn list_custom_fields(ctx: &CallContext<'_>, _args: Value) -> Result<Value> {
    let tasks = ctx.store.tasks_for_tag(&ctx.tag)?;
    let usage = field_usage(&tasks);
    Ok(match ctx.format {
        OutputFormat::Markdown => markdown_to_json(format_usage_markdown(&ctx.tag, &usage)),
        OutputFormat::Json => json!({ "tag": ctx.tag, "fields": usage }),
    })
}

fn parse_target(args: &Value) -> Result<FieldTarget, ToolError> {
    let raw = match args.get("target") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ToolError::missing_field("target")),
    };
    raw.parse().map_err(ToolError::from)
}

pub fn set_custom_fields(ctx: &CallContext<'_>, args: Value) -> Result<Value> {
    let target = parse_target(&args)?;
    let set = match args.get("set") {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(ToolError::invalid_value("set", "set must be an object").into()),
    };
    let update = CustomFieldsUpdate {
        set,
        unset: get_string_array(&args, "unset").unwrap_or_default(),
        replace: get_bool(&args, "replace").unwrap_or(false),
    };
    if update.set.is_empty() && update.unset.is_empty() && !update.replace {
        return Err(ToolError::invalid_value("set", "nothing to change: provide set, unset or replace").into());
    }

    let fields = ctx
        .store
        .update_custom_fields(&ctx.tag, target, &update)
        .map_err(ToolError::from)?;
    Ok(json!({
        "tag": ctx.tag,
        "target": target.to_string(),
        "customFields": fields,
    }))
}
