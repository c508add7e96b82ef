//! Task listing with core and custom field filters.

use super::{CallContext, get_bool, make_open_tool, with_common_properties};
use crate::error::ToolError;
use crate::format::{OutputFormat, format_tasks_markdown, markdown_to_json, tasks_to_json};
use crate::query::{QueryParams, extract_custom_field_names, query_tasks, validate_query_parameters};
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};
use tracing::debug;

/// Arguments that control the response rather than filter tasks.
const RESPONSE_ARGS: &[&str] = &["format"];

pub fn get_tools() -> Vec<Tool> {
    vec![make_open_tool(
        "list_tasks",
        "List tasks, filtered by core fields (status, priority, title, ...) and by any custom field \
         passed as an extra argument (e.g. epic=\"EPIC-1234\"). Comma-separated values match any \
         of the listed values; different fields must all match. Unknown custom field names return \
         warnings with suggestions.",
        with_common_properties(json!({
            "status": {
                "type": "string",
                "description": "Status or comma-separated statuses (pending, in-progress, done, review, deferred, cancelled)"
            },
            "priority": {
                "type": "string",
                "description": "Priority substring (high, medium, low)"
            },
            "withSubtasks": {
                "type": "boolean",
                "description": "Include subtasks in the output (default: false)"
            }
        })),
        vec![],
    )]
}

/// Split tool arguments into query parameters.
pub fn query_params(args: &Value) -> QueryParams {
    let mut params = args.as_object().cloned().unwrap_or_default();
    for key in RESPONSE_ARGS {
        params.remove(*key);
    }
    params
}

pub fn list_tasks(ctx: &CallContext<'_>, args: Value) -> Result<Value> {
    let with_subtasks = get_bool(&args, "withSubtasks").unwrap_or(false);
    let params = query_params(&args);

    let tasks = ctx.store.tasks_for_tag(&ctx.tag)?;
    let available = extract_custom_field_names(&tasks);
    let validation = validate_query_parameters(&params, &available);
    if !validation.valid {
        return Err(ToolError::invalid_query(&validation.errors).into());
    }

    let matched = query_tasks(&tasks, &params);
    debug!(tag = %ctx.tag, total = tasks.len(), matched = matched.len(), "Listed tasks");

    let mut response = match ctx.format {
        OutputFormat::Markdown => markdown_to_json(format_tasks_markdown(&matched, with_subtasks)),
        OutputFormat::Json => tasks_to_json(&matched, with_subtasks),
    };
    if let Some(map) = response.as_object_mut() {
        map.insert("tag".to_string(), json!(ctx.tag));
        if !validation.warnings.is_empty() {
            map.insert("warnings".to_string(), json!(validation.warnings));
        }
        if !validation.suggestions.is_empty() {
            map.insert("suggestions".to_string(), serde_json::to_value(&validation.suggestions)?);
        }
    }
    Ok(response)
}
