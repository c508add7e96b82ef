//! Subtask integrity check and repair.

use super::{CallContext, get_bool, get_string, make_tool};
use crate::format::{OutputFormat, format_integrity_markdown, markdown_to_json};
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};
use tracing::info;

pub fn get_tools() -> Vec<Tool> {
    vec![make_tool(
        "check_integrity",
        "Check subtask structure in the task file: missing or wrong parentTaskId, duplicate or \
         missing subtask ids and orphaned subtasks. With fix=true the file is normalized first \
         (legacy format migrated, customFields added, parentTaskId corrected).",
        json!({
            "tag": {
                "type": "string",
                "description": "Only report this tag (default: all tags)"
            },
            "fix": {
                "type": "boolean",
                "description": "Repair the file before reporting (default: false)"
            },
            "format": {
                "type": "string",
                "enum": ["json", "markdown"],
                "description": "Output format (default from config)"
            }
        }),
        vec![],
    )]
}

pub fn check_integrity(ctx: &CallContext<'_>, args: Value) -> Result<Value> {
    // Unlike the other tools, no tag means every tag.
    let tag = get_string(&args, "tag");
    let fix = get_bool(&args, "fix").unwrap_or(false);

    let migration = if fix {
        let report = ctx.store.migrate_file(false)?;
        info!(changed = report.changed, "Integrity fix applied");
        Some(report)
    } else {
        None
    };
    let tags = ctx.store.check(tag.as_deref())?;
    let healthy = tags.iter().all(|t| t.is_healthy());

    Ok(match ctx.format {
        OutputFormat::Markdown => markdown_to_json(format_integrity_markdown(&tags)),
        OutputFormat::Json => json!({
            "healthy": healthy,
            "fixed": migration.as_ref().is_some_and(|m| m.written),
            "tags": tags,
        }),
    })
}
