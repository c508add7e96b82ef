//! Fuzzy search tools.

use super::{CallContext, get_f64, get_string, get_usize, make_tool, with_common_properties};
use crate::error::ToolError;
use crate::format::{OutputFormat, format_relevance_markdown, format_search_markdown, markdown_to_json};
use crate::search::{RelevanceOptions, TaskSearch};
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "search_tasks",
            "Fuzzy search over task title, description, details and every custom field value. \
             Tolerates typos. Results are ordered best match first.",
            with_common_properties(json!({
                "query": {
                    "type": "string",
                    "description": "Text to look for"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results (default: search.max_results)"
                },
                "threshold": {
                    "type": "number",
                    "description": "Match threshold from 0.0 (exact) to 1.0 (anything); default from config (0.3)"
                }
            })),
            vec!["query"],
        ),
        make_tool(
            "find_relevant_tasks",
            "Find tasks relevant to a free-text prompt. Returns high/medium/low relevance buckets, \
             tasks in categories the prompt mentions (setup, testing, api, ui, data, auth) and the \
             most recent tasks, plus a combined taskIds list.",
            with_common_properties(json!({
                "prompt": {
                    "type": "string",
                    "description": "Description of the work about to be done"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Cap on the combined task id list (default from config)"
                }
            })),
            vec!["prompt"],
        ),
    ]
}

pub fn search_tasks(ctx: &CallContext<'_>, args: Value) -> Result<Value> {
    let query = get_string(&args, "query").ok_or_else(|| ToolError::missing_field("query"))?;
    let limit = get_usize(&args, "limit").unwrap_or(ctx.config.search.max_results);
    let threshold = get_f64(&args, "threshold").unwrap_or(ctx.config.search.threshold);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ToolError::invalid_value("threshold", "threshold must be between 0.0 and 1.0").into());
    }

    let tasks = ctx.store.tasks_for_tag(&ctx.tag)?;
    let hits = TaskSearch::new(&tasks)
        .with_threshold(threshold)
        .search(&query, Some(limit));

    Ok(match ctx.format {
        OutputFormat::Markdown => markdown_to_json(format_search_markdown(&query, &hits)),
        OutputFormat::Json => json!({
            "query": query,
            "tag": ctx.tag,
            "result_count": hits.len(),
            "results": hits,
        }),
    })
}

pub fn find_relevant_tasks(ctx: &CallContext<'_>, args: Value) -> Result<Value> {
    let prompt = get_string(&args, "prompt").ok_or_else(|| ToolError::missing_field("prompt"))?;
    let options = RelevanceOptions {
        threshold: ctx.config.search.relevance_threshold,
        max_results: get_usize(&args, "max_results").unwrap_or(ctx.config.search.max_results),
        recent_count: ctx.config.search.recent_count,
    };

    let tasks = ctx.store.tasks_for_tag(&ctx.tag)?;
    let result = crate::search::find_relevant_tasks(&tasks, &prompt, &options);

    Ok(match ctx.format {
        OutputFormat::Markdown => markdown_to_json(format_relevance_markdown(&result)),
        OutputFormat::Json => serde_json::to_value(&result)?,
    })
}
