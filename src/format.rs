//! Output formatting utilities for markdown and JSON.

use crate::search::{RelevanceResult, SearchHit};
use crate::store::TagIntegrity;
use crate::types::{Subtask, Task};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Output format for query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

fn custom_fields_inline(fields: &crate::types::CustomFields) -> String {
    if fields.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!(" [{}]", pairs.join(", "))
}

fn format_subtask_short(parent: u64, subtask: &Subtask) -> String {
    format!(
        "  - `{}` {} ({}){}\n",
        subtask.display_id(parent),
        subtask.title,
        subtask.status,
        custom_fields_inline(&subtask.custom_fields)
    )
}

/// Format a task list as markdown, one line per task.
pub fn format_tasks_markdown(tasks: &[Task], with_subtasks: bool) -> String {
    let mut md = format!("# Tasks ({})\n\n", tasks.len());

    for task in tasks {
        let priority = match task.priority {
            Some(crate::types::TaskPriority::High) => "!!! ",
            _ => "",
        };
        md.push_str(&format!(
            "- {}`{}` {} ({}){}\n",
            priority,
            task.id,
            task.title,
            task.status,
            custom_fields_inline(&task.custom_fields)
        ));
        if with_subtasks {
            for subtask in &task.subtasks {
                md.push_str(&format_subtask_short(task.id, subtask));
            }
        }
    }

    md
}

/// Task list as JSON. Subtasks are dropped unless requested.
pub fn tasks_to_json(tasks: &[Task], with_subtasks: bool) -> Value {
    let tasks: Vec<Value> = tasks
        .iter()
        .map(|task| {
            let mut value = serde_json::to_value(task).unwrap_or(Value::Null);
            if !with_subtasks && let Some(map) = value.as_object_mut() {
                map.remove("subtasks");
            }
            value
        })
        .collect();
    json!({ "count": tasks.len(), "tasks": tasks })
}

pub fn format_search_markdown(query: &str, hits: &[SearchHit<'_>]) -> String {
    let mut md = format!("# Search: {} ({})\n\n", query, hits.len());
    for hit in hits {
        md.push_str(&format!(
            "- `{}` {} (score {:.3}; {})\n",
            hit.task.id,
            hit.task.title,
            hit.score,
            hit.matched_keys.join(", ")
        ));
    }
    md
}

pub fn format_relevance_markdown(result: &RelevanceResult<'_>) -> String {
    let mut md = String::from("# Relevant tasks\n\n");
    let buckets = [("High", &result.high), ("Medium", &result.medium), ("Low", &result.low)];
    for (label, hits) in buckets {
        if hits.is_empty() {
            continue;
        }
        md.push_str(&format!("## {}\n\n", label));
        for hit in hits {
            md.push_str(&format!("- `{}` {} ({:.3})\n", hit.task.id, hit.task.title, hit.score));
        }
        md.push('\n');
    }
    let fallbacks = [("Category matches", &result.category_matches), ("Recent", &result.recent)];
    for (label, tasks) in fallbacks {
        if tasks.is_empty() {
            continue;
        }
        md.push_str(&format!("## {}\n\n", label));
        for task in tasks {
            md.push_str(&format!("- `{}` {}\n", task.id, task.title));
        }
        md.push('\n');
    }
    md
}

pub fn format_integrity_markdown(tags: &[TagIntegrity]) -> String {
    let mut md = String::from("# Subtask integrity\n\n");
    for tag in tags {
        let summary = &tag.report.summary;
        md.push_str(&format!(
            "## {} ({})\n",
            tag.tag,
            if tag.is_healthy() { "healthy" } else { "issues found" }
        ));
        md.push_str(&format!("- **tasks**: {}\n", summary.total_tasks));
        md.push_str(&format!("- **subtasks**: {}\n", summary.total_subtasks));
        md.push_str(&format!("- **with issues**: {}\n", summary.subtasks_with_issues));
        md.push_str(&format!("- **orphaned**: {}\n", summary.orphaned_subtasks));
        md.push_str(&format!("- **score**: {}\n", summary.integrity_score));
        for issue in &tag.report.issues {
            md.push_str(&format!("  - {}\n", issue));
        }
        md.push('\n');
    }
    md
}

/// Convert markdown to JSON value for uniform response handling.
pub fn markdown_to_json(md: String) -> Value {
    json!({
        "format": "markdown",
        "content": md
    })
}
