//! CLI command definitions for task-fields
//!
//! Query commands build the same arguments an MCP client would send and run
//! them through [`ToolHandler`], so both surfaces behave identically.

pub mod list;
pub mod migrate;
pub mod set;

use crate::tools::ToolHandler;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use list::ListArgs;
use migrate::MigrateArgs;
use serde_json::{Map, Value};
use set::SetArgs;

/// Custom field query and compatibility tools for JSON task files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to the task file (overrides config)
    #[arg(short, long, global = true)]
    pub file: Option<String>,

    /// Tag to operate on (overrides config)
    #[arg(short, long, global = true)]
    pub tag: Option<String>,

    /// Output format: json or markdown (overrides config)
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the MCP server (default if no subcommand given)
    Serve,

    /// List tasks filtered by core and custom fields
    List(ListArgs),

    /// Fuzzy search tasks
    Search(SearchArgs),

    /// Show custom fields in use
    Fields,

    /// Report subtask integrity problems
    Check(CheckArgs),

    /// Normalize the task file (legacy format, customFields, parentTaskId)
    Migrate(MigrateArgs),

    /// Set or remove custom fields on a task or subtask
    Set(SetArgs),
}

/// Arguments for the search command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to search for
    pub query: String,

    /// Maximum number of results
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Match threshold (0.0 exact .. 1.0 anything)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Treat the query as a prompt and bucket tasks by relevance
    #[arg(long)]
    pub relevant: bool,
}

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Repair the file before reporting
    #[arg(long)]
    pub fix: bool,
}

/// Run a query command through the tool handler and print the result.
pub fn run_tool_command(handler: &ToolHandler, cli: &Cli, command: &Command) -> Result<()> {
    let (tool, mut args) = match command {
        Command::List(list) => ("list_tasks", list.to_arguments()?),
        Command::Search(search) if search.relevant => {
            let mut args = Map::new();
            args.insert("prompt".into(), Value::String(search.query.clone()));
            if let Some(limit) = search.limit {
                args.insert("max_results".into(), limit.into());
            }
            ("find_relevant_tasks", args)
        }
        Command::Search(search) => {
            let mut args = Map::new();
            args.insert("query".into(), Value::String(search.query.clone()));
            if let Some(limit) = search.limit {
                args.insert("limit".into(), limit.into());
            }
            if let Some(threshold) = search.threshold {
                args.insert("threshold".into(), threshold.into());
            }
            ("search_tasks", args)
        }
        Command::Fields => ("list_custom_fields", Map::new()),
        Command::Check(check) => {
            let mut args = Map::new();
            args.insert("fix".into(), Value::Bool(check.fix));
            ("check_integrity", args)
        }
        Command::Set(set) => ("set_custom_fields", set.to_arguments()?),
        Command::Serve | Command::Migrate(_) => return Ok(()),
    };

    // check_integrity treats a missing tag as "all tags", so only forward an
    // explicit one. Format comes from the merged config.
    if let Some(tag) = &cli.tag {
        args.insert("tag".into(), Value::String(tag.clone()));
    }

    let result = handler.call_tool(tool, Value::Object(args))?;
    print_result(&result)
}

fn print_result(result: &Value) -> Result<()> {
    if result.get("format").and_then(Value::as_str) == Some("markdown") {
        print!("{}", result.get("content").and_then(Value::as_str).unwrap_or_default());
    } else {
        println!("{}", serde_json::to_string_pretty(result)?);
    }
    Ok(())
}
