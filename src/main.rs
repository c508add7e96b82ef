//! Task Fields MCP Server
//!
//! Custom field queries, fuzzy search and subtask integrity checks over a
//! JSON task file, served over MCP stdio or run from the command line.

use anyhow::Result;
use clap::Parser;
use rmcp::{
    ErrorData, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Content, InitializeResult, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities,
    },
    service::RequestContext,
    transport::io::stdio,
};
use serde_json::{Value, json};
use std::fs::OpenOptions;
use std::sync::Arc;
use task_fields_mcp::cli::{Cli, Command, migrate, run_tool_command};
use task_fields_mcp::config::{Config, ConfigLoader, ConfigPaths};
use task_fields_mcp::error::ToolError;
use task_fields_mcp::format::OutputFormat;
use task_fields_mcp::store::TaskStore;
use task_fields_mcp::tools::ToolHandler;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// MCP server handler.
#[derive(Clone)]
struct TaskFieldsServer {
    tool_handler: Arc<ToolHandler>,
}

const INSTRUCTIONS: &str = "\
Query tasks by core and custom fields. list_custom_fields() shows the fields in use; \
list_tasks(epic=\"EPIC-1\", status=\"pending,in-progress\") filters; search_tasks(query) fuzzy matches; \
check_integrity() reports subtask problems.";

impl ServerHandler for TaskFieldsServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: Default::default(),
            server_info: rmcp::model::Implementation {
                name: "task-fields-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tool_handler.get_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let tool_name = request.name.clone();
        let start = std::time::Instant::now();

        let args = Value::Object(request.arguments.unwrap_or_default());
        match self.tool_handler.call_tool(&tool_name, args) {
            Ok(result) => {
                let elapsed = start.elapsed();
                debug!(tool = %tool_name, duration_ms = elapsed.as_millis() as u64, "Tool call succeeded");

                let text = match result.get("format").and_then(Value::as_str) {
                    Some("markdown") => result
                        .get("content")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    _ => result.to_string(),
                };
                Ok(CallToolResult {
                    content: vec![Content::text(text)],
                    is_error: None,
                    meta: None,
                    structured_content: None,
                })
            }
            Err(e) => {
                let elapsed = start.elapsed();
                let tool_err = ToolError::from(e);
                warn!(
                    tool = %tool_name,
                    error_code = ?tool_err.code,
                    error_message = %tool_err.message,
                    duration_ms = elapsed.as_millis() as u64,
                    "Tool call failed"
                );
                let error_json = serde_json::to_string(&tool_err)
                    .unwrap_or_else(|_| json!({ "error": tool_err.to_string() }).to_string());
                Ok(CallToolResult {
                    content: vec![Content::text(error_json)],
                    is_error: Some(true),
                    meta: None,
                    structured_content: None,
                })
            }
        }
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match cli.log.as_str() {
        "0" | "off" => {}
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            let file = OpenOptions::new().create(true).append(true).open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut paths = ConfigPaths::discover();
    if let Some(config_path) = &cli.config {
        paths = paths.with_config_file(config_path);
    }
    let mut loader = ConfigLoader::load_with_paths(paths)?;

    let config = loader.config_mut();
    if let Some(file) = &cli.file {
        config.storage.tasks_path = file.into();
    }
    if let Some(tag) = &cli.tag {
        config.storage.default_tag = tag.clone();
    }
    if let Some(format) = cli.format.as_deref() {
        match OutputFormat::parse(format) {
            Some(format) => config.output.default_format = format,
            None => warn!(format, "Unknown output format, keeping configured default"),
        }
    }
    let config = loader.into_config();

    let store = TaskStore::open(&config.storage.tasks_path)
        .with_log_migrations(config.storage.log_migrations);

    match &cli.command {
        Some(Command::Migrate(args)) => migrate::run_migrate(&store, args)?,
        Some(Command::Serve) | None => run_server(store, config).await?,
        Some(command) => {
            let handler = ToolHandler::new(store, config);
            run_tool_command(&handler, &cli, command)?;
        }
    }

    Ok(())
}

/// Run the MCP server
async fn run_server(store: TaskStore, config: Config) -> Result<()> {
    info!(
        "Starting Task Fields MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Task file: {:?}", store.path());
    info!("Default tag: {}", config.storage.default_tag);

    let server = TaskFieldsServer {
        tool_handler: Arc::new(ToolHandler::new(store, config)),
    };

    info!("Server ready, listening on stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
