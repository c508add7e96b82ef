//! MCP tool implementations.

pub mod fields;
pub mod integrity;
pub mod search;
pub mod tasks;

use crate::config::Config;
use crate::error::ToolError;
use crate::format::OutputFormat;
use crate::store::TaskStore;
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

/// Tool handler that processes MCP tool calls.
pub struct ToolHandler {
    pub store: TaskStore,
    pub config: Config,
}

/// Shared per-call settings resolved from arguments and configuration.
pub struct CallContext<'a> {
    pub store: &'a TaskStore,
    pub config: &'a Config,
    pub tag: String,
    pub format: OutputFormat,
}

impl ToolHandler {
    pub fn new(store: TaskStore, config: Config) -> Self {
        Self { store, config }
    }

    /// Get all available tools.
    pub fn get_tools(&self) -> Vec<Tool> {
        let mut tools = Vec::new();
        tools.extend(tasks::get_tools());
        tools.extend(search::get_tools());
        tools.extend(fields::get_tools());
        tools.extend(integrity::get_tools());
        tools
    }

    /// Call a tool by name.
    pub fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        let ctx = self.context(&arguments);
        match name {
            "list_tasks" => tasks::list_tasks(&ctx, arguments),
            "search_tasks" => search::search_tasks(&ctx, arguments),
            "find_relevant_tasks" => search::find_relevant_tasks(&ctx, arguments),
            "list_custom_fields" => fields::list_custom_fields(&ctx, arguments),
            "set_custom_fields" => fields::set_custom_fields(&ctx, arguments),
            "check_integrity" => integrity::check_integrity(&ctx, arguments),
            _ => Err(ToolError::unknown_tool(name).into()),
        }
    }

    fn context(&self, args: &Value) -> CallContext<'_> {
        CallContext {
            store: &self.store,
            config: &self.config,
            tag: get_string(args, "tag").unwrap_or_else(|| self.config.storage.default_tag.clone()),
            format: get_string(args, "format")
                .and_then(|f| OutputFormat::parse(&f))
                .unwrap_or(self.config.output.default_format),
        }
    }
}

fn input_schema(properties: Value, required: Vec<&str>, open: bool) -> rmcp::model::JsonObject {
    let mut schema = rmcp::model::JsonObject::from_iter([
        ("type".to_string(), json!("object")),
        ("properties".to_string(), properties),
        ("required".to_string(), json!(required)),
    ]);
    if open {
        schema.insert("additionalProperties".to_string(), json!({ "type": ["string", "number", "boolean"] }));
    }
    schema
}

/// Helper to create a tool definition.
pub fn make_tool(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Tool {
    Tool::new(
        name.to_string(),
        description.to_string(),
        input_schema(properties, required, false),
    )
}

/// Like [`make_tool`], but any extra argument is accepted (custom field filters).
pub fn make_open_tool(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Tool {
    Tool::new(
        name.to_string(),
        description.to_string(),
        input_schema(properties, required, true),
    )
}

/// Common `tag` and `format` properties.
pub fn common_properties() -> serde_json::Map<String, Value> {
    let properties = json!({
        "tag": {
            "type": "string",
            "description": "Tag (task collection) to read (default from config, usually 'master')"
        },
        "format": {
            "type": "string",
            "enum": ["json", "markdown"],
            "description": "Output format (default from config)"
        }
    });
    match properties {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

/// Merge tool specific properties over [`common_properties`].
pub fn with_common_properties(specific: Value) -> Value {
    let mut properties = common_properties();
    if let Value::Object(map) = specific {
        properties.extend(map);
    }
    Value::Object(properties)
}

/// Helper to get a string from arguments.
pub fn get_string(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str().map(String::from))
}

/// Helper to get a non-negative integer from arguments.
pub fn get_usize(args: &Value, key: &str) -> Option<usize> {
    args.get(key).and_then(|v| v.as_u64()).map(|n| n as usize)
}

/// Helper to get an f64 from arguments.
pub fn get_f64(args: &Value, key: &str) -> Option<f64> {
    args.get(key).and_then(|v| v.as_f64())
}

/// Helper to get a bool from arguments.
pub fn get_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(|v| v.as_bool())
}

/// Helper to get a string array from arguments.
pub fn get_string_array(args: &Value, key: &str) -> Option<Vec<String>> {
    args.get(key).and_then(|v| {
        v.as_array().map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
    })
}
