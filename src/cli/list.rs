//! `list` command: core flags plus free-form custom field filters.

use anyhow::{Result, bail};
use clap::Args;
use serde_json::{Map, Value};

/// Arguments for the list command.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Status or comma-separated statuses
    #[arg(short, long)]
    pub status: Option<String>,

    /// Priority (high, medium, low)
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Include subtasks in the output
    #[arg(long)]
    pub with_subtasks: bool,

    /// Custom field filters: `--epic EPIC-1234`, `--sprint=S1,S2`
    #[arg(
        value_name = "FILTERS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    pub filters: Vec<String>,
}

impl ListArgs {
    /// Tool arguments for `list_tasks`.
    pub fn to_arguments(&self) -> Result<Map<String, Value>> {
        let mut args = parse_field_filters(&self.filters)?;
        if let Some(status) = &self.status {
            args.insert("status".to_string(), Value::String(status.clone()));
        }
        if let Some(priority) = &self.priority {
            args.insert("priority".to_string(), Value::String(priority.clone()));
        }
        if self.with_subtasks {
            args.insert("withSubtasks".to_string(), Value::Bool(true));
        }
        Ok(args)
    }
}

/// Global flags that clap cannot see once the filter list has started.
const GLOBAL_FLAGS: &[(&str, Option<char>)] = &[
    ("config", Some('c')),
    ("file", Some('f')),
    ("tag", Some('t')),
    ("format", None),
    ("verbose", Some('v')),
    ("log", Some('l')),
];

/// Parse `--name value` and `--name=value` pairs.
///
/// A flag with no value (followed by another flag or the end) becomes
/// `true`. Names are kept exactly as written so they classify the same way
/// as MCP arguments. The list command's own flags are recognized here too,
/// since clap hands every token after the first filter to this list.
pub fn parse_field_filters(raw: &[String]) -> Result<Map<String, Value>> {
    let mut filters = Map::new();
    let mut iter = raw.iter().peekable();

    while let Some(token) = iter.next() {
        let flag = match token.strip_prefix("--") {
            Some(flag) => flag,
            None => match token.strip_prefix('-') {
                Some("s") => "status",
                Some("p") => "priority",
                Some(short) => {
                    let mut chars = short.chars();
                    let letter = chars.next().filter(|_| chars.next().is_none());
                    if let Some((long, _)) = GLOBAL_FLAGS
                        .iter()
                        .find(|(_, c)| letter.is_some() && *c == letter)
                    {
                        bail!(
                            "'{}' (--{}) must come before the custom field filters",
                            token,
                            long
                        );
                    }
                    bail!("unexpected argument '{}': custom field filters look like --name value", token);
                }
                None => bail!("unexpected argument '{}': custom field filters look like --name value", token),
            },
        };
        if flag.is_empty() {
            continue;
        }

        let (name, value) = match flag.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None if flag == "with-subtasks" => (flag, None),
            None => (flag, iter.next_if(|next| !next.starts_with("--")).cloned()),
        };
        if name.is_empty() {
            bail!("missing field name in '{}'", token);
        }
        if GLOBAL_FLAGS.iter().any(|(long, _)| *long == name) {
            bail!("'--{}' must come before the custom field filters", name);
        }

        if name == "with-subtasks" {
            let enabled = value.as_deref().is_none_or(|v| v != "false");
            filters.insert("withSubtasks".to_string(), Value::Bool(enabled));
            continue;
        }
        let value = value.map_or(Value::Bool(true), Value::String);
        filters.insert(name.to_string(), value);
    }

    Ok(filters)
}
