//! `set` command: edit custom fields from the shell.

use anyhow::{Result, anyhow};
use clap::Args;
use serde_json::{Map, Value, json};

/// Arguments for the set command.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Task id (`12`) or subtask id (`12.3`)
    pub target: String,

    /// Assignments like `epic=EPIC-1234`
    #[arg(value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,

    /// Remove a field (repeatable)
    #[arg(long, value_name = "KEY")]
    pub unset: Vec<String>,

    /// Clear existing custom fields before applying assignments
    #[arg(long)]
    pub replace: bool,
}

impl SetArgs {
    /// Tool arguments for `set_custom_fields`.
    pub fn to_arguments(&self) -> Result<Map<String, Value>> {
        let mut set = Map::new();
        for assignment in &self.assignments {
            let (key, value) = parse_assignment(assignment)?;
            set.insert(key, Value::String(value));
        }
        let args = json!({
            "target": self.target,
            "set": set,
            "unset": self.unset,
            "replace": self.replace,
        });
        match args {
            Value::Object(map) => Ok(map),
            _ => Err(anyhow!("failed to build arguments")),
        }
    }
}

/// Split `key=value`. The value may itself contain `=`; an empty value is
/// allowed and stored as an empty string.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("missing field name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("epic=E-1").unwrap(), ("epic".into(), "E-1".into()));
        assert_eq!(parse_assignment("url=a=b").unwrap(), ("url".into(), "a=b".into()));
        assert_eq!(parse_assignment("note=").unwrap(), ("note".into(), String::new()));
        assert!(parse_assignment("epic").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_to_arguments() {
        let args = SetArgs {
            target: "3.1".into(),
            assignments: vec!["epic=E-1".into()],
            unset: vec!["sprint".into()],
            replace: false,
        };
        let map = args.to_arguments().unwrap();
        assert_eq!(map["target"], "3.1");
        assert_eq!(map["set"]["epic"], "E-1");
        assert_eq!(map["unset"][0], "sprint");
    }
}
