//! Weighted search keys for the fuzzy matcher.

use crate::query::extract_custom_field_names;
use crate::types::Task;
use serde::Serialize;

/// Core text attributes searched on every task, in key order.
pub const CORE_SEARCH_FIELDS: [&str; 3] = ["title", "description", "details"];

/// Synthetic key holding the titles of a task's dependencies.
pub const DEPENDENCY_TITLES_KEY: &str = "dependencyTitles";

/// Prefix that turns a custom field name into a key path.
pub const CUSTOM_FIELD_PREFIX: &str = "customFields.";

const DEFAULT_WEIGHT: f64 = 1.0;

/// One searchable attribute and its relative importance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchKey {
    pub name: String,
    pub weight: f64,
}

impl SearchKey {
    fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let weight = weight_for(&name);
        Self { name, weight }
    }

    /// The custom field this key reads, if it is a `customFields.<name>` key.
    pub fn custom_field(&self) -> Option<&str> {
        self.name.strip_prefix(CUSTOM_FIELD_PREFIX)
    }
}

/// Weight for a field name. Accepts bare names and `customFields.<name>`.
pub fn weight_for(field: &str) -> f64 {
    let field = field.strip_prefix(CUSTOM_FIELD_PREFIX).unwrap_or(field);
    match field {
        "title" => 2.0,
        "description" => 1.5,
        "details" => 1.0,
        DEPENDENCY_TITLES_KEY => 0.5,
        "epic" => 1.8,
        "component" => 1.5,
        "taskType" => 1.6,
        "assignee" => 1.2,
        "sprint" => 1.4,
        _ => DEFAULT_WEIGHT,
    }
}

/// Custom field names present on tasks or subtasks, unique, first-seen order.
pub fn discover_custom_field_names(tasks: &[Task]) -> Vec<String> {
    extract_custom_field_names(tasks)
}

/// Core keys followed by one `customFields.<name>` key per discovered field.
pub fn generate_search_keys(tasks: &[Task]) -> Vec<SearchKey> {
    CORE_SEARCH_FIELDS
        .iter()
        .map(|name| SearchKey::new(*name))
        .chain(
            discover_custom_field_names(tasks)
                .into_iter()
                .map(|name| SearchKey::new(format!("{}{}", CUSTOM_FIELD_PREFIX, name))),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_table() {
        assert_eq!(weight_for("title"), 2.0);
        assert_eq!(weight_for("dependencyTitles"), 0.5);
        assert_eq!(weight_for("epic"), 1.8);
        assert_eq!(weight_for("customFields.taskType"), 1.6);
        assert_eq!(weight_for("riskLevel"), 1.0);
    }

    #[test]
    fn test_core_keys_only_without_custom_fields() {
        let keys = generate_search_keys(&[Task::new(1, "Plain")]);
        let names: Vec<_> = keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["title", "description", "details"]);
        let weights: Vec<_> = keys.iter().map(|k| k.weight).collect();
        assert_eq!(weights, vec![2.0, 1.5, 1.0]);
    }

    #[test]
    fn test_fifty_custom_fields_give_fifty_three_keys() {
        let mut task = Task::new(1, "Wide");
        for i in 0..50 {
            task.custom_fields.insert(format!("field{}", i), "v".to_string());
        }
        let keys = generate_search_keys(&[task]);
        assert_eq!(keys.len(), 53);
        assert!(keys[3..].iter().all(|k| k.custom_field().is_some() && k.weight == 1.0));
    }

    #[test]
    fn test_known_custom_field_keeps_curated_weight() {
        let keys = generate_search_keys(&[Task::new(1, "T").with_custom_field("sprint", "S1")]);
        assert_eq!(keys[3].name, "customFields.sprint");
        assert_eq!(keys[3].custom_field(), Some("sprint"));
        assert_eq!(keys[3].weight, 1.4);
    }
}
