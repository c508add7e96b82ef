//! Custom field name validation and "did you mean" suggestions.

use crate::fields::{is_reserved_field_name, is_reserved_subtask_field_name};
use regex_lite::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Maximum edit distance accepted by the fuzzy suggestion step.
const MAX_SUGGESTION_DISTANCE: usize = 2;

static FIELD_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_-][A-Za-z0-9_-]*$").expect("field name pattern is a valid regex")
});

/// Why a field name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidReason {
    Reserved,
    Format,
}

/// Outcome of validating a candidate custom field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
            message: None,
        }
    }

    fn reserved(name: &str) -> Self {
        Self {
            valid: false,
            reason: Some(InvalidReason::Reserved),
            message: Some(format!(
                "\"{}\" is a reserved field name and cannot be used as a custom field",
                name
            )),
        }
    }

    fn format(name: &str) -> Self {
        Self {
            valid: false,
            reason: Some(InvalidReason::Format),
            message: Some(format!(
                "Invalid field name \"{}\": must start with a letter, underscore, or hyphen \
                 and contain only letters, numbers, underscores, and hyphens",
                name
            )),
        }
    }
}

/// Validate a task-level custom field name.
pub fn validate_field_name(name: &str) -> FieldValidation {
    validate_with(name, is_reserved_field_name)
}

/// Validate a subtask-level custom field name (`parentTaskId` is reserved too).
pub fn validate_subtask_field_name(name: &str) -> FieldValidation {
    validate_with(name, is_reserved_subtask_field_name)
}

fn validate_with(name: &str, is_reserved: fn(&str) -> bool) -> FieldValidation {
    if is_reserved(name) {
        FieldValidation::reserved(name)
    } else if !FIELD_NAME_PATTERN.is_match(name) {
        FieldValidation::format(name)
    } else {
        FieldValidation::ok()
    }
}

/// Suggest the closest known field name for `input`.
///
/// Candidates are tried in precedence order: case-insensitive exact match,
/// prefix match, substring match, and finally the smallest Levenshtein
/// distance up to 2. Within a step the first candidate in `available` wins.
pub fn suggest_field_name<S: AsRef<str>>(input: &str, available: &[S]) -> Option<String> {
    let needle = input.to_lowercase();
    let lowered: Vec<(String, &str)> = available
        .iter()
        .map(|s| (s.as_ref().to_lowercase(), s.as_ref()))
        .collect();

    if let Some((_, name)) = lowered.iter().find(|(l, _)| *l == needle) {
        return Some(name.to_string());
    }
    if let Some((_, name)) = lowered.iter().find(|(l, _)| l.starts_with(&needle)) {
        return Some(name.to_string());
    }
    if let Some((_, name)) = lowered.iter().find(|(l, _)| l.contains(&needle)) {
        return Some(name.to_string());
    }

    let mut best: Option<(usize, &str)> = None;
    for (l, name) in &lowered {
        let distance = levenshtein(&needle, l);
        if distance > MAX_SUGGESTION_DISTANCE {
            continue;
        }
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, *name));
        }
    }
    best.map(|(_, name)| name.to_string())
}

/// Levenshtein edit distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TASK_FIELDS;

    const AVAILABLE: &[&str] = &["epic", "component", "sprint", "assignee", "taskType", "riskLevel"];

    #[test]
    fn test_reserved_names_rejected() {
        for name in TASK_FIELDS {
            let result = validate_field_name(name);
            assert!(!result.valid, "{name}");
            assert_eq!(result.reason, Some(InvalidReason::Reserved));
        }
    }

    #[test]
    fn test_query_only_names_are_not_reserved() {
        assert!(validate_field_name("file").valid);
        assert!(validate_field_name("tag").valid);
    }

    #[test]
    fn test_parent_task_id_reserved_on_subtasks_only() {
        assert!(validate_field_name("parentTaskId").valid);
        let result = validate_subtask_field_name("parentTaskId");
        assert_eq!(result.reason, Some(InvalidReason::Reserved));
    }

    #[test]
    fn test_format_boundaries() {
        for name in ["123field", "field name", "field@name", "", "field.name", "#tag", "bang!"] {
            let result = validate_field_name(name);
            assert_eq!(result.reason, Some(InvalidReason::Format), "{name:?}");
            assert!(result.message.unwrap().contains(name));
        }
        for name in ["field-name", "_field", "FIELD", "-lead", "sprint2"] {
            assert!(validate_field_name(name).valid, "{name}");
        }
    }

    #[test]
    fn test_suggestion_cascade() {
        assert_eq!(suggest_field_name("EPIC", AVAILABLE).as_deref(), Some("epic"));
        assert_eq!(suggest_field_name("epi", AVAILABLE).as_deref(), Some("epic"));
        assert_eq!(suggest_field_name("sign", AVAILABLE).as_deref(), Some("assignee"));
        assert_eq!(suggest_field_name("epci", AVAILABLE).as_deref(), Some("epic"));
        assert_eq!(suggest_field_name("xyz", AVAILABLE), None);
    }

    #[test]
    fn test_prefix_beats_edit_distance() {
        // "sprint" is one edit away but "spritely" is a prefix match.
        let fields = ["sprint", "spritely"];
        assert_eq!(suggest_field_name("sprit", &fields).as_deref(), Some("spritely"));
    }

    #[test]
    fn test_edit_distance_tie_uses_first_candidate() {
        assert_eq!(suggest_field_name("abzz", &["abzq", "abqz"]).as_deref(), Some("abzq"));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("epci", "epic"), 2);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
