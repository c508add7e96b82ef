//! Prompt-to-task relevance bucketing.

use super::{SearchHit, TaskSearch};
use crate::types::Task;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const HIGH_CUTOFF: f64 = 0.25;
const MEDIUM_CUTOFF: f64 = 0.4;
const LOW_CUTOFF: f64 = 0.6;

/// Words shorter than this are not searched on their own.
const MIN_WORD_LEN: usize = 4;

/// Purpose categories recognised in prompts, with the keywords that signal
/// them in both the prompt and the task text.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("setup", &["setup", "install", "configure", "config", "init", "scaffold"]),
    ("testing", &["test", "tests", "testing", "coverage", "e2e"]),
    ("api", &["api", "endpoint", "endpoints", "route", "routes", "rest", "graphql"]),
    ("ui", &["ui", "frontend", "component", "page", "layout", "style"]),
    ("data", &["data", "database", "schema", "model", "migration", "query"]),
    ("auth", &["auth", "login", "authentication", "password", "session", "permission"]),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceOptions {
    pub threshold: f64,
    pub max_results: usize,
    pub recent_count: usize,
}

impl Default for RelevanceOptions {
    fn default() -> Self {
        Self {
            threshold: LOW_CUTOFF,
            max_results: 20,
            recent_count: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceResult<'a> {
    pub high: Vec<SearchHit<'a>>,
    pub medium: Vec<SearchHit<'a>>,
    pub low: Vec<SearchHit<'a>>,
    pub category_matches: Vec<&'a Task>,
    pub recent: Vec<&'a Task>,
    /// High, medium, low, category and recent ids, deduplicated and capped.
    pub task_ids: Vec<u64>,
}

/// Rank tasks by how relevant they are to a free-text prompt.
///
/// The whole prompt and each word longer than three characters are searched
/// separately; a task found more than once keeps its best score. Hits are
/// bucketed high (< 0.25), medium (< 0.4) and low (< 0.6). Tasks mentioning
/// a category named in the prompt and the most recent tasks (highest ids)
/// fill in behind the buckets.
pub fn find_relevant_tasks<'a>(tasks: &'a [Task], prompt: &str, options: &RelevanceOptions) -> RelevanceResult<'a> {
    let search = TaskSearch::new(tasks)
        .with_threshold(options.threshold)
        .with_dependency_titles();

    let mut merged: Vec<SearchHit<'a>> = Vec::new();
    let mut index_by_id: HashMap<u64, usize> = HashMap::new();
    let words = prompt_words(prompt);
    let significant = words.iter().filter(|w| w.chars().count() >= MIN_WORD_LEN);
    let queries = std::iter::once(prompt).chain(significant.map(String::as_str));
    for query in queries {
        for hit in search.search(query, None) {
            match index_by_id.get(&hit.task.id).copied() {
                Some(i) if hit.score < merged[i].score => merged[i] = hit,
                Some(_) => {}
                None => {
                    index_by_id.insert(hit.task.id, merged.len());
                    merged.push(hit);
                }
            }
        }
    }
    merged.sort_by(|a, b| a.score.total_cmp(&b.score));

    let mut result = RelevanceResult::default();
    for hit in merged {
        if hit.score < HIGH_CUTOFF {
            result.high.push(hit);
        } else if hit.score < MEDIUM_CUTOFF {
            result.medium.push(hit);
        } else if hit.score < LOW_CUTOFF {
            result.low.push(hit);
        }
    }

    let mut seen: HashSet<u64> = result
        .high
        .iter()
        .chain(&result.medium)
        .chain(&result.low)
        .map(|hit| hit.task.id)
        .collect();

    let keywords = category_keywords(&words);
    if !keywords.is_empty() {
        for task in tasks {
            if !seen.contains(&task.id) && mentions_any(task, &keywords) {
                seen.insert(task.id);
                result.category_matches.push(task);
            }
        }
    }

    let mut by_recency: Vec<&Task> = tasks.iter().collect();
    by_recency.sort_by(|a, b| b.id.cmp(&a.id));
    result.recent = by_recency
        .into_iter()
        .filter(|task| !seen.contains(&task.id))
        .take(options.recent_count)
        .collect();

    let mut ids = Vec::new();
    let mut emitted = HashSet::new();
    let bucketed = result
        .high
        .iter()
        .chain(&result.medium)
        .chain(&result.low)
        .map(|hit| hit.task.id);
    let fallback = result
        .category_matches
        .iter()
        .chain(&result.recent)
        .map(|task| task.id);
    for id in bucketed.chain(fallback) {
        if emitted.insert(id) {
            ids.push(id);
        }
    }
    ids.truncate(options.max_results);
    result.task_ids = ids;

    result
}

/// Lowercased prompt words, unique, in order.
fn prompt_words(prompt: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    prompt
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

/// Keywords of every category the prompt mentions.
fn category_keywords(words: &[String]) -> Vec<&'static str> {
    CATEGORIES
        .iter()
        .filter(|(name, keywords)| {
            words
                .iter()
                .any(|w| w == name || keywords.contains(&w.as_str()))
        })
        .flat_map(|(_, keywords)| keywords.iter().copied())
        .collect()
}

fn mentions_any(task: &Task, keywords: &[&str]) -> bool {
    let text = [Some(&task.title), task.description.as_ref(), task.details.as_ref()]
        .into_iter()
        .flatten()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| keywords.contains(&word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> Vec<Task> {
        vec![
            Task::new(1, "Initialize repository"),
            Task::new(2, "Design database schema").with_description("Tables for orders"),
            Task::new(3, "Implement checkout flow").with_custom_field("component", "payments"),
            Task::new(4, "Write unit tests").with_description("Cover the data model"),
            Task::new(5, "Polish landing page"),
        ]
    }

    #[test]
    fn test_word_extraction() {
        assert_eq!(
            prompt_words("Fix the DB schema, add tests. Schema again"),
            vec!["fix", "the", "db", "schema", "add", "tests", "again"]
        );
    }

    #[test]
    fn test_word_hits_land_in_high_bucket() {
        let tasks = tasks();
        let result = find_relevant_tasks(&tasks, "update checkout to support coupons", &RelevanceOptions::default());
        assert!(result.high.iter().any(|hit| hit.task.id == 3));
        assert_eq!(result.task_ids.first(), Some(&3));
    }

    #[test]
    fn test_tasks_are_deduplicated() {
        let tasks = tasks();
        let result = find_relevant_tasks(&tasks, "database schema database", &RelevanceOptions::default());
        let unique: HashSet<_> = result.task_ids.iter().collect();
        assert_eq!(unique.len(), result.task_ids.len());
        let bucketed = result.high.iter().chain(&result.medium).chain(&result.low);
        assert_eq!(bucketed.filter(|hit| hit.task.id == 2).count(), 1);
    }

    #[test]
    fn test_category_fallback() {
        let tasks = vec![Task::new(1, "Expose REST endpoint"), Task::new(2, "Polish landing page")];
        let options = RelevanceOptions {
            recent_count: 0,
            ..RelevanceOptions::default()
        };
        // "api" is too short to search on its own but still names a category.
        let result = find_relevant_tasks(&tasks, "api zzzz", &options);
        assert!(result.high.is_empty() && result.medium.is_empty() && result.low.is_empty());
        let ids: Vec<_> = result.category_matches.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(result.task_ids, vec![1]);
    }

    #[test]
    fn test_recent_fallback_and_cap() {
        let tasks = tasks();
        let options = RelevanceOptions {
            max_results: 2,
            recent_count: 3,
            ..RelevanceOptions::default()
        };
        let result = find_relevant_tasks(&tasks, "qqqq", &options);
        let recent: Vec<_> = result.recent.iter().map(|t| t.id).collect();
        assert_eq!(recent, vec![5, 4, 3]);
        assert_eq!(result.task_ids, vec![5, 4]);
    }
}
