//! Fuzzy task search over core and custom fields.
//!
//! [`TaskSearch`] indexes a task slice with the weighted keys from
//! [`generate_search_keys`] and scores each task with a [`FuzzyPattern`].
//! Lower scores are better.

mod fuzzy;
mod keys;
mod relevance;

pub use fuzzy::{FuzzyPattern, MAX_CHUNK_LEN};
pub use keys::{
    CORE_SEARCH_FIELDS, CUSTOM_FIELD_PREFIX, DEPENDENCY_TITLES_KEY, SearchKey,
    discover_custom_field_names, generate_search_keys, weight_for,
};
pub use relevance::{RelevanceOptions, RelevanceResult, find_relevant_tasks};

use crate::types::{DependencyRef, Task};
use serde::Serialize;

/// Default match threshold for general search.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Floor applied to a zero key score before it enters the geometric mean.
const SCORE_EPSILON: f64 = f64::EPSILON;

/// A task that matched a query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit<'a> {
    pub task: &'a Task,
    pub score: f64,
    pub matched_keys: Vec<String>,
}

/// Fuzzy index over a borrowed task slice.
#[derive(Debug, Clone)]
pub struct TaskSearch<'a> {
    tasks: &'a [Task],
    keys: Vec<SearchKey>,
    threshold: f64,
}

impl<'a> TaskSearch<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        Self {
            tasks,
            keys: generate_search_keys(tasks),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Also search the titles of each task's dependencies.
    pub fn with_dependency_titles(mut self) -> Self {
        if !self.keys.iter().any(|k| k.name == DEPENDENCY_TITLES_KEY) {
            let at = CORE_SEARCH_FIELDS.len().min(self.keys.len());
            self.keys.insert(
                at,
                SearchKey {
                    name: DEPENDENCY_TITLES_KEY.to_string(),
                    weight: weight_for(DEPENDENCY_TITLES_KEY),
                },
            );
        }
        self
    }

    pub fn keys(&self) -> &[SearchKey] {
        &self.keys
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Tasks matching `query`, best first; ties keep input order.
    ///
    /// A blank query matches nothing.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<SearchHit<'a>> {
        let Some(pattern) = FuzzyPattern::new(query) else {
            return Vec::new();
        };

        let mut hits: Vec<SearchHit<'a>> = self
            .tasks
            .iter()
            .filter_map(|task| self.score_task(task, &pattern))
            .collect();

        // `sort_by` is stable, so equal scores keep input order.
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        if let Some(limit) = limit {
            hits.truncate(limit);
        }
        hits
    }

    fn score_task(&self, task: &'a Task, pattern: &FuzzyPattern) -> Option<SearchHit<'a>> {
        let mut matched_keys = Vec::new();
        let mut weighted_log_sum = 0.0;
        let mut weight_sum = 0.0;

        for key in &self.keys {
            let Some(text) = self.key_text(task, key) else {
                continue;
            };
            let score = pattern.score(&text);
            if score > self.threshold {
                continue;
            }
            weighted_log_sum += key.weight * score.max(SCORE_EPSILON).ln();
            weight_sum += key.weight;
            matched_keys.push(key.name.clone());
        }

        if matched_keys.is_empty() {
            return None;
        }
        let score = if weight_sum > 0.0 {
            (weighted_log_sum / weight_sum).exp()
        } else {
            0.0
        };
        Some(SearchHit {
            task,
            score,
            matched_keys,
        })
    }

    fn key_text(&self, task: &Task, key: &SearchKey) -> Option<String> {
        let text = match key.name.as_str() {
            "title" => Some(task.title.clone()),
            "description" => task.description.clone(),
            "details" => task.details.clone(),
            DEPENDENCY_TITLES_KEY => Some(self.dependency_titles(task)),
            _ => key
                .custom_field()
                .and_then(|field| task.custom_fields.get(field).cloned()),
        };
        text.filter(|t| !t.is_empty())
    }

    fn dependency_titles(&self, task: &Task) -> String {
        task.dependencies
            .iter()
            .filter_map(|dep| match dep {
                DependencyRef::Task(id) => self.tasks.iter().find(|t| t.id == *id),
                DependencyRef::Path(_) => None,
            })
            .map(|t| t.title.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
