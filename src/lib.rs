//! Task Fields MCP Library
//!
//! Custom field handling for JSON task files: field classification and
//! validation, query translation and filtering, fuzzy search, backward
//! compatibility normalization and subtask integrity checks.

pub mod cli;
pub mod compat;
pub mod config;
pub mod error;
pub mod fields;
pub mod format;
pub mod query;
pub mod search;
pub mod store;
pub mod tools;
pub mod types;
pub mod validation;
