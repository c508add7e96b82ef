//! Structured error types for tool responses.

use crate::store::StoreError;
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidFieldName,
    InvalidQuery,

    // Not found errors
    TagNotFound,
    TaskNotFound,
    SubtaskNotFound,

    // Internal errors
    StorageError,
    InternalError,
    UnknownTool,
}

/// Structured error for tool responses.
#[derive(Debug, Serialize)]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingRequiredField, format!("{} is required", field)).with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_query(errors: &[String]) -> Self {
        Self::new(ErrorCode::InvalidQuery, errors.join("; "))
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorCode::UnknownTool, format!("Unknown tool: {}", name))
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ToolError {}

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        let code = match &err {
            StoreError::TagNotFound(_) => ErrorCode::TagNotFound,
            StoreError::TaskNotFound(_) => ErrorCode::TaskNotFound,
            StoreError::SubtaskNotFound { .. } => ErrorCode::SubtaskNotFound,
            StoreError::InvalidFieldName(_) => ErrorCode::InvalidFieldName,
            StoreError::InvalidFieldValue { .. } | StoreError::InvalidTarget(_) => ErrorCode::InvalidFieldValue,
            StoreError::Io { .. } | StoreError::Parse { .. } | StoreError::Schema { .. } => ErrorCode::StorageError,
        };
        let error = Self::new(code, err.to_string());
        match err {
            StoreError::InvalidFieldValue { field, .. } => error.with_field(field),
            StoreError::InvalidTarget(_) => error.with_field("target"),
            StoreError::Schema { tag, .. } if !tag.is_empty() => error.with_details(format!("tag: {}", tag)),
            _ => error,
        }
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ToolError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ToolError>() {
            Ok(tool_err) => tool_err,
            Err(err) => match err.downcast::<StoreError>() {
                Ok(store_err) => store_err.into(),
                Err(err) => ToolError::internal(err),
            },
        }
    }
}

/// Result type for tool operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_codes() {
        let err: ToolError = StoreError::SubtaskNotFound { parent: 3, subtask: 9 }.into();
        assert_eq!(err.code, ErrorCode::SubtaskNotFound);
        assert_eq!(err.message, "subtask 3.9 not found");

        let err: ToolError = StoreError::InvalidTarget("x.y".into()).into();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert_eq!(err.field.as_deref(), Some("target"));
    }

    #[test]
    fn test_serialized_shape() {
        let err = ToolError::missing_field("query");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "MISSING_REQUIRED_FIELD");
        assert_eq!(json["field"], "query");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_anyhow_roundtrip_keeps_store_code() {
        let err: ToolError = anyhow::Error::new(StoreError::TagNotFound("x".into())).into();
        assert_eq!(err.code, ErrorCode::TagNotFound);
    }
}
