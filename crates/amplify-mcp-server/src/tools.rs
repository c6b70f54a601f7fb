//! MCP tools to allow an AI agent to sign in, explore the data models, and
//! query the backend.

use std::fmt::Display;

use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

pub(crate) mod current_user;
pub(crate) mod login;
pub(crate) mod models;
pub(crate) mod records;
pub(crate) mod run_query;

/// A successful result with a single text payload
pub(crate) fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(text.into())],
        is_error: None,
    }
}

/// A failed result describing what went wrong
pub(crate) fn error_result(error: impl Display) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(error.to_string())],
        is_error: Some(true),
    }
}

/// The JSON body returned by the backend.
///
/// The result is only flagged as an error when the backend returned errors
/// and no data at all.
pub(crate) fn json_result(json: &Value) -> CallToolResult {
    CallToolResult {
        content: vec![Content::json(json).unwrap_or_else(|_| Content::text(json.to_string()))],
        is_error: Some(
            json.get("errors")
                .filter(|value| !matches!(value, Value::Null))
                .is_some()
                && json
                    .get("data")
                    .filter(|value| !matches!(value, Value::Null))
                    .is_none(),
        ),
    }
}
