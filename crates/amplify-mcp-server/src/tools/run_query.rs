use std::str::FromStr;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::serde_json::Value;
use rmcp::{schemars, serde_json};
use serde::Deserialize;

use super::{error_result, json_result};
use crate::errors::{McpError, ToolError};
use crate::graphql::{Executor, Request};
use crate::outputs::AuthorizationMode;
use crate::schema_from_type;

/// The name of the tool to execute an ad hoc GraphQL operation
pub const RUN_QUERY_TOOL_NAME: &str = "run-query";

#[derive(Clone)]
pub struct RunQuery {
    executor: Arc<Executor>,
    pub tool: Tool,
}

/// Input for the run-query tool.
#[derive(JsonSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    /// The GraphQL operation
    query: String,

    /// The variable values represented as JSON
    #[schemars(schema_with = "String::json_schema", default)]
    variables: Option<Value>,

    /// How to authorize the request: `userPool` (the signed in user) or
    /// `apiKey`. Defaults to the backend's default authorization mode.
    #[serde(default)]
    auth_mode: Option<String>,
}

impl RunQuery {
    pub fn new(executor: Arc<Executor>) -> Self {
        Self {
            executor,
            tool: Tool::new(
                RUN_QUERY_TOOL_NAME,
                "Run a GraphQL query or mutation against the backend and return the raw JSON response. Use `list-models` and `get-model-details` to learn the models first. Operations are named after the models, e.g. `getTodo`, `listTodos`, `createTodo`. List queries return `{ items nextToken }`.",
                schema_from_type!(Input),
            ),
        }
    }

    pub async fn execute(&self, input: Input) -> Result<CallToolResult, McpError> {
        let variables = match variables(input.variables) {
            Ok(variables) => variables,
            Err(error) => return Ok(error_result(error)),
        };

        let mode = match input.auth_mode.as_deref().map(AuthorizationMode::from_str) {
            None => None,
            Some(Ok(mode)) => Some(mode),
            Some(Err(error)) => return Ok(error_result(ToolError::InvalidInput(error.to_string()))),
        };

        match self
            .executor
            .execute(&Request::new(input.query, variables), mode)
            .await
        {
            Ok(body) => Ok(json_result(&body)),
            Err(error) => Ok(error_result(error)),
        }
    }
}

/// Variables arrive either as a JSON object or as a string holding one
fn variables(variables: Option<Value>) -> Result<Option<Value>, ToolError> {
    match variables {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Null) => Ok(None),
            Ok(object @ Value::Object(_)) => Ok(Some(object)),
            Ok(_) => Err(ToolError::InvalidInput(
                "Invalid JSON variables: expected an object".to_string(),
            )),
            Err(error) => Err(ToolError::InvalidInput(format!(
                "Invalid JSON variables: {error}"
            ))),
        },
        Some(object @ Value::Object(_)) => Ok(Some(object)),
        Some(_) => Err(ToolError::InvalidInput(
            "Invalid JSON variables: expected an object".to_string(),
        )),
    }
}
