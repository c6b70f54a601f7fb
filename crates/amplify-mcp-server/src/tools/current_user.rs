use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::{schemars, serde_json};
use serde::Deserialize;

use super::text_result;
use crate::auth::AuthController;
use crate::errors::McpError;
use crate::schema_from_type;

/// The name of the tool to show the signed in user
pub const CURRENT_USER_TOOL_NAME: &str = "get-current-user";

const NOT_LOGGED_IN: &str = "Not logged in. Use the `login` tool to authenticate.";

#[derive(Clone)]
pub struct CurrentUser {
    auth: Arc<AuthController>,
    pub tool: Tool,
}

/// Input for the get-current-user tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {}

impl CurrentUser {
    pub fn new(auth: Arc<AuthController>) -> Self {
        Self {
            auth,
            tool: Tool::new(
                CURRENT_USER_TOOL_NAME,
                "Show the user the server is signed in as, including their user attributes.",
                schema_from_type!(Input),
            ),
        }
    }

    pub async fn execute(&self, _input: Input) -> Result<CallToolResult, McpError> {
        let session = self.auth.session().current().await;
        match (session.identity, session.token) {
            (Some(identity), Some(_)) => Ok(CallToolResult {
                content: vec![Content::json(&identity)?],
                is_error: None,
            }),
            _ => Ok(text_result(NOT_LOGGED_IN)),
        }
    }
}
