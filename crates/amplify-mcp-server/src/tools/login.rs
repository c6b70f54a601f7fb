use std::sync::Arc;

use rmcp::model::{CallToolResult, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::{schemars, serde_json};
use serde::Deserialize;

use super::{error_result, text_result};
use crate::auth::AuthController;
use crate::errors::McpError;
use crate::schema_from_type;
use crate::session::Credentials;

/// The name of the tool to sign in to the backend
pub const LOGIN_TOOL_NAME: &str = "login";

#[derive(Clone)]
pub struct Login {
    auth: Arc<AuthController>,
    pub tool: Tool,
}

/// Input for the login tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {
    /// The username (usually an email address)
    username: String,
    /// The user's password
    password: String,
}

impl Login {
    pub fn new(auth: Arc<AuthController>) -> Self {
        Self {
            auth,
            tool: Tool::new(
                LOGIN_TOOL_NAME,
                "Sign in to the backend with a username and password. Queries which use user pool authorization run as the signed in user. The credentials are kept for the rest of the session so an expired session can be renewed without asking again.",
                schema_from_type!(Input),
            ),
        }
    }

    pub async fn execute(&self, input: Input) -> Result<CallToolResult, McpError> {
        match self
            .auth
            .login(Credentials::new(input.username, input.password))
            .await
        {
            Ok(identity) => Ok(text_result(format!("Logged in as {}", identity.username))),
            Err(error) => Ok(error_result(format!("Login failed: {error}"))),
        }
    }
}
