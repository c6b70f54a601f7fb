use std::path::PathBuf;

use model_introspection::IntrospectionError;
use reqwest::StatusCode;
use rmcp::serde_json;
use tokio::task::JoinError;

/// An error in server initialization
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Could not read {0}: {1}")]
    ReadFile(PathBuf, #[source] std::io::Error),

    #[error("Could not bind the MCP server address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Invalid outputs document: {0}")]
    Outputs(#[from] serde_json::Error),

    #[error("The outputs document has no data section")]
    NoDataSection,

    #[error("Unsupported authorization type: {0}")]
    UnsupportedAuthorizationType(String),

    #[error("Authorization mode {0} requires {1}")]
    MissingAuthorizationSetting(String, &'static str),

    #[error("Invalid identity provider endpoint: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Could not build HTTP client: {0}")]
    HttpClient(reqwest::Error),

    #[error("MCP transport error: {0}")]
    Transport(String),

    #[error("Failed to start server")]
    StartupError(#[from] JoinError),
}

/// An error from one of the tools exposed to the MCP client.
///
/// These never reach the client as protocol errors. Each tool renders them
/// into a descriptive text result instead.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Authentication unavailable: {0}")]
    AuthUnavailable(String),

    #[error("Upstream request failed: {message}")]
    Upstream {
        status: Option<StatusCode>,
        message: String,
    },
}

impl ToolError {
    pub(crate) fn upstream(message: impl Into<String>) -> Self {
        ToolError::Upstream {
            status: None,
            message: message.into(),
        }
    }
}

impl From<IntrospectionError> for ToolError {
    fn from(error: IntrospectionError) -> Self {
        match error {
            IntrospectionError::ModelNotFound(_) => ToolError::NotFound(format!(
                "{error}. Use the `list-models` tool to see the available models."
            )),
            IntrospectionError::Json(_) => ToolError::InvalidInput(error.to_string()),
        }
    }
}

/// An error talking to the identity provider
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("{0}")]
    Rejected(String),

    #[error("sign-in requires completing the {0} challenge, which is not supported")]
    Challenge(String),

    #[error("identity provider request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("identity provider error {code}: {message}")]
    Provider { code: String, message: String },

    #[error("unexpected identity provider response: {0}")]
    UnexpectedResponse(String),

    #[error("no identity provider is configured")]
    NotConfigured,
}

/// An MCP tool error
pub type McpError = rmcp::model::ErrorData;
