//! The outputs document written by a backend deployment
//!
//! It tells us where the GraphQL endpoint lives, how requests to it are
//! authorized, which user pool issues tokens, and which models the backend
//! exposes.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use model_introspection::ModelIntrospection;
use schemars::JsonSchema;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ServerError;

/// The parts of the outputs document the server needs
#[derive(Debug, Deserialize)]
pub struct BackendOutputs {
    #[serde(default)]
    pub auth: Option<AuthOutputs>,

    #[serde(default)]
    pub data: Option<DataOutputs>,
}

/// The user pool signing users in
#[derive(Debug, Clone, Deserialize)]
pub struct AuthOutputs {
    pub aws_region: String,
    pub user_pool_id: String,
    pub user_pool_client_id: String,
}

/// The GraphQL data backend
#[derive(Debug, Deserialize)]
pub struct DataOutputs {
    pub url: Url,

    #[serde(default)]
    pub aws_region: Option<String>,

    #[serde(default)]
    pub api_key: Option<SecretString>,

    pub default_authorization_type: String,

    #[serde(default)]
    pub authorization_types: Vec<String>,

    #[serde(default)]
    pub model_introspection: ModelIntrospection,
}

impl BackendOutputs {
    pub fn from_path(path: &Path) -> Result<Self, ServerError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|error| ServerError::ReadFile(path.to_path_buf(), error))?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ServerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Split into the auth and data sections, requiring the latter
    pub fn into_parts(self) -> Result<(Option<AuthOutputs>, DataOutputs), ServerError> {
        let data = self.data.ok_or(ServerError::NoDataSection)?;
        Ok((self.auth, data))
    }
}

impl DataOutputs {
    pub fn default_authorization_mode(&self) -> Result<AuthorizationMode, ServerError> {
        AuthorizationMode::from_str(&self.default_authorization_type)
    }
}

/// How requests to the GraphQL endpoint are authorized
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationMode {
    /// Send the signed in user's access token
    #[serde(alias = "userPool", alias = "AMAZON_COGNITO_USER_POOLS")]
    UserPool,

    /// Send the backend's API key
    #[serde(alias = "apiKey", alias = "API_KEY")]
    ApiKey,
}

impl FromStr for AuthorizationMode {
    type Err = ServerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user_pool" | "userPool" | "AMAZON_COGNITO_USER_POOLS" => Ok(Self::UserPool),
            "api_key" | "apiKey" | "API_KEY" => Ok(Self::ApiKey),
            other => Err(ServerError::UnsupportedAuthorizationType(other.to_string())),
        }
    }
}

impl Display for AuthorizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserPool => write!(f, "userPool"),
            Self::ApiKey => write!(f, "apiKey"),
        }
    }
}
