use std::path::PathBuf;
use std::time::Duration;

use amplify_mcp_server::outputs::AuthorizationMode;
use amplify_mcp_server::server::Transport;
use amplify_mcp_server::session::Credentials;
use schemars::JsonSchema;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use super::{logging::Logging, overrides::Overrides};

/// Configuration for the MCP server
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Path to the outputs document written by the backend deployment
    pub outputs: PathBuf,

    /// Overrides the GraphQL endpoint named in the outputs document
    pub endpoint: Option<Url>,

    /// How GraphQL requests are authorized, defaulting to the backend's
    /// default authorization type
    pub authorization_mode: Option<AuthorizationMode>,

    /// Overrides the identity provider endpoint derived from the user pool region
    pub identity_endpoint: Option<Url>,

    /// Credentials used to sign in at startup and to re-authenticate
    pub credentials: CredentialsConfig,

    /// Timeout for requests to the backend
    #[serde(with = "humantime_serde")]
    #[schemars(with = "String")]
    pub timeout: Duration,

    /// Logging configuration
    pub logging: Logging,

    /// Overrides for server behaviour
    pub overrides: Overrides,

    /// The type of server transport to use
    pub transport: Transport,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            outputs: PathBuf::from("amplify_outputs.json"),
            endpoint: None,
            authorization_mode: None,
            identity_endpoint: None,
            credentials: CredentialsConfig::default(),
            timeout: Duration::from_secs(30),
            logging: Logging::default(),
            overrides: Overrides::default(),
            transport: Transport::default(),
        }
    }
}

/// Default sign in credentials
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CredentialsConfig {
    /// The user to sign in as
    #[serde(deserialize_with = "parsers::string_from_scalar")]
    pub username: Option<String>,

    /// The user's password
    #[serde(deserialize_with = "parsers::secret_from_scalar")]
    #[schemars(with = "Option<String>")]
    pub password: Option<SecretString>,
}

impl CredentialsConfig {
    /// Both halves are needed to sign in
    pub fn into_credentials(self) -> Option<Credentials> {
        match (self.username, self.password) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                warn!("Ignoring partial credentials: both a username and a password are required");
                None
            }
        }
    }
}

mod parsers {
    use secrecy::SecretString;
    use serde::{Deserialize, Deserializer};

    /// Env and YAML values are typed on the way in, so a numeric password
    /// arrives as a number rather than a string
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        String(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Bool(bool),
    }

    impl From<Scalar> for String {
        fn from(value: Scalar) -> Self {
            match value {
                Scalar::String(value) => value,
                Scalar::Unsigned(value) => value.to_string(),
                Scalar::Signed(value) => value.to_string(),
                Scalar::Float(value) => value.to_string(),
                Scalar::Bool(value) => value.to_string(),
            }
        }
    }

    pub(super) fn string_from_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
    }

    pub(super) fn secret_from_scalar<'de, D>(
        deserializer: D,
    ) -> Result<Option<SecretString>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(string_from_scalar(deserializer)?.map(SecretString::from))
    }
}
