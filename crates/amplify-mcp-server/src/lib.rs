use std::time::Duration;

use errors::ServerError;

pub mod auth;
pub mod errors;
mod graphql;
pub mod json_schema;
pub mod mutation_mode;
pub mod outputs;
pub mod server;
mod server_handler;
pub mod session;
mod tools;

/// The HTTP client shared by the GraphQL executor and the identity provider
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ServerError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("amplify-mcp-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ServerError::HttpClient)
}
