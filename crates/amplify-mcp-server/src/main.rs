use std::path::PathBuf;
use std::sync::Arc;

use amplify_mcp_server::auth::{
    CognitoIdentityProvider, IdentityProvider, UnconfiguredIdentityProvider,
};
use amplify_mcp_server::errors::ServerError;
use amplify_mcp_server::outputs::{AuthorizationMode, BackendOutputs};
use amplify_mcp_server::server::Server;
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use runtime::read_config;
use tracing::{info, warn};

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the MCP server
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = STYLES,
    about = "Amplify MCP Server - explore and query an Amplify data backend from an AI agent",
)]
struct Args {
    /// Path to the config file
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: runtime::Config = match Args::parse().config {
        Some(config_path) => read_config(config_path)?,
        None => runtime::read_config_from_env()?,
    };

    // WorkerGuard is not used but needed to be at least defined or else the guard
    // is cleaned up too early and file appender logging does not work
    let _guard = runtime::logging::setup_logging(&config)?;

    info!(
        "Amplify MCP Server v{} // (c) Amplify MCP Server contributors // Licensed under MIT",
        env!("CARGO_PKG_VERSION")
    );

    let (auth, data) = BackendOutputs::from_path(&config.outputs)?.into_parts()?;

    let authorization_mode = match config.authorization_mode {
        Some(mode) => mode,
        None => data.default_authorization_mode()?,
    };
    if authorization_mode == AuthorizationMode::ApiKey && data.api_key.is_none() {
        return Err(ServerError::MissingAuthorizationSetting(
            authorization_mode.to_string(),
            "an api_key in the outputs document",
        )
        .into());
    }

    let http_client = amplify_mcp_server::http_client(config.timeout)?;

    let identity_provider: Arc<dyn IdentityProvider> = match auth {
        Some(auth) => {
            info!(user_pool = %auth.user_pool_id, "Signing in through the user pool");
            let provider = CognitoIdentityProvider::new(
                http_client.clone(),
                &auth.aws_region,
                auth.user_pool_client_id,
            )
            .map_err(ServerError::from)?;
            Arc::new(match config.identity_endpoint {
                Some(endpoint) => provider.with_endpoint(endpoint),
                None => provider,
            })
        }
        None => {
            warn!("The outputs document has no auth section; the login tool will be unavailable");
            Arc::new(UnconfiguredIdentityProvider)
        }
    };

    let endpoint = config.endpoint.unwrap_or(data.url);
    info!(%endpoint, mode = %authorization_mode, "Using GraphQL endpoint");

    Ok(Server::builder()
        .transport(config.transport)
        .endpoint(endpoint)
        .maybe_api_key(data.api_key)
        .authorization_mode(authorization_mode)
        .introspection(data.model_introspection)
        .identity_provider(identity_provider)
        .maybe_default_credentials(config.credentials.into_credentials())
        .mutation_mode(config.overrides.mutation_mode)
        .http_client(http_client)
        .build()
        .start()
        .await?)
}
