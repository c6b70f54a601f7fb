use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use bon::bon;
use model_introspection::ModelIntrospection;
use rmcp::ServiceExt as _;
use rmcp::transport::StreamableHttpService;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use schemars::JsonSchema;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{error, info};
use url::Url;

use crate::auth::{AuthController, IdentityProvider};
use crate::errors::ServerError;
use crate::graphql::Executor;
use crate::mutation_mode::MutationMode;
use crate::outputs::AuthorizationMode;
use crate::server_handler::AmplifyMcpServerHandler;
use crate::session::{Credentials, SessionState};

/// How the MCP server talks to its clients
#[derive(Debug, Clone, Deserialize, Default, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transport {
    /// Use standard IO for communication
    #[default]
    Stdio,

    /// Host the MCP server on the configuration, using streamable HTTP messages.
    StreamableHttp {
        /// The IP address to bind to
        #[serde(default = "Transport::default_address")]
        address: IpAddr,

        /// The port to bind to
        #[serde(default = "Transport::default_port")]
        port: u16,
    },
}

impl Transport {
    fn default_address() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    fn default_port() -> u16 {
        5000
    }
}

/// An MCP server exposing one Amplify data backend
pub struct Server {
    transport: Transport,
    handler: AmplifyMcpServerHandler,
    auth: Arc<AuthController>,
}

#[bon]
impl Server {
    #[builder]
    pub fn new(
        transport: Transport,
        endpoint: Url,
        api_key: Option<SecretString>,
        authorization_mode: AuthorizationMode,
        introspection: ModelIntrospection,
        identity_provider: Arc<dyn IdentityProvider>,
        default_credentials: Option<Credentials>,
        mutation_mode: MutationMode,
        http_client: reqwest::Client,
    ) -> Self {
        let auth = Arc::new(AuthController::new(
            Arc::new(SessionState::new()),
            identity_provider,
            default_credentials,
        ));
        let executor = Arc::new(Executor::new(
            http_client,
            endpoint,
            api_key,
            authorization_mode,
            auth.clone(),
        ));
        let handler = AmplifyMcpServerHandler::new(
            Arc::new(introspection),
            auth.clone(),
            executor,
            mutation_mode,
        );

        Self {
            transport,
            handler,
            auth,
        }
    }

    pub async fn start(self) -> Result<(), ServerError> {
        self.auth.auto_login().await;

        match self.transport {
            Transport::StreamableHttp { address, port } => {
                info!(port = ?port, address = ?address, "Starting MCP server in Streamable HTTP mode");
                let handler = self.handler.clone();
                let listen_address = SocketAddr::new(address, port);
                let service = StreamableHttpService::new(
                    move || Ok(handler.clone()),
                    LocalSessionManager::default().into(),
                    Default::default(),
                );
                let router = axum::Router::new().nest_service("/mcp", service);

                let tcp_listener = tokio::net::TcpListener::bind(listen_address).await?;
                if let Err(e) = axum::serve(tcp_listener, router)
                    .with_graceful_shutdown(shutdown_signal())
                    .await
                {
                    error!("Failed to start MCP server: {e:?}");
                    return Err(ServerError::Transport(e.to_string()));
                }
            }
            Transport::Stdio => {
                info!("Starting MCP server in stdio mode");
                let service = self
                    .handler
                    .serve(stdio())
                    .await
                    .inspect_err(|e| {
                        error!("serving error: {:?}", e);
                    })
                    .map_err(|e| ServerError::Transport(e.to_string()))?;
                service.waiting().await.map_err(ServerError::StartupError)?;
            }
        }

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C signal handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
