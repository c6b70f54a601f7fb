//! Signing in, and keeping the session's token usable

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

mod cognito;
mod credentials;
mod identity_provider;

pub use cognito::CognitoIdentityProvider;
pub use credentials::CredentialResolver;
#[cfg(test)]
pub(crate) use identity_provider::fake::FakeIdentityProvider;
pub use identity_provider::{IdentityProvider, UnconfiguredIdentityProvider};

use crate::errors::{IdentityError, ToolError};
use crate::session::{Credentials, Identity, SessionState, SessionToken};

/// Owns every change to the session.
///
/// Login and refresh share one guard, so at most one of them talks to the
/// identity provider at a time and a refresh never interleaves with a login.
pub struct AuthController {
    session: Arc<SessionState>,
    provider: Arc<dyn IdentityProvider>,
    resolver: CredentialResolver,
    guard: Mutex<()>,
}

impl AuthController {
    pub fn new(
        session: Arc<SessionState>,
        provider: Arc<dyn IdentityProvider>,
        default_credentials: Option<Credentials>,
    ) -> Self {
        Self {
            session,
            provider,
            resolver: CredentialResolver::new(default_credentials),
            guard: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// The token requests should currently be sent with
    pub async fn token(&self) -> Option<SessionToken> {
        self.session.current().await.token
    }

    /// Sign in interactively, replacing the session on success.
    ///
    /// A failed login leaves the existing session untouched.
    pub async fn login(&self, credentials: Credentials) -> Result<Identity, IdentityError> {
        let _guard = self.guard.lock().await;

        let (identity, token) = self.authenticate(&credentials).await?;
        self.session.set(identity.clone(), token, credentials).await;

        info!(username = %identity.username, "Logged in");
        Ok(identity)
    }

    /// Sign in with the default credentials, if there are any
    pub async fn auto_login(&self) {
        let Some(credentials) = self.resolver.defaults().cloned() else {
            debug!("No default credentials configured, starting unauthenticated");
            return;
        };

        let username = credentials.username.clone();
        if let Err(error) = self.login(credentials).await {
            warn!(%username, %error, "Automatic login failed, starting unauthenticated");
        }
    }

    /// Obtain a new token after `stale` was rejected by the backend.
    ///
    /// Renewal with the session's refresh token is tried first, then a fresh
    /// sign-in with the resolved credentials. Each is attempted at most once.
    pub async fn refresh(&self, stale: Option<&SessionToken>) -> Result<SessionToken, ToolError> {
        let _guard = self.guard.lock().await;
        let session = self.session.current().await;

        // Someone else refreshed or logged in while we were waiting
        if let Some(current) = &session.token {
            if stale.is_none_or(|stale| !current.same_as(stale)) {
                debug!("Session token already replaced, skipping refresh");
                return Ok(current.clone());
            }
        }

        if let Some(refresh_token) = session
            .token
            .as_ref()
            .and_then(|token| token.refresh_token.clone())
        {
            match self.provider.renew(&refresh_token).await {
                Ok(mut renewed) => {
                    if renewed.refresh_token.is_none() {
                        renewed.refresh_token = Some(refresh_token);
                    }
                    self.session.set_token(renewed.clone()).await;
                    info!("Renewed session token");
                    return Ok(renewed);
                }
                Err(error) => warn!(%error, "Session renewal failed, signing in again"),
            }
        }

        let Some(credentials) = self.resolver.resolve(&session) else {
            return Err(ToolError::AuthUnavailable(
                "no credentials available for re-authentication".to_string(),
            ));
        };

        match self.authenticate(&credentials).await {
            Ok((identity, token)) => {
                info!(username = %identity.username, "Signed in again");
                self.session.set(identity, token.clone(), credentials).await;
                Ok(token)
            }
            Err(error) => {
                warn!(username = %credentials.username, %error, "Re-authentication failed");
                self.session.clear_token().await;
                Err(ToolError::AuthUnavailable(format!("credentials rejected: {error}")))
            }
        }
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<(Identity, SessionToken), IdentityError> {
        let token = self.provider.sign_in(credentials).await?;

        let identity = match self.provider.current_user(&token.access_token).await {
            Ok(identity) => identity,
            Err(error) => {
                warn!(%error, "Could not look up the signed in user");
                Identity::named(&credentials.username)
            }
        };

        Ok((identity, token))
    }
}
