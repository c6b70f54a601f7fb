use async_trait::async_trait;
use secrecy::SecretString;

use crate::errors::IdentityError;
use crate::session::{Credentials, Identity, SessionToken};

/// A service which issues and renews session tokens
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with a username and password
    async fn sign_in(&self, credentials: &Credentials) -> Result<SessionToken, IdentityError>;

    /// Exchange a refresh token for a new session token
    async fn renew(&self, refresh_token: &SecretString) -> Result<SessionToken, IdentityError>;

    /// Look up the user an access token belongs to
    async fn current_user(&self, access_token: &SecretString) -> Result<Identity, IdentityError>;
}

/// Used when the backend has no user pool, so every sign-in fails
pub struct UnconfiguredIdentityProvider;

#[async_trait]
impl IdentityProvider for UnconfiguredIdentityProvider {
    async fn sign_in(&self, _credentials: &Credentials) -> Result<SessionToken, IdentityError> {
        Err(IdentityError::NotConfigured)
    }

    async fn renew(&self, _refresh_token: &SecretString) -> Result<SessionToken, IdentityError> {
        Err(IdentityError::NotConfigured)
    }

    async fn current_user(&self, _access_token: &SecretString) -> Result<Identity, IdentityError> {
        Err(IdentityError::NotConfigured)
    }
}
