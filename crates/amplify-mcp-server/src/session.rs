//! Process-wide authentication state
//!
//! The session lives for the lifetime of the process and is never persisted.
//! It is only mutated by login and by the refresh controller in [`crate::auth`].

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::RwLock;

/// A username and password pair
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Tokens issued by the identity provider
#[derive(Clone, Debug)]
pub struct SessionToken {
    /// The bearer credential attached to GraphQL requests
    pub access_token: SecretString,

    pub id_token: Option<SecretString>,

    /// Used to renew the session without the user's password
    pub refresh_token: Option<SecretString>,

    pub expires_in: Option<Duration>,
}

impl SessionToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            id_token: None,
            refresh_token: None,
            expires_in: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretString::from(refresh_token.into()));
        self
    }

    pub fn bearer(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Whether both tokens carry the same access token
    pub fn same_as(&self, other: &SessionToken) -> bool {
        self.bearer() == other.bearer()
    }
}

/// The authenticated user
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub username: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Identity {
    /// An identity known only by its username
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            user_id: None,
            attributes: BTreeMap::new(),
        }
    }
}

/// A snapshot of the authentication state
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub identity: Option<Identity>,
    pub token: Option<SessionToken>,

    /// Credentials from the most recent interactive login
    pub credentials: Option<Credentials>,
}

/// Shared holder of the current [`Session`]
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<Session>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, identity: Identity, token: SessionToken, credentials: Credentials) {
        *self.inner.write().await = Session {
            identity: Some(identity),
            token: Some(token),
            credentials: Some(credentials),
        };
    }

    pub async fn set_token(&self, token: SessionToken) {
        self.inner.write().await.token = Some(token);
    }

    pub async fn clear_token(&self) {
        self.inner.write().await.token = None;
    }

    pub async fn clear(&self) {
        *self.inner.write().await = Session::default();
    }

    pub async fn current(&self) -> Session {
        self.inner.read().await.clone()
    }
}
