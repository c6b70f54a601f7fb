use crate::session::{Credentials, Session};

/// Chooses the credentials used to sign in again once a session can no longer
/// be renewed.
///
/// There are two slots. Credentials from the most recent interactive login are
/// cached in the session and always win. Defaults supplied at startup are only
/// used when nobody has logged in.
#[derive(Clone, Debug, Default)]
pub struct CredentialResolver {
    defaults: Option<Credentials>,
}

impl CredentialResolver {
    pub fn new(defaults: Option<Credentials>) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> Option<&Credentials> {
        self.defaults.as_ref()
    }

    pub fn resolve(&self, session: &Session) -> Option<Credentials> {
        session
            .credentials
            .clone()
            .or_else(|| self.defaults.clone())
    }
}
