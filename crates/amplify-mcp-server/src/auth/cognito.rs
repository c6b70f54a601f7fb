//! Sign-in against a Cognito user pool using its JSON API

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::IdentityProvider;
use crate::errors::IdentityError;
use crate::session::{Credentials, Identity, SessionToken};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// Error codes which mean the caller's credentials were not accepted
const REJECTION_CODES: [&str; 3] = [
    "NotAuthorizedException",
    "UserNotFoundException",
    "UserNotConfirmedException",
];

/// An identity provider backed by a Cognito user pool app client
pub struct CognitoIdentityProvider {
    client: reqwest::Client,
    endpoint: Url,
    client_id: String,
}

impl CognitoIdentityProvider {
    /// Create a provider for the user pool app client in the given region
    pub fn new(
        client: reqwest::Client,
        region: &str,
        client_id: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            endpoint: Url::parse(&format!("https://cognito-idp.{region}.amazonaws.com/"))?,
            client_id: client_id.into(),
        })
    }

    /// Send requests to a different endpoint than the regional default
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    async fn initiate_auth(
        &self,
        flow: &str,
        parameters: Value,
    ) -> Result<SessionToken, IdentityError> {
        let response: InitiateAuthResponse = self
            .call(
                "InitiateAuth",
                json!({
                    "AuthFlow": flow,
                    "ClientId": self.client_id,
                    "AuthParameters": parameters,
                }),
            )
            .await?;

        if let Some(challenge) = response.challenge_name {
            return Err(IdentityError::Challenge(challenge));
        }

        let result = response.authentication_result.ok_or_else(|| {
            IdentityError::UnexpectedResponse("missing AuthenticationResult".to_string())
        })?;

        Ok(SessionToken {
            access_token: SecretString::from(result.access_token),
            id_token: result.id_token.map(SecretString::from),
            refresh_token: result.refresh_token.map(SecretString::from),
            expires_in: result.expires_in.map(Duration::from_secs),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        target: &str,
        body: Value,
    ) -> Result<T, IdentityError> {
        debug!(target, "Calling identity provider");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{target}"))
            .header(CONTENT_TYPE, AMZ_JSON)
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            serde_json::from_slice(&bytes)
                .map_err(|error| IdentityError::UnexpectedResponse(error.to_string()))
        } else {
            let error = serde_json::from_slice::<ErrorResponse>(&bytes).unwrap_or_default();
            Err(error.into_identity_error(status))
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<SessionToken, IdentityError> {
        self.initiate_auth(
            "USER_PASSWORD_AUTH",
            json!({
                "USERNAME": credentials.username,
                "PASSWORD": credentials.password.expose_secret(),
            }),
        )
        .await
    }

    async fn renew(&self, refresh_token: &SecretString) -> Result<SessionToken, IdentityError> {
        self.initiate_auth(
            "REFRESH_TOKEN_AUTH",
            json!({ "REFRESH_TOKEN": refresh_token.expose_secret() }),
        )
        .await
    }

    async fn current_user(&self, access_token: &SecretString) -> Result<Identity, IdentityError> {
        let user: GetUserResponse = self
            .call(
                "GetUser",
                json!({ "AccessToken": access_token.expose_secret() }),
            )
            .await?;

        let attributes: BTreeMap<String, String> = user
            .user_attributes
            .into_iter()
            .map(|attribute| (attribute.name, attribute.value))
            .collect();

        Ok(Identity {
            username: user.username,
            user_id: attributes.get("sub").cloned(),
            attributes,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    username: String,
    #[serde(default)]
    user_attributes: Vec<UserAttribute>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserAttribute {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Default, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

impl ErrorResponse {
    fn into_identity_error(self, status: reqwest::StatusCode) -> IdentityError {
        // Error types may be qualified, e.g. `com.amazonaws...#NotAuthorizedException`
        let code = self
            .kind
            .as_deref()
            .and_then(|kind| kind.rsplit('#').next())
            .unwrap_or("UnknownError")
            .to_string();
        let message = self.message.unwrap_or_else(|| status.to_string());

        if REJECTION_CODES.contains(&code.as_str()) {
            IdentityError::Rejected(message)
        } else {
            IdentityError::Provider { code, message }
        }
    }
}
