//! Execute GraphQL operations against the data backend

use std::sync::Arc;

use headers::{Authorization, HeaderMapExt};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthController;
use crate::errors::ToolError;
use crate::outputs::AuthorizationMode;
use crate::session::SessionToken;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Messages which mean the caller's token is no longer accepted
const AUTH_FAILURE_MESSAGES: [&str; 3] = [
    "authentication failed",
    "token is expired",
    "token has expired",
];

/// A GraphQL operation to send upstream
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub query: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl Request {
    pub fn new(query: impl Into<String>, variables: Option<Value>) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }
}

/// Sends operations to the GraphQL endpoint, refreshing the session and
/// retrying once when the backend rejects the caller's token
pub struct Executor {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<SecretString>,
    default_mode: AuthorizationMode,
    auth: Arc<AuthController>,
}

enum Outcome {
    Success(Value),
    AuthFailure,
}

enum Credential<'a> {
    Bearer(Option<&'a SessionToken>),
    ApiKey(&'a SecretString),
}

impl Executor {
    pub fn new(
        client: reqwest::Client,
        endpoint: Url,
        api_key: Option<SecretString>,
        default_mode: AuthorizationMode,
        auth: Arc<AuthController>,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            default_mode,
            auth,
        }
    }

    /// Execute an operation, returning the upstream response body unmodified.
    ///
    /// GraphQL errors other than a rejected credential are part of the body.
    pub async fn execute(
        &self,
        request: &Request,
        mode: Option<AuthorizationMode>,
    ) -> Result<Value, ToolError> {
        match mode.unwrap_or(self.default_mode) {
            AuthorizationMode::ApiKey => {
                let api_key = self.api_key.as_ref().ok_or_else(|| {
                    ToolError::AuthUnavailable("no API key is configured".to_string())
                })?;
                match self.send(request, Credential::ApiKey(api_key)).await? {
                    Outcome::Success(body) => Ok(body),
                    Outcome::AuthFailure => {
                        Err(ToolError::AuthUnavailable("API key rejected".to_string()))
                    }
                }
            }
            AuthorizationMode::UserPool => {
                let token = self.auth.token().await;
                if let Outcome::Success(body) =
                    self.send(request, Credential::Bearer(token.as_ref())).await?
                {
                    return Ok(body);
                }

                debug!("Backend rejected the session token, refreshing");
                let refreshed = self.auth.refresh(token.as_ref()).await?;
                match self
                    .send(request, Credential::Bearer(Some(&refreshed)))
                    .await?
                {
                    Outcome::Success(body) => Ok(body),
                    Outcome::AuthFailure => Err(ToolError::AuthUnavailable(
                        "the backend rejected the refreshed session".to_string(),
                    )),
                }
            }
        }
    }

    async fn send(
        &self,
        request: &Request,
        credential: Credential<'_>,
    ) -> Result<Outcome, ToolError> {
        let mut headers = HeaderMap::new();
        match credential {
            Credential::Bearer(Some(token)) => match Authorization::bearer(token.bearer()) {
                Ok(authorization) => headers.typed_insert(authorization),
                Err(error) => warn!(%error, "Session token is not a valid bearer token"),
            },
            Credential::Bearer(None) => debug!("No session token, sending unauthenticated"),
            Credential::ApiKey(api_key) => match HeaderValue::from_str(api_key.expose_secret()) {
                Ok(value) => {
                    headers.insert(API_KEY_HEADER, value);
                }
                Err(error) => warn!(%error, "API key is not a valid header value"),
            },
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|error| {
                ToolError::upstream(format!("Failed to send GraphQL request: {error}"))
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(Outcome::AuthFailure);
        }

        let text = response.text().await.map_err(|error| {
            ToolError::upstream(format!("Failed to read GraphQL response body: {error}"))
        })?;

        if !status.is_success() {
            return Err(ToolError::Upstream {
                status: Some(status),
                message: format!("{status}: {text}"),
            });
        }

        let body: Value = serde_json::from_str(&text).map_err(|error| {
            ToolError::upstream(format!("Failed to read GraphQL response body: {error}"))
        })?;

        if is_auth_failure(&body) {
            Ok(Outcome::AuthFailure)
        } else {
            Ok(Outcome::Success(body))
        }
    }
}

/// Whether a response body carries an error meaning the credential was rejected
fn is_auth_failure(body: &Value) -> bool {
    let Some(errors) = body.get("errors").and_then(Value::as_array) else {
        return false;
    };

    errors.iter().any(|error| {
        let error_type = error
            .get("errorType")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();

        error_type.ends_with("unauthorizedexception")
            || message.contains("unauthorizedexception")
            || AUTH_FAILURE_MESSAGES
                .iter()
                .any(|signature| message.contains(signature) || error_type.contains(signature))
    })
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::auth::FakeIdentityProvider;
    use crate::session::{Credentials, Identity, SessionState};

    const QUERY: &str = "query { listTodos { items { id } } }";

    struct Fixture {
        server: mockito::ServerGuard,
        provider: Arc<FakeIdentityProvider>,
        auth: Arc<AuthController>,
        executor: Executor,
    }

    async fn fixture(provider: FakeIdentityProvider, token: Option<&str>) -> Fixture {
        let server = mockito::Server::new_async().await;
        let provider = Arc::new(provider);
        let session = Arc::new(SessionState::new());
        if let Some(token) = token {
            session
                .set(
                    Identity::named("alice"),
                    SessionToken::new(token).with_refresh_token("refresh"),
                    Credentials::new("alice", "hunter2"),
                )
                .await;
        }
        let auth = Arc::new(AuthController::new(session, provider.clone(), None));
        let executor = Executor::new(
            reqwest::Client::new(),
            Url::parse(&server.url()).unwrap(),
            Some(SecretString::from("da2-key")),
            AuthorizationMode::UserPool,
            auth.clone(),
        );

        Fixture {
            server,
            provider,
            auth,
            executor,
        }
    }

    fn data() -> Value {
        json!({ "data": { "listTodos": { "items": [{ "id": "1" }] } } })
    }

    #[tokio::test]
    async fn it_sends_the_session_token() {
        let mut fixture = fixture(FakeIdentityProvider::new("hunter2"), Some("current")).await;
        let mock = fixture
            .server
            .mock("POST", "/")
            .match_header("authorization", "Bearer current")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({ "query": QUERY, "variables": { "limit": 1 } })))
            .with_status(200)
            .with_body(data().to_string())
            .create_async()
            .await;

        let body = fixture
            .executor
            .execute(&Request::new(QUERY, Some(json!({ "limit": 1 }))), None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, data());
    }

    #[tokio::test]
    async fn it_refreshes_and_retries_once_after_a_401() {
        let mut fixture = fixture(FakeIdentityProvider::new("hunter2"), Some("stale")).await;
        let rejected = fixture
            .server
            .mock("POST", "/")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .with_body(
                json!({ "errors": [{ "errorType": "UnauthorizedException", "message": "Token has expired." }] })
                    .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let accepted = fixture
            .server
            .mock("POST", "/")
            .match_header("authorization", "Bearer renewed-1")
            .with_status(200)
            .with_body(data().to_string())
            .expect(1)
            .create_async()
            .await;

        let body = fixture
            .executor
            .execute(&Request::new(QUERY, None), None)
            .await
            .unwrap();

        rejected.assert_async().await;
        accepted.assert_async().await;
        assert_eq!(body, data());
        assert_eq!(fixture.provider.renewals(), 1);
        assert_eq!(
            fixture.auth.token().await.map(|t| t.bearer().to_string()).as_deref(),
            Some("renewed-1")
        );
    }

    #[tokio::test]
    async fn it_gives_up_after_the_retry_is_rejected() {
        let mut fixture = fixture(FakeIdentityProvider::new("hunter2"), Some("stale")).await;
        let mock = fixture
            .server
            .mock("POST", "/")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;

        let error = fixture
            .executor
            .execute(&Request::new(QUERY, None), None)
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(error, ToolError::AuthUnavailable(_)));
        assert_eq!(fixture.provider.renewals(), 1);
        assert_eq!(fixture.provider.sign_ins(), 0);
    }

    #[tokio::test]
    async fn it_refreshes_on_an_unauthorized_error_in_a_successful_response() {
        let mut fixture = fixture(FakeIdentityProvider::new("hunter2"), Some("stale")).await;
        fixture
            .server
            .mock("POST", "/")
            .match_header("authorization", "Bearer stale")
            .with_status(200)
            .with_body(
                json!({
                    "data": null,
                    "errors": [{ "errorType": "UnauthorizedException", "message": "Unauthorized" }]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let accepted = fixture
            .server
            .mock("POST", "/")
            .match_header("authorization", "Bearer renewed-1")
            .with_status(200)
            .with_body(data().to_string())
            .create_async()
            .await;

        let body = fixture
            .executor
            .execute(&Request::new(QUERY, None), None)
            .await
            .unwrap();

        accepted.assert_async().await;
        assert_eq!(body, data());
    }

    #[tokio::test]
    async fn it_propagates_refresh_failures() {
        let mut fixture = fixture(
            FakeIdentityProvider::new("something-else").rejecting_renewals(),
            Some("stale"),
        )
        .await;
        let mock = fixture
            .server
            .mock("POST", "/")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let error = fixture
            .executor
            .execute(&Request::new(QUERY, None), None)
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(
            error.to_string(),
            "Authentication unavailable: credentials rejected: Incorrect username or password."
        );
    }

    #[tokio::test]
    async fn it_does_not_retry_server_errors() {
        let mut fixture = fixture(FakeIdentityProvider::new("hunter2"), Some("current")).await;
        let mock = fixture
            .server
            .mock("POST", "/")
            .with_status(500)
            .with_body("Internal Server Error")
            .expect(1)
            .create_async()
            .await;

        let error = fixture
            .executor
            .execute(&Request::new(QUERY, None), None)
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(
            error,
            ToolError::Upstream { status: Some(status), .. }
                if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert_eq!(fixture.provider.renewals(), 0);
    }

    #[tokio::test]
    async fn it_passes_other_graphql_errors_through() {
        let mut fixture = fixture(FakeIdentityProvider::new("hunter2"), Some("current")).await;
        let body = json!({
            "data": { "getTodo": null },
            "errors": [{
                "errorType": "Unauthorized",
                "message": "Not Authorized to access getTodo on type Query"
            }]
        });
        fixture
            .server
            .mock("POST", "/")
            .with_status(200)
            .with_body(body.to_string())
            .expect(1)
            .create_async()
            .await;

        let response = fixture
            .executor
            .execute(&Request::new(QUERY, None), None)
            .await
            .unwrap();

        assert_eq!(response, body);
        assert_eq!(fixture.provider.renewals(), 0);
    }

    #[tokio::test]
    async fn it_sends_the_api_key() {
        let mut fixture = fixture(FakeIdentityProvider::new("hunter2"), Some("current")).await;
        let mock = fixture
            .server
            .mock("POST", "/")
            .match_header("x-api-key", "da2-key")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(data().to_string())
            .create_async()
            .await;

        fixture
            .executor
            .execute(&Request::new(QUERY, None), Some(AuthorizationMode::ApiKey))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_does_not_refresh_a_rejected_api_key() {
        let mut fixture = fixture(FakeIdentityProvider::new("hunter2"), Some("current")).await;
        let mock = fixture
            .server
            .mock("POST", "/")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let error = fixture
            .executor
            .execute(&Request::new(QUERY, None), Some(AuthorizationMode::ApiKey))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(error.to_string(), "Authentication unavailable: API key rejected");
        assert_eq!(fixture.provider.renewals(), 0);
    }

    #[tokio::test]
    async fn it_reports_transport_failures() {
        let fixture = fixture(FakeIdentityProvider::new("hunter2"), Some("current")).await;
        let executor = Executor::new(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:1/graphql").unwrap(),
            None,
            AuthorizationMode::UserPool,
            fixture.auth.clone(),
        );

        let error = executor
            .execute(&Request::new(QUERY, None), None)
            .await
            .unwrap_err();

        assert!(matches!(error, ToolError::Upstream { status: None, .. }));
        assert_eq!(fixture.provider.renewals(), 0);
    }

    #[rstest]
    #[case(json!({ "errors": [{ "errorType": "UnauthorizedException" }] }), true)]
    #[case(json!({ "errors": [{ "message": "Token has expired." }] }), true)]
    #[case(json!({ "errors": [{ "message": "Valid authorization header not provided. Authentication failed" }] }), true)]
    #[case(json!({ "errors": [{ "message": "token is expired" }] }), true)]
    #[case(json!({ "errors": [{ "errorType": "Unauthorized", "message": "Not Authorized to access x" }] }), false)]
    #[case(json!({ "errors": [{ "errorType": "DynamoDB:ConditionalCheckFailedException" }] }), false)]
    #[case(json!({ "data": {} }), false)]
    fn it_classifies_auth_failures(#[case] body: Value, #[case] expected: bool) {
        assert_eq!(is_auth_failure(&body), expected);
    }
}
