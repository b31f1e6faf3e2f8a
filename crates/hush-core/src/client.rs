//! Authenticated request dispatcher.
//!
//! [`Client`] is the sole entry point for wire interaction with the Hush API. Every call
//! ensures a usable bearer token (refreshing lazily on the request path), sends the request,
//! and either decodes the 2xx body or classifies the failure into an [`ApiError`]. The
//! client is cheap to clone and safe to share across tasks.

use crate::auth::{Authenticator, HttpAuthenticator};
use crate::config::{ClientConfig, HushClientConfig};
use crate::error::ApiError;
use crate::token::TokenStore;
use crate::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Builder for [`Client`].
pub struct ClientBuilder {
    config: HushClientConfig,
    http_config: ClientConfig,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl ClientBuilder {
    /// Create a builder from validated connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configuration does not validate.
    pub fn new(config: HushClientConfig) -> Result<Self> {
        config.check()?;
        let http_config = ClientConfig::new().with_timeout(config.timeout());

        Ok(Self {
            config,
            http_config,
            authenticator: None,
        })
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Replace the token source (the default posts to the configured token endpoint).
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Build the client. No network traffic happens until the first request.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn build(self) -> Result<Client> {
        let base_url = normalize_base(self.config.parse_base_url()?);
        let http = self.http_config.build_http(&self.config.user_agent)?;

        let authenticator = match self.authenticator {
            Some(authenticator) => authenticator,
            None => {
                let token_url = join_endpoint(&base_url, &self.config.token_path)?;
                Arc::new(HttpAuthenticator::new(
                    http.clone(),
                    token_url,
                    self.config.client_id.clone(),
                    self.config.client_secret,
                ))
            }
        };

        Ok(Client {
            inner: Arc::new(Inner {
                http,
                base_url,
                client_id: self.config.client_id,
                tokens: TokenStore::new(),
                authenticator,
            }),
        })
    }
}

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    client_id: String,
    tokens: TokenStore,
    authenticator: Arc<dyn Authenticator>,
}

/// Asynchronous Hush API client.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("client_id", &self.inner.client_id)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Build a client without contacting the API.
    ///
    /// # Errors
    ///
    /// Same as [`ClientBuilder::build`].
    pub fn new(config: HushClientConfig) -> Result<Self> {
        ClientBuilder::new(config)?.build()
    }

    /// Build a client and acquire the initial token, failing fast on bad credentials.
    ///
    /// # Errors
    ///
    /// Returns a configuration error or the failure of the first token exchange.
    pub async fn connect(config: HushClientConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.refresh_token().await?;
        Ok(client)
    }

    /// Access the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The OAuth client id this client authenticates as.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Return a usable access token, refreshing it first if absent or about to expire.
    ///
    /// Concurrent callers that observe a stale token share a single refresh.
    ///
    /// # Errors
    ///
    /// Returns the failure of the token exchange.
    pub async fn ensure_token(&self) -> Result<String> {
        let authenticator = Arc::clone(&self.inner.authenticator);
        self.inner
            .tokens
            .ensure_valid(|| async move { authenticator.authenticate().await })
            .await
    }

    /// Force a token exchange, replacing the cached token on success.
    ///
    /// # Errors
    ///
    /// Returns the failure of the token exchange; the previous token is kept.
    pub async fn refresh_token(&self) -> Result<()> {
        let authenticator = Arc::clone(&self.inner.authenticator);
        self.inner
            .tokens
            .refresh_with(|| async move { authenticator.authenticate().await })
            .await
            .map(|_| ())
    }

    /// Send a request and decode the JSON response into `R`.
    ///
    /// `path` is relative to the base URL and may carry a query string.
    ///
    /// # Errors
    ///
    /// - [`Error::TokenRefresh`] if no usable token could be obtained
    /// - [`Error::Encode`] if `body` cannot be serialized
    /// - [`Error::Transport`] on network failure
    /// - [`Error::Api`] on a non-2xx response
    /// - [`Error::Decode`] if a 2xx body is not valid JSON for `R`
    pub async fn do_request<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.do_request_with_query(method, path, &[], body).await
    }

    /// [`Client::do_request`] with additional query parameters.
    ///
    /// # Errors
    ///
    /// Same as [`Client::do_request`].
    pub async fn do_request_with_query<B, R>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let bytes = self.execute(method, path, params, body).await?;
        serde_json::from_slice(&bytes).map_err(|err| {
            Error::Decode(format!("Failed to parse response for `{path}`: {err}"))
        })
    }

    /// Send a request whose successful response body is ignored.
    ///
    /// # Errors
    ///
    /// Same as [`Client::do_request`], minus decoding.
    pub async fn do_request_no_content<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.execute(method, path, &[], body).await.map(|_| ())
    }

    /// GET `path` and decode the response.
    ///
    /// # Errors
    ///
    /// Same as [`Client::do_request`].
    pub async fn get<R>(&self, path: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.do_request::<(), R>(Method::GET, path, None).await
    }

    /// GET `path` with query parameters and decode the response.
    ///
    /// # Errors
    ///
    /// Same as [`Client::do_request`].
    pub async fn get_with_query<R>(&self, path: &str, params: &[(&str, String)]) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.do_request_with_query::<(), R>(Method::GET, path, params, None)
            .await
    }

    /// POST a JSON body to `path` and decode the response.
    ///
    /// # Errors
    ///
    /// Same as [`Client::do_request`].
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.do_request(Method::POST, path, Some(body)).await
    }

    /// PATCH a JSON body to `path` and decode the response.
    ///
    /// # Errors
    ///
    /// Same as [`Client::do_request`].
    pub async fn patch<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.do_request(Method::PATCH, path, Some(body)).await
    }

    /// DELETE `path`, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Same as [`Client::do_request_no_content`].
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.do_request_no_content::<()>(Method::DELETE, path, None)
            .await
    }

    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let token = self
            .ensure_token()
            .await
            .map_err(|err| Error::TokenRefresh(Box::new(err)))?;

        let url = join_endpoint(&self.inner.base_url, path)?;
        let mut request = self
            .inner
            .http
            .request(method.clone(), url)
            .query(params)
            .bearer_auth(&token)
            .header(ACCEPT, "application/json");

        if let Some(payload) = body {
            let encoded = serde_json::to_vec(payload)
                .map_err(|err| Error::Encode(format!("marshal request body: {err}")))?;
            request = request.header(CONTENT_TYPE, "application/json").body(encoded);
        }

        info!(%method, path, "Hush API request");

        let response = request
            .send()
            .await
            .map_err(|err| Error::Transport(format!("do request: {err}")))?;

        let status = response.status();
        let final_url = response.url().to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| Error::Transport(format!("read response: {err}")))?
            .to_vec();

        debug!(%method, path, status_code = status.as_u16(), "HTTP request completed");

        if status.is_success() {
            return Ok(bytes);
        }

        if status == StatusCode::UNAUTHORIZED {
            // Only the token this request carried is dropped; a newer one stays cached.
            if self.inner.tokens.invalidate(&token).await {
                debug!("dropped rejected access token");
            }
        }

        Err(Error::Api(ApiError::from_response(
            &method, &final_url, status, &bytes,
        )))
    }
}

fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Resolve an API path against the base URL, keeping any base path prefix.
pub(crate) fn join_endpoint(base: &Url, path: &str) -> Result<Url> {
    let relative = path.trim_start_matches('/');
    base.join(relative)
        .map_err(|err| Error::InvalidEndpoint(format!("Invalid API path `{path}`: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockAuthenticator;
    use crate::token::Token;
    use chrono::{TimeDelta, Utc};
    use mockall::Sequence;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Deployment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        env_type: String,
    }

    fn config(server: &MockServer) -> HushClientConfig {
        HushClientConfig::new(server.uri(), "key", "secret").unwrap()
    }

    async fn mount_token(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-1",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    fn fresh(value: &str) -> Token {
        Token::new(value, "Bearer", TimeDelta::seconds(3600), Utc::now())
    }

    fn expired(value: &str) -> Token {
        Token::new(
            value,
            "Bearer",
            TimeDelta::seconds(3600),
            Utc::now() - TimeDelta::hours(2),
        )
    }

    #[test]
    fn join_endpoint_keeps_base_prefix() {
        let base = normalize_base(Url::parse("http://localhost:8000/api").unwrap());
        let url = join_endpoint(&base, "/v1/deployments?name=a%20b").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/deployments?name=a%20b");

        let base = normalize_base(Url::parse("https://api.us.hush-security.com").unwrap());
        let url = join_endpoint(&base, "v1/oauth/token").unwrap();
        assert_eq!(url.as_str(), "https://api.us.hush-security.com/v1/oauth/token");
    }

    #[tokio::test]
    async fn do_request_sends_bearer_and_json() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("POST"))
            .and(path("/v1/deployments"))
            .and(header("authorization", "Bearer tok-1"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"name": "prod", "env_type": "k8s"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "dep-1",
                "name": "prod",
                "env_type": "k8s"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(config(&server)).unwrap();
        let input = Deployment {
            id: None,
            name: "prod".into(),
            env_type: "k8s".into(),
        };
        let created: Deployment = client
            .do_request(Method::POST, "/v1/deployments", Some(&input))
            .await
            .unwrap();
        assert_eq!(created.id.as_deref(), Some("dep-1"));
    }

    #[tokio::test]
    async fn token_is_reused_until_stale() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/v1/deployments/dep-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "dep-1",
                "name": "prod",
                "env_type": "k8s"
            })))
            .expect(3)
            .mount(&server)
            .await;

        let client = Client::new(config(&server)).unwrap();
        for _ in 0..3 {
            let _: Deployment = client.get("/v1/deployments/dep-1").await.unwrap();
        }
    }

    #[tokio::test]
    async fn get_with_query_encodes_params() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/v1/deployments"))
            .and(query_param("name", "prod east"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(config(&server)).unwrap();
        let body: serde_json::Value = client
            .get_with_query("/v1/deployments", &[("name", "prod east".to_string())])
            .await
            .unwrap();
        assert_eq!(body["items"], json!([]));
    }

    #[tokio::test]
    async fn not_found_problem_document() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/v1/deployments/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"status": 404, "title": "Not Found"})),
            )
            .mount(&server)
            .await;

        let client = Client::new(config(&server)).unwrap();
        let err = client
            .get::<Deployment>("/v1/deployments/missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let api = err.api_error().unwrap();
        assert_eq!(api.method, "GET");
        assert!(api.url.ends_with("/v1/deployments/missing"));
    }

    #[tokio::test]
    async fn validation_error_is_surfaced_verbatim() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("PATCH"))
            .and(path("/v1/deployments/dep-1"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "title": "Unprocessable Entity",
                "detail": "env_type must be one of k8s, ecs"
            })))
            .mount(&server)
            .await;

        let client = Client::new(config(&server)).unwrap();
        let err = client
            .patch::<_, Deployment>("/v1/deployments/dep-1", &json!({"env_type": "vm"}))
            .await
            .unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().ends_with("env_type must be one of k8s, ecs"));
    }

    #[tokio::test]
    async fn malformed_success_body_is_decode_error() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/v1/deployments/dep-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = Client::new(config(&server)).unwrap();
        let err = client
            .get::<Deployment>("/v1/deployments/dep-1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.api_error().is_none());
    }

    #[tokio::test]
    async fn delete_ignores_empty_body() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("DELETE"))
            .and(path("/v1/deployments/dep-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(config(&server)).unwrap();
        client.delete("/v1/deployments/dep-1").await.unwrap();
    }

    #[tokio::test]
    async fn token_failure_is_wrapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let client = Client::new(config(&server)).unwrap();
        let err = client
            .get::<Deployment>("/v1/deployments/dep-1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TokenRefresh(_)));
        assert!(err.is_unauthorized());
        assert!(err.to_string().starts_with("token refresh failed"));
    }

    #[tokio::test]
    async fn connect_fails_fast_on_bad_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let err = Client::connect(config(&server)).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let server = MockServer::start().await;
        let client = ClientBuilder::new(config(&server))
            .unwrap()
            .with_authenticator(Arc::new({
                let mut auth = MockAuthenticator::new();
                auth.expect_authenticate()
                    .times(1)
                    .returning(|| Ok(fresh("tok-1")));
                auth
            }))
            .build()
            .unwrap();
        drop(server);

        let err = client
            .get::<Deployment>("/v1/deployments/dep-1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn unauthorized_response_drops_cached_token() {
        let server = MockServer::start().await;
        mount_token(&server, 2).await;

        Mock::given(method("GET"))
            .and(path("/v1/deployments/dep-1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let client = Client::new(config(&server)).unwrap();
        for _ in 0..2 {
            let err = client
                .get::<Deployment>("/v1/deployments/dep-1")
                .await
                .unwrap_err();
            assert!(err.is_unauthorized());
        }
    }

    #[tokio::test]
    async fn late_unauthorized_keeps_newer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/deployments/fast"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/deployments/slow"))
            .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/deployments/dep-1"))
            .and(header("authorization", "Bearer second"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "dep-1",
                "name": "prod",
                "env_type": "k8s"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let mut sequence = Sequence::new();
        let mut auth = MockAuthenticator::new();
        auth.expect_authenticate()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|| Ok(fresh("first")));
        auth.expect_authenticate()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|| Ok(fresh("second")));

        let client = ClientBuilder::new(config(&server))
            .unwrap()
            .with_authenticator(Arc::new(auth))
            .build()
            .unwrap();
        client.refresh_token().await.unwrap();

        let slow = {
            let client = client.clone();
            tokio::spawn(async move { client.get::<Deployment>("/v1/deployments/slow").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = client
            .get::<Deployment>("/v1/deployments/fast")
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        let _: Deployment = client.get("/v1/deployments/dep-1").await.unwrap();

        // The slow 401 was for "first"; "second" must survive it.
        assert!(slow.await.unwrap().unwrap_err().is_unauthorized());
        let _: Deployment = client.get("/v1/deployments/dep-1").await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_requests_after_expiry_refresh_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/deployments/dep-1"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "dep-1",
                "name": "prod",
                "env_type": "k8s"
            })))
            .expect(8)
            .mount(&server)
            .await;

        let mut sequence = Sequence::new();
        let mut auth = MockAuthenticator::new();
        auth.expect_authenticate()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|| Ok(expired("stale")));
        auth.expect_authenticate()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|| Ok(fresh("fresh")));

        let client = ClientBuilder::new(config(&server))
            .unwrap()
            .with_authenticator(Arc::new(auth))
            .build()
            .unwrap();
        client.refresh_token().await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                client.get::<Deployment>("/v1/deployments/dep-1").await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    }
}
