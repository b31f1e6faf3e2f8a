//! OAuth client-credentials exchange.
//!
//! The [`Authenticator`] trait is the seam between the token store and the token endpoint;
//! [`HttpAuthenticator`] is the production implementation. No retries happen here: a failed
//! exchange surfaces immediately and the caller decides whether to try the whole operation
//! again.

use crate::error::ApiError;
use crate::token::{Token, TokenResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

/// Obtains fresh access tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Perform one token exchange and return the token stamped with its issue time.
    async fn authenticate(&self) -> Result<Token>;
}

/// Client-credentials grant against the Hush token endpoint.
///
/// Sends `grant_type=client_credentials` as a form body with HTTP basic authentication.
pub struct HttpAuthenticator {
    http: Client,
    token_url: Url,
    client_id: String,
    client_secret: SecretString,
}

impl HttpAuthenticator {
    /// Create an authenticator for the given token endpoint.
    #[must_use]
    pub fn new(
        http: Client,
        token_url: Url,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            http,
            token_url,
            client_id: client_id.into(),
            client_secret,
        }
    }

    /// The token endpoint this authenticator posts to.
    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }
}

impl std::fmt::Debug for HttpAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthenticator")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn authenticate(&self) -> Result<Token> {
        let response = self
            .http
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|err| Error::Transport(format!("auth request failed: {err}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| Error::Transport(format!("read auth response: {err}")))?;

        debug!(status_code = status.as_u16(), "auth response");

        if status != StatusCode::OK {
            warn!(status_code = status.as_u16(), "token endpoint rejected credentials");
            return Err(Error::Api(ApiError::from_response(
                &Method::POST,
                self.token_url.as_str(),
                status,
                &body,
            )));
        }

        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|err| Error::Decode(format!("auth decode failed: {err}")))?;

        Token::from_response(parsed, Utc::now())
    }
}
