//! Bearer tokens and the shared token store.
//!
//! A [`Token`] is replaced wholesale on every refresh. The [`TokenStore`] guards the current
//! token with a reader/writer lock and serialises refreshes behind a single in-flight guard,
//! so concurrent callers that all observe an expired token trigger exactly one refresh.

use crate::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Safety margin, in seconds, before expiry at which a token is considered stale.
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 30;

/// Token endpoint response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Opaque bearer credential
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// Token type, normally `Bearer`
    #[serde(default)]
    pub token_type: String,
}

/// An access token stamped with the instant it was acquired.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    access_token: String,
    token_type: String,
    expires_in: TimeDelta,
    issued_at: DateTime<Utc>,
}

impl Token {
    /// Create a token issued at `issued_at` and valid for `expires_in`.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in: TimeDelta,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_in,
            issued_at,
        }
    }

    /// Build a token from a token endpoint response received at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if `access_token` is empty.
    pub fn from_response(response: TokenResponse, issued_at: DateTime<Utc>) -> Result<Self> {
        if response.access_token.is_empty() {
            return Err(Error::Auth(
                "auth succeeded but access_token is empty".to_string(),
            ));
        }

        let expires_in = TimeDelta::try_seconds(response.expires_in).ok_or_else(|| {
            Error::Decode(format!("expires_in out of range: {}", response.expires_in))
        })?;

        Ok(Self::new(
            response.access_token,
            response.token_type,
            expires_in,
            issued_at,
        ))
    }

    /// The bearer credential.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The token type reported by the server.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// When the client acquired the token.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Absolute expiry instant reported by the server.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at
            .checked_add_signed(self.expires_in)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// True when the token is inside the skew window (or past expiry) at `now`.
    #[must_use]
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at() - TimeDelta::seconds(TOKEN_EXPIRY_SKEW_SECS)
    }

    /// True when the token should be refreshed now.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Shared holder of the current token.
#[derive(Debug, Default)]
pub struct TokenStore {
    current: RwLock<Option<Token>>,
    refresh_guard: Mutex<()>,
}

impl TokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current token, if any.
    pub async fn current(&self) -> Option<Token> {
        self.current.read().await.clone()
    }

    /// True when the store is empty or the token is stale.
    pub async fn needs_refresh(&self) -> bool {
        Self::stale(self.current.read().await.as_ref(), Utc::now())
    }

    /// Drop the cached token if it is still the one the server rejected.
    ///
    /// A token installed by a concurrent refresh is kept. Returns true if the store was cleared.
    pub async fn invalidate(&self, rejected: &str) -> bool {
        let mut current = self.current.write().await;
        if current
            .as_ref()
            .is_some_and(|token| token.access_token() == rejected)
        {
            *current = None;
            true
        } else {
            false
        }
    }

    /// Return a usable access token, refreshing through `refresh` if needed.
    ///
    /// # Errors
    ///
    /// Propagates whatever `refresh` returns.
    pub async fn ensure_valid<F, Fut>(&self, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token>>,
    {
        self.ensure_valid_with(Utc::now, refresh).await
    }

    /// [`TokenStore::ensure_valid`] evaluated against an explicit clock reading.
    ///
    /// # Errors
    ///
    /// Propagates whatever `refresh` returns.
    pub async fn ensure_valid_at<F, Fut>(&self, now: DateTime<Utc>, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token>>,
    {
        self.ensure_valid_with(|| now, refresh).await
    }

    async fn ensure_valid_with<C, F, Fut>(&self, clock: C, refresh: F) -> Result<String>
    where
        C: Fn() -> DateTime<Utc>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token>>,
    {
        if let Some(token) = self.usable(clock()).await {
            return Ok(token);
        }

        let _in_flight = self.refresh_guard.lock().await;

        // Another caller may have refreshed while we waited for the guard, and the wait itself
        // may have outlived the token, so the clock is read again.
        if let Some(token) = self.usable(clock()).await {
            debug!("token refreshed by concurrent caller");
            return Ok(token);
        }

        Ok(self.install(refresh().await?).await)
    }

    /// Unconditionally refresh through `refresh` and install the result.
    ///
    /// # Errors
    ///
    /// Propagates whatever `refresh` returns; the previous token is kept on failure.
    pub async fn refresh_with<F, Fut>(&self, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token>>,
    {
        let _in_flight = self.refresh_guard.lock().await;
        Ok(self.install(refresh().await?).await)
    }

    async fn install(&self, token: Token) -> String {
        let access_token = token.access_token().to_string();
        debug!(expires_at = %token.expires_at(), "installed new access token");
        *self.current.write().await = Some(token);
        access_token
    }

    async fn usable(&self, now: DateTime<Utc>) -> Option<String> {
        let guard = self.current.read().await;
        if Self::stale(guard.as_ref(), now) {
            None
        } else {
            guard.as_ref().map(|t| t.access_token().to_string())
        }
    }

    fn stale(token: Option<&Token>, now: DateTime<Utc>) -> bool {
        token.map_or(true, |t| t.needs_refresh_at(now))
    }
}
