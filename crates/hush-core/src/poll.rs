//! Status reconciliation poller.
//!
//! Some resources are provisioned asynchronously: a create or update returns immediately and
//! the backend reconciles in the background, exposing progress as a loosely typed status
//! string. [`wait_for_status`] polls a caller-supplied fetch until the status becomes terminal,
//! the wall-clock deadline passes, or the caller cancels. The iteration count is unbounded;
//! only the deadline limits it.

use crate::{Client, Error, Result};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default overall deadline for reaching a terminal status
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Default wait between status fetches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Deadline and cadence of a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Overall deadline
    pub timeout: Duration,
    /// Wait between fetches
    pub interval: Duration,
}

impl PollConfig {
    /// Create a poll configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: DEFAULT_POLL_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the overall deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the wait between fetches.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Backend resource status, mapped to a closed set at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Reconciliation in progress
    Syncing,
    /// Provisioned and healthy
    Ok,
    /// Reconciliation failed with a warning
    Warning,
    /// Reconciliation failed
    Error,
    /// Provisioned but disabled
    Disabled,
    /// Any value this client does not know about
    Other(String),
}

/// How the poller treats a [`ResourceStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Terminal, stop polling and succeed
    Success,
    /// Keep polling
    Transient,
    /// Terminal, stop polling and fail
    Failure,
}

impl ResourceStatus {
    /// Map a raw status string. Unrecognized values become [`ResourceStatus::Other`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "syncing" => Self::Syncing,
            "ok" => Self::Ok,
            "warning" => Self::Warning,
            "error" => Self::Error,
            "disabled" => Self::Disabled,
            other => Self::Other(other.to_string()),
        }
    }

    /// Classification used by the poller. Unknown values are transient.
    #[must_use]
    pub const fn class(&self) -> StatusClass {
        match self {
            Self::Ok | Self::Disabled => StatusClass::Success,
            Self::Warning | Self::Error => StatusClass::Failure,
            Self::Syncing | Self::Other(_) => StatusClass::Transient,
        }
    }

    /// The wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Syncing => "syncing",
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Disabled => "disabled",
            Self::Other(raw) => raw,
        }
    }
}

impl From<&str> for ResourceStatus {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource that reports backend reconciliation status.
pub trait StatusResource {
    /// Returns `(status, status_detail)`.
    fn status_fields(&self) -> (&str, &str);
}

/// Poll `fetch` until it reports a terminal status.
///
/// Each iteration checks `cancel`, calls `fetch`, and classifies the returned status. A fetch
/// error ends polling immediately. While the status is transient and the deadline has not
/// passed, the loop sleeps `config.interval` and tries again.
///
/// # Errors
///
/// - [`Error::PollFetch`] if `fetch` fails
/// - [`Error::PollFailure`] on `warning` or `error`
/// - [`Error::PollTimeout`] if still transient at the deadline
/// - [`Error::Cancelled`] if `cancel` fires
pub async fn wait_for_status<F, Fut>(
    config: &PollConfig,
    cancel: &CancellationToken,
    mut fetch: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(String, String)>>,
{
    let started = Instant::now();
    // A timeout too large to represent means no deadline.
    let deadline = started.checked_add(config.timeout);
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        attempt += 1;

        let (raw_status, detail) = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            fetched = fetch() => fetched.map_err(|err| Error::PollFetch(Box::new(err)))?,
        };

        let status = ResourceStatus::parse(&raw_status);
        debug!(attempt, %status, elapsed = ?started.elapsed(), "polled resource status");

        match status.class() {
            StatusClass::Success => return Ok(()),
            StatusClass::Failure => {
                warn!(%status, detail = %detail, "resource reached failure status");
                return Err(Error::PollFailure {
                    status: raw_status,
                    detail,
                });
            }
            StatusClass::Transient => {}
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            warn!(%status, attempt, "timed out waiting for terminal status");
            return Err(Error::PollTimeout { status: raw_status });
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            () = sleep(config.interval) => {}
        }
    }
}

/// Poll a resource by id until it reaches a terminal status.
///
/// `get` fetches the resource (normally a function built on [`Client::do_request`]); the
/// status is read through [`StatusResource`], so any resource kind exposing status fields
/// can be awaited without new polling logic.
///
/// # Errors
///
/// Same as [`wait_for_status`].
pub async fn wait_for_resource_status<T, G, Fut>(
    client: &Client,
    config: &PollConfig,
    cancel: &CancellationToken,
    id: &str,
    get: G,
) -> Result<()>
where
    T: StatusResource,
    G: Fn(Client, String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    wait_for_status(config, cancel, || {
        let pending = get(client.clone(), id.to_string());
        async move {
            let resource = pending.await?;
            let (status, detail) = resource.status_fields();
            Ok((status.to_string(), detail.to_string()))
        }
    })
    .await
}
