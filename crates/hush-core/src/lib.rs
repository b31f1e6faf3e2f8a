//! # hush-core
//!
//! Client substrate for the Hush Security management API.
//!
//! This crate owns everything that touches the wire: the OAuth client-credentials token
//! lifecycle, the authenticated request dispatcher with its error taxonomy, and the status
//! poller used for resources the backend provisions asynchronously. Resource-specific CRUD
//! lives in collaborator crates that call [`Client::do_request`] and
//! [`poll::wait_for_resource_status`].
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and HTTP status classification
//! - [`config`] - Client configuration, realms, and environment loading
//! - [`token`] - Bearer token type and the shared token store
//! - [`auth`] - OAuth client-credentials exchange
//! - [`client`] - Authenticated request dispatcher
//! - [`poll`] - Status reconciliation poller
//! - [`query`] - Query parameter helper

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod poll;
pub mod query;
pub mod token;

// Re-export commonly used types
pub use client::{Client, ClientBuilder};
pub use error::{ApiError, ApiErrorKind, Error, Result};
pub use poll::{PollConfig, ResourceStatus, StatusResource};
pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
