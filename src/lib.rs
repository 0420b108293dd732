//! # refresh-collector
//!
//! Collects dataset refresh history from the Power BI REST API and normalizes
//! it into versioned, deterministically identified refresh events.
//!
//! The crate is split along the request path:
//!
//! - [`auth`] acquires bearer tokens (cached, then client-credentials exchange).
//! - [`client`] executes authenticated requests, classifies failures and retries.
//! - [`normalize`] maps raw refresh records to [`RefreshEvent`]s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use refresh_collector::{CollectorConfig, PowerBiClient, RefreshContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), refresh_collector::Error> {
//!     let config = CollectorConfig::from_env()?;
//!     let client = PowerBiClient::from_config(&config)?;
//!
//!     let context = RefreshContext::new("workspace-id", "dataset-id");
//!     for event in client.refresh_events(&context, Some(10)).await? {
//!         println!("{} {}", event.refresh_id, event.status);
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod auth;
pub mod client;
pub mod config;
pub mod normalize;
#[cfg(feature = "cli")]
pub mod observability;

pub use auth::{AccessToken, ClientCredentialsProvider, StaticTokenProvider, TokenProvider};
pub use client::{
    ExponentialBackoff, Payload, PowerBiClient, PowerBiClientBuilder, RequestExecutor,
    RetryConfig, RetryDecision, RetryPolicy, parse_retry_after,
};
pub use config::{CollectorConfig, ConfigError};
pub use normalize::{
    RawRecord, RefreshContext, RefreshEvent, SCHEMA_VERSION, normalize_refresh_event,
    normalize_refresh_history,
};

use std::time::Duration;

/// Error type for refresh-collector operations.
///
/// Every upstream failure maps to exactly one variant so callers can pick a
/// distinct exit code or recovery path per kind.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Token acquisition failed, or the API rejected the token (401/403).
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Requested workspace or dataset does not exist (404).
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// API rate limit exceeded (429).
    #[error("Rate limited{}", match retry_after {
        Some(d) => format!(", retry in {:.1}s", d.as_secs_f64()),
        None => String::new(),
    })]
    RateLimit { retry_after: Option<Duration> },

    /// Transient server fault (5xx).
    #[error("Server error (HTTP {status}): {message}")]
    Server {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },

    /// Client-side request fault (any other 4xx).
    #[error("Request failed (HTTP {status}): {message}")]
    Request { status: u16, message: String },

    /// Successful status with a body that is not valid JSON.
    #[error("Invalid response body: {0}")]
    Protocol(String),

    /// A raw record cannot be mapped to the canonical event schema.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Transport failure before any status was received.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials missing or rejected (401, 403, token exchange)
    Authorization,
    /// Resource absent (404)
    NotFound,
    /// Rate limits and 5xx faults that may succeed on retry
    Transient,
    /// Malformed requests and unparseable responses
    Request,
    /// Raw record could not be normalized
    Validation,
    /// Transport-level failure
    Network,
    /// Invalid setup
    Configuration,
}

impl Error {
    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Auth { .. } => ErrorCategory::Authorization,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::RateLimit { .. } | Error::Server { .. } => ErrorCategory::Transient,
            Error::Request { .. } | Error::Protocol(_) => ErrorCategory::Request,
            Error::Validation(_) => ErrorCategory::Validation,
            Error::Network(_) => ErrorCategory::Network,
            Error::Config(_) => ErrorCategory::Configuration,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::RateLimit { .. } => Some(429),
            Error::Server { status, .. } | Error::Request { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Server-directed wait before the next attempt, if the response carried one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimit { retry_after } | Error::Server { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
