//! Collector configuration loaded from environment variables.
//!
//! ```rust,no_run
//! use refresh_collector::config::CollectorConfig;
//!
//! # fn example() -> Result<(), refresh_collector::config::ConfigError> {
//! let config = CollectorConfig::from_env()?;
//! assert!(config.retry.max_attempts >= 1);
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod env;

pub use collector::{
    CollectorConfig, DEFAULT_API_BASE, DEFAULT_SCOPE, DEFAULT_USER_AGENT,
};
pub use env::EnvReader;

use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable unset or empty
    #[error("Missing required environment variable: {key}")]
    Missing {
        /// The variable that was not set
        key: String,
    },

    /// Variable set but not usable
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The variable with the invalid value
        key: String,
        /// Why the value was rejected
        message: String,
    },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
