//! Collector settings.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use super::env::EnvReader;
use super::{ConfigError, ConfigResult};
use crate::client::RetryConfig;

pub const DEFAULT_SCOPE: &str = "https://analysis.windows.net/powerbi/api/.default";
pub const DEFAULT_API_BASE: &str = "https://api.powerbi.com/v1.0/myorg";
pub const DEFAULT_USER_AGENT: &str = "pbi-refresh-monitor/0.1";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Everything needed to authenticate and talk to the Power BI REST API.
#[derive(Clone, Debug)]
pub struct CollectorConfig {
    /// Entra ID tenant that owns the service principal.
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub scope: String,
    pub api_base: String,
    pub http_timeout: Duration,
    pub retry: RetryConfig,
    pub user_agent: String,
    /// Upper-cased level name (`INFO`, `DEBUG`, ...).
    pub log_level: String,
}

impl CollectorConfig {
    /// Load from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_reader(&EnvReader::process())
    }

    /// Load from an arbitrary lookup, e.g. a fixed map in tests.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> ConfigResult<Self> {
        Self::from_reader(&EnvReader::new(lookup))
    }

    pub fn from_reader(env: &EnvReader) -> ConfigResult<Self> {
        let tenant_id = env.required("AZURE_TENANT_ID")?;
        let client_id = env.required("AZURE_CLIENT_ID")?;
        let client_secret = SecretString::from(env.required("AZURE_CLIENT_SECRET")?);

        let api_base = env.string_or("POWERBI_API_BASE", DEFAULT_API_BASE);
        validate_url("POWERBI_API_BASE", &api_base)?;

        let http_timeout = seconds(
            "POWERBI_HTTP_TIMEOUT_SEC",
            env.parse_or("POWERBI_HTTP_TIMEOUT_SEC", DEFAULT_HTTP_TIMEOUT.as_secs_f64())?,
        )?;

        let defaults = RetryConfig::default();
        let max_attempts = env.parse_or("POWERBI_RETRY_MAX_ATTEMPTS", defaults.max_attempts)?;
        if max_attempts == 0 {
            return Err(ConfigError::invalid(
                "POWERBI_RETRY_MAX_ATTEMPTS",
                "must be at least 1",
            ));
        }
        let backoff_min = seconds(
            "POWERBI_RETRY_BACKOFF_MIN_SEC",
            env.parse_or(
                "POWERBI_RETRY_BACKOFF_MIN_SEC",
                defaults.backoff_min.as_secs_f64(),
            )?,
        )?;
        let backoff_max = seconds(
            "POWERBI_RETRY_BACKOFF_MAX_SEC",
            env.parse_or(
                "POWERBI_RETRY_BACKOFF_MAX_SEC",
                defaults.backoff_max.as_secs_f64(),
            )?,
        )?;
        if backoff_min > backoff_max {
            return Err(ConfigError::invalid(
                "POWERBI_RETRY_BACKOFF_MIN_SEC",
                format!(
                    "{:.3}s exceeds POWERBI_RETRY_BACKOFF_MAX_SEC ({:.3}s)",
                    backoff_min.as_secs_f64(),
                    backoff_max.as_secs_f64()
                ),
            ));
        }

        Ok(Self {
            tenant_id,
            client_id,
            client_secret,
            scope: env.string_or("POWERBI_SCOPE", DEFAULT_SCOPE),
            api_base,
            http_timeout,
            retry: RetryConfig {
                max_attempts,
                backoff_min,
                backoff_max,
            },
            user_agent: env.string_or("POWERBI_USER_AGENT", DEFAULT_USER_AGENT),
            log_level: env.string_or("LOG_LEVEL", DEFAULT_LOG_LEVEL).to_uppercase(),
        })
    }
}

fn validate_url(key: &str, value: &str) -> ConfigResult<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::invalid(key, format!("{value:?}: {e}")))
}

fn seconds(key: &str, value: f64) -> ConfigResult<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| ConfigError::invalid(key, format!("{value}: {e}")))
}
