//! Access token type.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Opaque bearer token issued by the identity provider.
///
/// The token value is never printed by `Debug` and should not be persisted.
#[derive(Clone)]
pub struct AccessToken {
    secret: SecretString,
    expires_in: Option<Duration>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(token.into()),
            expires_in: None,
        }
    }

    /// Lifetime reported by the identity provider at issue time.
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }

    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.secret.expose_secret())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[redacted]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let token = AccessToken::new("abc");
        assert_eq!(token.bearer(), "Bearer abc");
        assert_eq!(token.secret(), "abc");
        assert!(token.expires_in().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken::new("super-secret").with_expires_in(Duration::from_secs(60));
        let debug = format!("{:?}", token);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("redacted"));
    }
}
