//! Static token provider.

use async_trait::async_trait;

use super::{AccessToken, TokenProvider};
use crate::Result;

/// Provider that always returns the same pre-issued token.
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn get_access_token(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticTokenProvider::new("test-token");
        let token = provider.get_access_token().await.unwrap();
        assert_eq!(token.secret(), "test-token");
        assert_eq!(provider.name(), "static");
    }
}
