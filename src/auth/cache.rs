//! In-process token cache.

use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::AccessToken;

/// Tokens are treated as expired this long before the issuer's deadline.
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Lifetime assumed when the issuer does not report `expires_in`.
pub(crate) const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

pub struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl CachedToken {
    pub fn new(token: AccessToken) -> Self {
        let ttl = token.expires_in().unwrap_or(DEFAULT_TOKEN_TTL);
        Self {
            token,
            expires_at: Instant::now() + ttl.saturating_sub(TOKEN_REFRESH_MARGIN),
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }
}

/// Single-slot cache shared by one provider.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached token if present and not within the refresh margin.
    pub async fn get(&self) -> Option<AccessToken> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|cached| !cached.is_expired())
            .map(|cached| cached.token().clone())
    }

    pub async fn store(&self, token: AccessToken) {
        *self.slot.write().await = Some(CachedToken::new(token));
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}
