//! Token provider trait.

use async_trait::async_trait;

use super::AccessToken;
use crate::Result;

/// Source of bearer tokens for API requests.
///
/// Called once per request attempt; implementations are expected to cache.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Provider name for debugging.
    fn name(&self) -> &str;

    /// Return a usable token, from cache when possible.
    async fn get_access_token(&self) -> Result<AccessToken>;

    /// Drop any cached token so the next call acquires a fresh one.
    async fn invalidate(&self) {}
}
