//! OAuth2 client-credentials provider for Entra ID.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use azure_core::credentials::{Secret, TokenCredential};
use azure_identity::ClientSecretCredential;
use secrecy::{ExposeSecret, SecretString};

use super::{AccessToken, TokenCache, TokenProvider};
use crate::config::CollectorConfig;
use crate::{Error, Result};

/// Acquires app-only tokens for a service principal.
///
/// A cached token is returned while it is outside the refresh margin;
/// otherwise the tenant's token endpoint is asked for a fresh one through
/// [`ClientSecretCredential`]. Failures are reported as [`Error::Auth`] and
/// never retried here.
pub struct ClientCredentialsProvider {
    credential: Arc<ClientSecretCredential>,
    tenant_id: String,
    client_id: String,
    scope: String,
    cache: TokenCache,
}

impl fmt::Debug for ClientCredentialsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsProvider")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ClientCredentialsProvider {
    pub fn new(
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: SecretString,
        scope: impl Into<String>,
    ) -> Result<Self> {
        let client_id = client_id.into();
        let credential = ClientSecretCredential::new(
            tenant_id,
            client_id.clone(),
            Secret::new(client_secret.expose_secret().to_string()),
            None,
        )
        .map_err(|e| Error::auth(format!("Failed to create Azure credential: {}", e)))?;

        Ok(Self {
            credential,
            tenant_id: tenant_id.to_string(),
            client_id,
            scope: scope.into(),
            cache: TokenCache::new(),
        })
    }

    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        Self::new(
            &config.tenant_id,
            config.client_id.clone(),
            config.client_secret.clone(),
            config.scope.clone(),
        )
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    async fn acquire_for_client(&self) -> Result<AccessToken> {
        let issued = self
            .credential
            .get_token(&[self.scope.as_str()], None)
            .await
            .map_err(|e| {
                tracing::debug!(client_id = %self.client_id, error = %e, "Token acquisition failed");
                acquisition_failed(e)
            })?;

        let mut token = AccessToken::new(issued.token.secret());
        if let Some(lifetime) =
            remaining_lifetime(issued.expires_on.unix_timestamp(), chrono::Utc::now().timestamp())
        {
            token = token.with_expires_in(lifetime);
        }
        tracing::debug!(
            client_id = %self.client_id,
            expires_in = ?token.expires_in(),
            "Acquired token via client credentials"
        );
        Ok(token)
    }
}

/// Identity service errors (e.g. `AADSTS7000215`) are carried verbatim.
fn acquisition_failed(error: impl fmt::Display) -> Error {
    Error::auth(format!("Token acquisition failed: {}", error))
}

/// Seconds left until `expires_on`; `None` once the deadline has passed.
fn remaining_lifetime(expires_on: i64, now: i64) -> Option<Duration> {
    u64::try_from(expires_on - now).ok().map(Duration::from_secs)
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    fn name(&self) -> &str {
        "client_credentials"
    }

    async fn get_access_token(&self) -> Result<AccessToken> {
        if let Some(token) = self.cache.get().await {
            tracing::trace!("Token cache hit");
            return Ok(token);
        }

        let token = self.acquire_for_client().await?;
        self.cache.store(token.clone()).await;
        Ok(token)
    }

    async fn invalidate(&self) {
        self.cache.clear().await;
    }
}
