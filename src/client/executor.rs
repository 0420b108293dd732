//! Authenticated request execution with retry.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use uuid::Uuid;

use super::classify::{Payload, classify};
use super::resilience::RetryPolicy;
use crate::auth::TokenProvider;
use crate::{Error, Result};

/// Per-request correlation header understood by the Power BI service.
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Sends requests relative to an API base URL.
///
/// Every attempt fetches a token from the provider and carries a fresh
/// correlation id. Responses are classified into [`Payload`] or a typed
/// [`Error`]; only transient classes are retried, per the [`RetryPolicy`].
pub struct RequestExecutor {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.base_url)
            .field("tokens", &self.tokens.name())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            policy,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `method path?query`, retrying transient failures.
    ///
    /// On exhaustion the last classified error is returned as-is.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Payload> {
        self.policy
            .run(|attempt| self.execute_once(method.clone(), path, query, attempt))
            .await
    }

    async fn execute_once(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        attempt: u32,
    ) -> Result<Payload> {
        let token = self.tokens.get_access_token().await?;
        let request_id = Uuid::new_v4();
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(AUTHORIZATION, token.bearer())
            .header(CLIENT_REQUEST_ID_HEADER, request_id.to_string());
        if !query.is_empty() {
            request = request.query(query);
        }

        tracing::debug!(attempt, %method, path, %request_id, "Sending request");
        let response = request.send().await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;
        tracing::debug!(
            attempt,
            %method,
            path,
            %request_id,
            status = status.as_u16(),
            "Received response"
        );

        let result = classify(status.as_u16(), retry_after.as_deref(), &body);
        if let Err(Error::Auth { .. }) = &result {
            // Rejected token must not be served from cache on the next call.
            self.tokens.invalidate().await;
        }
        result
    }
}
