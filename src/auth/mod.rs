//! Bearer token acquisition for the Power BI REST API.
//!
//! - **Client credentials**: OAuth2 `client_credentials` grant against an Entra ID
//!   tenant, with an in-process token cache tried first
//! - **Static**: a pre-issued token, mostly for tests and local debugging

mod cache;
mod client_credentials;
mod credential;
mod explicit;
mod provider;

pub use cache::{CachedToken, TOKEN_REFRESH_MARGIN, TokenCache};
pub use client_credentials::ClientCredentialsProvider;
pub use credential::AccessToken;
pub use explicit::StaticTokenProvider;
pub use provider::TokenProvider;
