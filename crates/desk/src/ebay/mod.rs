//! eBay REST API client.
//!
//! # Architecture
//!
//! - OAuth 2.0: client-credentials grant for public (Browse/Taxonomy) calls,
//!   authorization-code grant for seller-scoped (Inventory) calls
//! - Tokens persisted in the local store with their issue time; the cached
//!   user token is refreshed once it is older than 50 minutes
//! - Seller-scoped calls that get a 401 refresh and retry exactly once
//!
//! # OAuth Flow
//!
//! 1. `EbayClient::application_token()` with the app credentials
//! 2. `EbayClient::authorization_url()` stores a random state and returns the consent URL
//! 3. The seller approves and eBay redirects back with `code` and `state`
//! 4. `EbayClient::exchange_code()` checks the state and stores the token pair
//!
//! # Example
//!
//! ```rust,ignore
//! let client = EbayClient::new(&config.ebay, store, timeout)?;
//! client.initialize(credentials).await;
//! client.application_token().await?;
//! let url = client.authorization_url(&[INVENTORY_SCOPE]).await?;
//! // ...after the redirect
//! client.exchange_code(&code, &state).await?;
//! let listings = client.active_listings(50, 0).await?;
//! ```

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{INVENTORY_SCOPE, PUBLIC_SCOPE};
pub use client::{EbayClient, UserInfo};
pub use types::*;

use thiserror::Error;

use crate::config::EbayConfig;
use crate::store::StoreError;

/// Token age (seconds) after which a proactive refresh is attempted.
pub const REFRESH_AFTER_SECS: i64 = 3000;

/// Token age (seconds) below which a cached token is reported valid.
pub const ASSUMED_TOKEN_TTL_SECS: i64 = 3600;

/// Errors that can occur when interacting with the eBay APIs.
#[derive(Debug, Error)]
pub enum EbayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Local store failure while reading or writing tokens.
    #[error("token storage error: {0}")]
    Store(#[from] StoreError),

    /// Credentials have not been supplied.
    #[error("eBay credentials are not configured")]
    MissingCredentials,

    /// The state returned by the consent page does not match the stored one.
    #[error("Invalid OAuth state parameter")]
    InvalidState,

    /// The consent page returned an error instead of a code.
    #[error("eBay authorization failed: {0}")]
    AuthorizationDenied(String),

    /// A token grant was rejected.
    #[error("{grant} failed: {status}: {message}")]
    TokenRequest {
        /// Which grant failed.
        grant: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Refresh requested without a refresh token.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Seller-scoped call without a user token.
    #[error("User not authenticated")]
    NotAuthenticated,

    /// Public call without any access token.
    #[error("No access token - request an application token first")]
    NoAccessToken,

    /// The user token was still rejected after one refresh.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success response.
    #[error("{operation} failed: {status}")]
    Api {
        /// The operation that failed.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// Base URLs for one eBay environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// REST API base.
    pub api: String,
    /// OAuth token endpoint.
    pub token: String,
    /// User consent endpoint.
    pub signin: String,
    /// Public item page base (`{item}/itm/{id}`).
    pub item: String,
}

impl Endpoints {
    /// Production endpoints.
    #[must_use]
    pub fn production() -> Self {
        Self {
            api: "https://api.ebay.com".to_string(),
            token: "https://auth.ebay.com/oauth/api_request".to_string(),
            signin: "https://signin.ebay.com/authorize".to_string(),
            item: "https://www.ebay.com".to_string(),
        }
    }

    /// Sandbox endpoints.
    #[must_use]
    pub fn sandbox() -> Self {
        Self {
            api: "https://api.sandbox.ebay.com".to_string(),
            token: "https://auth.sandbox.ebay.com/oauth/api_request".to_string(),
            signin: "https://auth.sandbox.ebay.com/oauth/authorize".to_string(),
            item: "https://www.sandbox.ebay.com".to_string(),
        }
    }

    /// Endpoints for the requested environment with configured overrides applied.
    #[must_use]
    pub fn resolve(config: &EbayConfig, sandbox: bool) -> Self {
        let base = if sandbox {
            Self::sandbox()
        } else {
            Self::production()
        };

        Self {
            api: config.api_url.clone().unwrap_or(base.api),
            token: config.token_url.clone().unwrap_or(base.token),
            signin: config.signin_url.clone().unwrap_or(base.signin),
            item: config.item_url.clone().unwrap_or(base.item),
        }
    }

    /// Public page URL for an item.
    #[must_use]
    pub fn item_page(&self, item_id: &str) -> String {
        format!("{}/itm/{}", self.item.trim_end_matches('/'), item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_picks_environment() {
        let config = EbayConfig::default();
        assert_eq!(Endpoints::resolve(&config, false), Endpoints::production());
        assert_eq!(Endpoints::resolve(&config, true), Endpoints::sandbox());
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let config = EbayConfig {
            api_url: Some("http://127.0.0.1:9000".to_string()),
            ..EbayConfig::default()
        };
        let endpoints = Endpoints::resolve(&config, true);
        assert_eq!(endpoints.api, "http://127.0.0.1:9000");
        assert_eq!(endpoints.token, Endpoints::sandbox().token);
    }

    #[test]
    fn test_item_page() {
        assert_eq!(
            Endpoints::sandbox().item_page("110553"),
            "https://www.sandbox.ebay.com/itm/110553"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(EbayError::InvalidState.to_string(), "Invalid OAuth state parameter");
        let err = EbayError::Api {
            operation: "Fetch listings",
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "Fetch listings failed: 500");
    }
}
