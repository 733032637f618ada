//! eBay OAuth 2.0 grants.
//!
//! Every grant posts a form-encoded body to the token endpoint with HTTP
//! Basic authentication (`app_id:cert_id`).

use listing_desk_core::{Credentials, StoredTokens};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::EbayError;

/// Scope for client-credentials (public) tokens.
pub const PUBLIC_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";

/// Default scope requested for seller consent.
pub const INVENTORY_SCOPE: &str = "https://api.ebay.com/oauth/api_scope/sell.inventory";

const STATE_LENGTH: usize = 32;

/// An OAuth grant sent to the token endpoint.
#[derive(Debug)]
pub enum Grant<'a> {
    /// Application token for public endpoints.
    ClientCredentials,
    /// Exchange a consent code for a user token pair.
    AuthorizationCode { code: &'a str, redirect_uri: &'a str },
    /// Obtain a fresh user access token.
    RefreshToken { refresh_token: &'a SecretString },
}

impl Grant<'_> {
    /// Name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "Application token request",
            Self::AuthorizationCode { .. } => "Token exchange",
            Self::RefreshToken { .. } => "Token refresh",
        }
    }

    fn form(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::ClientCredentials => vec![
                ("grant_type", "client_credentials"),
                ("scope", PUBLIC_SCOPE),
            ],
            Self::AuthorizationCode { code, redirect_uri } => vec![
                ("grant_type", "authorization_code"),
                ("code", *code),
                ("redirect_uri", *redirect_uri),
            ],
            Self::RefreshToken { refresh_token } => vec![
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret()),
            ],
        }
    }
}

/// Raw response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Convert into the persisted record, keeping `previous_refresh` when the
    /// response carries no new refresh token.
    #[must_use]
    pub fn into_stored(self, previous_refresh: Option<String>, now_ms: i64) -> StoredTokens {
        StoredTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_in: self.expires_in,
            timestamp: now_ms,
        }
    }
}

/// Generate a random anti-forgery state value.
#[must_use]
pub fn generate_state() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..STATE_LENGTH)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

/// Build the consent URL the seller is sent to.
///
/// # Errors
///
/// Returns `url::ParseError` if `signin_endpoint` is not a valid URL.
pub fn authorization_url(
    signin_endpoint: &str,
    credentials: &Credentials,
    scopes: &[&str],
    state: &str,
) -> Result<String, url::ParseError> {
    let scope = scopes.join(" ");
    let url = Url::parse_with_params(
        signin_endpoint,
        &[
            ("client_id", credentials.app_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", credentials.ru_name.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
        ],
    )?;
    Ok(url.into())
}

/// Post a grant to the token endpoint.
///
/// # Errors
///
/// Returns `EbayError::TokenRequest` for non-success responses and
/// `EbayError::Http` for transport failures.
#[instrument(skip(client, credentials, grant), fields(grant = grant.name()))]
pub async fn request_token(
    client: &reqwest::Client,
    token_endpoint: &str,
    credentials: &Credentials,
    grant: &Grant<'_>,
) -> Result<TokenResponse, EbayError> {
    let response = client
        .post(token_endpoint)
        .basic_auth(&credentials.app_id, Some(&credentials.cert_id))
        .form(&grant.form())
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!(status = status.as_u16(), "token endpoint rejected grant");
        return Err(EbayError::TokenRequest {
            grant: grant.name(),
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json().await?)
}
