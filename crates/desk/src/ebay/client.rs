//! eBay REST client with OAuth token lifecycle.
//!
//! The client owns the in-memory token cache and mirrors the user token pair
//! into the local store so a later run can pick up where this one left off.

use std::sync::Arc;
use std::time::Duration;

use listing_desk_core::{AuthState, Credentials, Listing, StoredTokens};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::instrument;

use super::auth::{self, Grant, TokenResponse};
use super::types::{InventoryItemPage, ItemSummaryPage};
use super::{ASSUMED_TOKEN_TTL_SECS, EbayError, Endpoints, REFRESH_AFTER_SECS};
use crate::config::EbayConfig;
use crate::store::{LocalStore, keys};

/// Default page size for listing and search calls.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// eBay REST client.
///
/// Cheap to clone; clones share the token cache.
#[derive(Clone)]
pub struct EbayClient {
    inner: Arc<EbayClientInner>,
}

struct EbayClientInner {
    http: reqwest::Client,
    config: EbayConfig,
    store: Arc<LocalStore>,
    credentials: RwLock<Credentials>,
    tokens: RwLock<TokenCache>,
}

/// In-memory token cache.
#[derive(Default)]
struct TokenCache {
    /// Token used for public calls (application token, or the user token
    /// when no application token has been requested).
    access_token: Option<SecretString>,
    /// User access token for seller-scoped calls.
    user_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
    refreshing: bool,
}

/// Summary of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserInfo {
    /// A user token is held.
    pub authenticated: bool,
    /// The stored token is younger than the assumed lifetime.
    pub has_valid_token: bool,
}

impl EbayClient {
    /// Create a client; credentials are supplied later with [`Self::initialize`].
    ///
    /// # Errors
    ///
    /// Returns `EbayError::Http` if the HTTP client cannot be built.
    pub fn new(config: &EbayConfig, store: Arc<LocalStore>, timeout: Duration) -> Result<Self, EbayError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let credentials = config.credentials.clone().unwrap_or_else(|| Credentials {
            sandbox: config.sandbox,
            ..Credentials::default()
        });

        Ok(Self {
            inner: Arc::new(EbayClientInner {
                http,
                config: config.clone(),
                store,
                credentials: RwLock::new(credentials),
                tokens: RwLock::new(TokenCache::default()),
            }),
        })
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Install credentials and reload any stored tokens.
    ///
    /// Returns whether the credentials are complete enough to request tokens.
    pub async fn initialize(&self, credentials: Credentials) -> bool {
        let usable = credentials.is_usable();
        *self.inner.credentials.write().await = credentials;
        self.load_stored_tokens().await;
        usable
    }

    /// Reload the user token pair from the store.
    ///
    /// Returns `true` when tokens were found.
    pub async fn load_stored_tokens(&self) -> bool {
        let Some(stored) = self.inner.store.get_or_log::<StoredTokens>(keys::TOKENS) else {
            return false;
        };

        let mut cache = self.inner.tokens.write().await;
        let access = SecretString::from(stored.access_token);
        cache.access_token = Some(access.clone());
        cache.user_token = Some(access);
        cache.refresh_token = stored.refresh_token.map(SecretString::from);
        true
    }

    /// Currently installed credentials.
    pub async fn credentials(&self) -> Credentials {
        self.inner.credentials.read().await.clone()
    }

    /// Endpoints for the active environment.
    pub async fn endpoints(&self) -> Endpoints {
        let sandbox = self.inner.credentials.read().await.sandbox;
        Endpoints::resolve(&self.inner.config, sandbox)
    }

    /// Where the session stands in the token lifecycle.
    pub async fn auth_state(&self) -> AuthState {
        let cache = self.inner.tokens.read().await;
        if cache.refreshing {
            AuthState::TokenRefreshing
        } else if cache.user_token.is_some() {
            AuthState::UserAuthorized
        } else if cache.access_token.is_some() {
            AuthState::ApplicationTokenOnly
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Whether a user token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.tokens.read().await.user_token.is_some()
    }

    /// Age in seconds of the stored token; infinite when nothing is stored.
    #[must_use]
    pub fn token_age(&self) -> f64 {
        self.inner
            .store
            .get::<StoredTokens>(keys::TOKENS)
            .ok()
            .flatten()
            .map_or(f64::INFINITY, |t| t.age_secs(now_ms()))
    }

    /// Authentication summary.
    pub async fn user_info(&self) -> UserInfo {
        #[allow(clippy::cast_precision_loss)]
        let ttl = ASSUMED_TOKEN_TTL_SECS as f64;
        UserInfo {
            authenticated: self.is_authenticated().await,
            has_valid_token: self.token_age() < ttl,
        }
    }

    /// Forget all tokens and any pending OAuth state.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::Store` if the store cannot be written.
    pub async fn clear_tokens(&self) -> Result<(), EbayError> {
        self.inner.store.remove(keys::TOKENS)?;
        self.inner.store.remove(keys::OAUTH_STATE)?;
        *self.inner.tokens.write().await = TokenCache::default();
        tracing::info!("cleared eBay tokens");
        Ok(())
    }

    /// Public page URL for an item.
    pub async fn item_page_url(&self, item_id: &str) -> String {
        self.endpoints().await.item_page(item_id)
    }

    // =========================================================================
    // OAuth
    // =========================================================================

    /// Obtain an application token via the client-credentials grant.
    ///
    /// The token is held in memory only.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::MissingCredentials` without credentials and
    /// `EbayError::TokenRequest` if the grant is rejected.
    #[instrument(skip(self))]
    pub async fn application_token(&self) -> Result<(), EbayError> {
        let response = self.grant(&Grant::ClientCredentials).await?;
        self.inner.tokens.write().await.access_token = Some(SecretString::from(response.access_token));
        tracing::info!("obtained eBay application token");
        Ok(())
    }

    /// Build the consent URL and remember a fresh anti-forgery state.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::MissingCredentials` without an app ID and
    /// `EbayError::Store` if the state cannot be saved.
    pub async fn authorization_url(&self, scopes: &[&str]) -> Result<String, EbayError> {
        let credentials = self.credentials().await;
        if credentials.app_id.is_empty() {
            return Err(EbayError::MissingCredentials);
        }

        let state = auth::generate_state();
        let endpoints = self.endpoints().await;
        let url = auth::authorization_url(&endpoints.signin, &credentials, scopes, &state)?;
        self.inner.store.set(keys::OAUTH_STATE, &state)?;
        Ok(url)
    }

    /// Exchange a consent code for a user token pair.
    ///
    /// `state` must match the value stored by [`Self::authorization_url`];
    /// the stored value is consumed on success.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::InvalidState` on mismatch (no request is sent) and
    /// `EbayError::TokenRequest` if the exchange is rejected.
    #[instrument(skip(self, code, state))]
    pub async fn exchange_code(&self, code: &str, state: &str) -> Result<StoredTokens, EbayError> {
        let stored_state = self.inner.store.get_or_log::<String>(keys::OAUTH_STATE);
        if stored_state.as_deref() != Some(state) {
            tracing::warn!("OAuth state mismatch");
            return Err(EbayError::InvalidState);
        }

        let redirect_uri = self.credentials().await.ru_name;
        let response = self
            .grant(&Grant::AuthorizationCode {
                code,
                redirect_uri: &redirect_uri,
            })
            .await?;

        self.inner.store.remove(keys::OAUTH_STATE)?;
        let stored = self.save_tokens(response).await?;
        tracing::info!("eBay user authorized");
        Ok(stored)
    }

    /// Refresh the user access token.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::NoRefreshToken` when none is held and
    /// `EbayError::TokenRequest` if the grant is rejected.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> Result<StoredTokens, EbayError> {
        let refresh_token = {
            let mut cache = self.inner.tokens.write().await;
            let Some(refresh_token) = cache.refresh_token.clone() else {
                return Err(EbayError::NoRefreshToken);
            };
            cache.refreshing = true;
            refresh_token
        };

        let result = self
            .grant(&Grant::RefreshToken {
                refresh_token: &refresh_token,
            })
            .await;

        let outcome = match result {
            Ok(response) => self.save_tokens(response).await,
            Err(e) => Err(e),
        };
        self.inner.tokens.write().await.refreshing = false;

        if outcome.is_ok() {
            tracing::info!("refreshed eBay user token");
        }
        outcome
    }

    /// Make sure a user token is held, refreshing it when it is getting old.
    ///
    /// A failed proactive refresh is logged and the existing token is kept.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::NotAuthenticated` when no user token is held.
    pub async fn ensure_valid_token(&self) -> Result<(), EbayError> {
        if !self.is_authenticated().await {
            return Err(EbayError::NotAuthenticated);
        }

        #[allow(clippy::cast_precision_loss)]
        let threshold = REFRESH_AFTER_SECS as f64;
        if self.token_age() > threshold
            && let Err(e) = self.refresh_access_token().await
        {
            tracing::warn!(error = %e, "token refresh failed");
        }

        Ok(())
    }

    async fn grant(&self, grant: &Grant<'_>) -> Result<TokenResponse, EbayError> {
        let credentials = self.credentials().await;
        if !credentials.is_usable() {
            return Err(EbayError::MissingCredentials);
        }
        let endpoints = self.endpoints().await;
        auth::request_token(&self.inner.http, &endpoints.token, &credentials, grant).await
    }

    async fn save_tokens(&self, response: TokenResponse) -> Result<StoredTokens, EbayError> {
        let mut cache = self.inner.tokens.write().await;
        let previous_refresh = cache
            .refresh_token
            .as_ref()
            .map(|t| t.expose_secret().to_string());
        let stored = response.into_stored(previous_refresh, now_ms());

        self.inner.store.set(keys::TOKENS, &stored)?;

        let access = SecretString::from(stored.access_token.clone());
        cache.access_token = Some(access.clone());
        cache.user_token = Some(access);
        cache.refresh_token = stored.refresh_token.clone().map(SecretString::from);
        Ok(stored)
    }

    // =========================================================================
    // Seller-scoped (user token) calls
    // =========================================================================

    /// Fetch the seller's inventory items.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::NotAuthenticated` without a user token,
    /// `EbayError::Unauthorized` if the token is rejected after one refresh,
    /// and `EbayError::Api` for other failures.
    #[instrument(skip(self))]
    pub async fn active_listings(&self, limit: u32, offset: u32) -> Result<Vec<Listing>, EbayError> {
        let url = format!("{}/sell/inventory/v1/inventory_item", self.endpoints().await.api);
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];

        let response = self
            .send_as_user(|http, token| http.get(&url).bearer_auth(token).query(&query))
            .await?;

        let page: InventoryItemPage = parse_response(response, "Failed to fetch listings").await?;
        let listings: Vec<Listing> = page.into();
        tracing::debug!(count = listings.len(), "fetched listings");
        Ok(listings)
    }

    /// Replace an inventory item.
    ///
    /// # Errors
    ///
    /// Same as [`Self::active_listings`].
    #[instrument(skip(self, update))]
    pub async fn update_listing(
        &self,
        sku: &str,
        update: &serde_json::Value,
    ) -> Result<serde_json::Value, EbayError> {
        let url = format!(
            "{}/sell/inventory/v1/inventory_item/{}",
            self.endpoints().await.api,
            urlencode_segment(sku)
        );

        let response = self
            .send_as_user(|http, token| http.put(&url).bearer_auth(token).json(update))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(response, "Failed to update listing").await);
        }

        // createOrReplaceInventoryItem answers 204 with no body.
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a user-token request, refreshing and retrying once on 401.
    async fn send_as_user<F>(&self, build: F) -> Result<reqwest::Response, EbayError>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    {
        self.ensure_valid_token().await?;

        let token = self.user_token().await?;
        let response = build(&self.inner.http, token.expose_secret()).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!("user token rejected, refreshing and retrying once");
        self.refresh_access_token().await?;

        let token = self.user_token().await?;
        let response = build(&self.inner.http, token.expose_secret()).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(EbayError::Unauthorized(body));
        }
        Ok(response)
    }

    async fn user_token(&self) -> Result<SecretString, EbayError> {
        self.inner
            .tokens
            .read()
            .await
            .user_token
            .clone()
            .ok_or(EbayError::NotAuthenticated)
    }

    // =========================================================================
    // Public (application token) calls
    // =========================================================================

    /// Search listings by seller.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::NoAccessToken` without a token and
    /// `EbayError::Api` for non-success responses.
    #[instrument(skip(self))]
    pub async fn seller_listings(&self, seller_id: &str) -> Result<ItemSummaryPage, EbayError> {
        let query = vec![
            ("q", format!("seller:{seller_id}")),
            ("limit", DEFAULT_PAGE_SIZE.to_string()),
        ];
        self.get_public("/browse/v1/item_summary/search", &query, "Failed to fetch seller listings")
            .await
    }

    /// Full details of a single item.
    ///
    /// # Errors
    ///
    /// See [`Self::seller_listings`].
    #[instrument(skip(self))]
    pub async fn item_details(&self, item_id: &str) -> Result<serde_json::Value, EbayError> {
        let path = format!("/browse/v1/item/{}", urlencode_segment(item_id));
        self.get_public(&path, &[], "Failed to fetch item details").await
    }

    /// Search the marketplace.
    ///
    /// # Errors
    ///
    /// See [`Self::seller_listings`].
    #[instrument(skip(self))]
    pub async fn search_items(
        &self,
        query: &str,
        category_id: Option<&str>,
        limit: u32,
    ) -> Result<ItemSummaryPage, EbayError> {
        let mut params = vec![("q", query.to_string()), ("limit", limit.to_string())];
        if let Some(category_id) = category_id {
            params.push(("category_ids", category_id.to_string()));
        }
        self.get_public("/browse/v1/item_summary/search", &params, "Search")
            .await
    }

    /// The default marketplace category tree.
    ///
    /// # Errors
    ///
    /// See [`Self::seller_listings`].
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<serde_json::Value, EbayError> {
        self.get_public("/commerce/taxonomy/v1/category_tree/0", &[], "Failed to fetch categories")
            .await
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation: &'static str,
    ) -> Result<T, EbayError> {
        let token = self
            .inner
            .tokens
            .read()
            .await
            .access_token
            .clone()
            .ok_or(EbayError::NoAccessToken)?;

        let url = format!("{}{}", self.endpoints().await.api, path);
        let response = self
            .inner
            .http
            .get(&url)
            .bearer_auth(token.expose_secret())
            .query(query)
            .send()
            .await?;

        parse_response(response, operation).await
    }
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<T, EbayError> {
    if !response.status().is_success() {
        return Err(api_error(response, operation).await);
    }
    Ok(response.json().await?)
}

async fn api_error(response: reqwest::Response, operation: &'static str) -> EbayError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status, operation, "eBay API error");
    EbayError::Api {
        operation,
        status,
        body,
    }
}

fn urlencode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(store: Arc<LocalStore>) -> EbayClient {
        EbayClient::new(&EbayConfig::default(), store, Duration::from_secs(5)).unwrap()
    }

    fn creds() -> Credentials {
        Credentials {
            app_id: "app".to_string(),
            cert_id: "cert".to_string(),
            dev_id: "dev".to_string(),
            ru_name: "ru".to_string(),
            sandbox: true,
        }
    }

    #[tokio::test]
    async fn test_starts_unauthenticated() {
        let client = client(Arc::new(LocalStore::in_memory()));
        assert_eq!(client.auth_state().await, AuthState::Unauthenticated);
        assert!(client.token_age().is_infinite());
        assert_eq!(
            client.user_info().await,
            UserInfo {
                authenticated: false,
                has_valid_token: false
            }
        );
    }

    #[tokio::test]
    async fn test_initialize_loads_stored_tokens() {
        let store = Arc::new(LocalStore::in_memory());
        store
            .set(
                keys::TOKENS,
                &StoredTokens {
                    access_token: "user".to_string(),
                    refresh_token: Some("refresh".to_string()),
                    expires_in: Some(7200),
                    timestamp: now_ms(),
                },
            )
            .unwrap();

        let client = client(store);
        assert!(client.initialize(creds()).await);
        assert_eq!(client.auth_state().await, AuthState::UserAuthorized);
        assert!(client.user_info().await.has_valid_token);
        assert_eq!(client.endpoints().await, Endpoints::sandbox());
    }

    #[tokio::test]
    async fn test_authorization_url_stores_state() {
        let store = Arc::new(LocalStore::in_memory());
        let client = client(Arc::clone(&store));
        client.initialize(creds()).await;

        let url = client.authorization_url(&[super::super::INVENTORY_SCOPE]).await.unwrap();
        let state: String = store.get(keys::OAUTH_STATE).unwrap().unwrap();
        assert!(url.contains(&format!("state={state}")));
        assert!(url.starts_with(&Endpoints::sandbox().signin));
    }

    #[tokio::test]
    async fn test_exchange_code_rejects_state_mismatch() {
        let store = Arc::new(LocalStore::in_memory());
        store.set(keys::OAUTH_STATE, "expected").unwrap();
        let client = client(store);
        client.initialize(creds()).await;

        let result = client.exchange_code("code", "forged").await;
        assert!(matches!(result, Err(EbayError::InvalidState)));

        // Without any stored state every value is a mismatch.
        client.clear_tokens().await.unwrap();
        let result = client.exchange_code("code", "expected").await;
        assert!(matches!(result, Err(EbayError::InvalidState)));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let client = client(Arc::new(LocalStore::in_memory()));
        let result = client.refresh_access_token().await;
        assert!(matches!(result, Err(EbayError::NoRefreshToken)));
        assert_eq!(client.auth_state().await, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_ensure_valid_token_requires_user_token() {
        let client = client(Arc::new(LocalStore::in_memory()));
        assert!(matches!(
            client.ensure_valid_token().await,
            Err(EbayError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_public_calls_need_a_token() {
        let client = client(Arc::new(LocalStore::in_memory()));
        assert!(matches!(
            client.categories().await,
            Err(EbayError::NoAccessToken)
        ));
    }

    #[tokio::test]
    async fn test_grants_need_credentials() {
        let client = client(Arc::new(LocalStore::in_memory()));
        assert!(matches!(
            client.application_token().await,
            Err(EbayError::MissingCredentials)
        ));
    }

    #[test]
    fn test_urlencode_segment() {
        assert_eq!(urlencode_segment("SKU 1/2"), "SKU%201%2F2");
    }
}
