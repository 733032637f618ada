//! Consent flow, token lifecycle and the seller-call retry against a fake eBay.

#![allow(clippy::unwrap_used)]

use listing_desk::ebay::EbayError;
use listing_desk::store::{LocalStore, keys};
use listing_desk::{DeskError, ListingDesk};
use listing_desk_core::{AuthState, StoredTokens};
use listing_desk_integration_tests::{FakeUpstream, credentials};
use serde_json::json;
use url::Url;

fn now_ms() -> i64 {
    let elapsed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap();
    i64::try_from(elapsed.as_millis()).unwrap()
}

fn state_param(authorize_url: &str) -> String {
    Url::parse(authorize_url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

/// Run the consent flow to completion.
async fn authorized_desk(upstream: &FakeUpstream, dir: &std::path::Path) -> ListingDesk {
    let desk = upstream.desk(dir).await;
    let url = desk.authenticate(credentials(), &[]).await.unwrap();
    let state = state_param(&url);
    desk.handle_callback(&format!(
        "https://seller.example.test/accepted?code=v%5E1.1%23code&state={state}&expires_in=299"
    ))
    .await
    .unwrap();
    desk
}

fn stored_tokens(desk: &ListingDesk) -> StoredTokens {
    desk.store().get(keys::TOKENS).unwrap().unwrap()
}

#[tokio::test]
async fn test_consent_flow_stores_token_pair() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;

    let url = desk.authenticate(credentials(), &[]).await.unwrap();
    assert!(url.starts_with(&format!("{}/oauth2/authorize?", upstream.base_url())));
    assert_eq!(desk.ebay().auth_state().await, AuthState::ApplicationTokenOnly);

    let state = state_param(&url);
    let stored_state: String = desk.store().get(keys::OAUTH_STATE).unwrap().unwrap();
    assert_eq!(stored_state, state);

    desk.handle_callback(&format!("https://seller.example.test/accepted?code=abc&state={state}"))
        .await
        .unwrap();

    assert_eq!(upstream.grants(), ["client_credentials", "authorization_code"]);
    assert_eq!(desk.ebay().auth_state().await, AuthState::UserAuthorized);
    assert!(desk.store().get_raw(keys::OAUTH_STATE).unwrap().is_none());

    let tokens = stored_tokens(&desk);
    assert_eq!(tokens.access_token, "user-token-2");
    assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-token-1"));
    assert_eq!(tokens.expires_in, Some(7200));

    let info = desk.ebay().user_info().await;
    assert!(info.authenticated);
    assert!(info.has_valid_token);

    // A second desk on the same data directory picks the session up.
    let reopened = upstream.desk(dir.path()).await;
    assert!(reopened.ebay().is_authenticated().await);
    assert!(reopened.resolve_credentials().is_some());
}

#[tokio::test]
async fn test_state_mismatch_sends_no_exchange() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;

    desk.authenticate(credentials(), &[]).await.unwrap();
    let err = desk
        .handle_callback("https://seller.example.test/accepted?code=abc&state=forged")
        .await
        .unwrap_err();

    assert!(matches!(err, DeskError::Ebay(EbayError::InvalidState)));
    assert_eq!(upstream.grants(), ["client_credentials"]);
    assert!(!desk.ebay().is_authenticated().await);
    assert!(desk.store().get_raw(keys::OAUTH_STATE).unwrap().is_some());
}

#[tokio::test]
async fn test_denied_consent_is_reported() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;

    let err = desk
        .handle_callback("/accepted?error=access_denied&error_description=user+declined")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "eBay authorization failed: access_denied: user declined");
    assert!(upstream.grants().is_empty());
}

#[tokio::test]
async fn test_listings_render_with_item_links() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = authorized_desk(&upstream, dir.path()).await;

    let rendered = desk.refresh_listings().await.unwrap();

    assert!(rendered.starts_with("Active listings (2)"));
    assert!(rendered.contains("Vintage Film Camera"));
    assert!(rendered.contains("SKU: CAM-001"));
    assert!(rendered.contains("Qty: 3"));
    assert!(rendered.contains("https://img.example.test/cam.jpg"));
    assert!(rendered.contains(&format!("View: {}/itm/CAM-001", upstream.base_url())));
    assert!(rendered.contains("Untitled"));
    assert!(rendered.contains("(no image)"));
    assert_eq!(upstream.listing_auth(), ["Bearer user-token-2"]);
}

#[tokio::test]
async fn test_single_401_refreshes_and_retries_once() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = authorized_desk(&upstream, dir.path()).await;

    upstream.reject_next_listing_requests(1);
    desk.refresh_listings().await.unwrap();

    assert_eq!(upstream.listing_auth(), ["Bearer user-token-2", "Bearer user-token-3"]);
    assert_eq!(
        upstream.grants(),
        ["client_credentials", "authorization_code", "refresh_token"]
    );

    // The refresh response carried no refresh token; the old one is kept.
    let tokens = stored_tokens(&desk);
    assert_eq!(tokens.access_token, "user-token-3");
    assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-token-1"));
    assert_eq!(desk.ebay().auth_state().await, AuthState::UserAuthorized);
}

#[tokio::test]
async fn test_second_401_is_surfaced() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = authorized_desk(&upstream, dir.path()).await;

    upstream.reject_next_listing_requests(2);
    let err = desk.refresh_listings().await.unwrap_err();

    assert!(matches!(err, DeskError::Ebay(EbayError::Unauthorized(ref body)) if body.contains("Invalid access token")));
    assert!(err.needs_login());
    assert_eq!(upstream.listing_auth().len(), 2);
}

#[tokio::test]
async fn test_failed_refresh_during_retry_is_surfaced() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = authorized_desk(&upstream, dir.path()).await;

    upstream.reject_next_listing_requests(1);
    upstream.reject_refresh();
    let err = desk.refresh_listings().await.unwrap_err();

    assert!(matches!(
        err,
        DeskError::Ebay(EbayError::TokenRequest { grant: "Token refresh", status: 400, .. })
    ));
    assert_eq!(upstream.listing_auth().len(), 1);
    assert_eq!(desk.ebay().auth_state().await, AuthState::UserAuthorized);
}

#[tokio::test]
async fn test_old_token_is_refreshed_before_the_call() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();

    let store = LocalStore::open(dir.path().join("store.json")).unwrap();
    store
        .set(
            keys::TOKENS,
            &StoredTokens {
                access_token: "stale-token".to_string(),
                refresh_token: Some("refresh-token-1".to_string()),
                expires_in: Some(7200),
                timestamp: now_ms() - 3_100_000,
            },
        )
        .unwrap();
    drop(store);

    let desk = upstream.desk(dir.path()).await;
    assert!(desk.ebay().token_age() > 3000.0);

    desk.refresh_listings().await.unwrap();

    assert_eq!(upstream.grants(), ["refresh_token"]);
    assert_eq!(upstream.listing_auth(), ["Bearer user-token-1"]);
    assert!(desk.ebay().token_age() < 60.0);
}

#[tokio::test]
async fn test_young_token_is_used_as_is() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();

    let store = LocalStore::open(dir.path().join("store.json")).unwrap();
    store
        .set(
            keys::TOKENS,
            &StoredTokens {
                access_token: "fresh-token".to_string(),
                refresh_token: Some("refresh-token-1".to_string()),
                expires_in: Some(7200),
                timestamp: now_ms() - 60_000,
            },
        )
        .unwrap();
    drop(store);

    let desk = upstream.desk(dir.path()).await;
    desk.refresh_listings().await.unwrap();

    assert!(upstream.grants().is_empty());
    assert_eq!(upstream.listing_auth(), ["Bearer fresh-token"]);
}

#[tokio::test]
async fn test_update_listing_accepts_empty_response() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = authorized_desk(&upstream, dir.path()).await;

    let body = json!({ "availability": { "shipToLocationAvailability": { "quantity": 5 } } });
    let response = desk.update_listing("CAM-001", &body).await.unwrap();

    assert!(response.is_null());
    assert_eq!(upstream.updates(), [("CAM-001".to_string(), body)]);
}

#[tokio::test]
async fn test_public_search_obtains_application_token() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;
    assert_eq!(desk.ebay().auth_state().await, AuthState::Unauthenticated);

    let rendered = desk.search_market("desk lamp", None, 10).await.unwrap();

    assert!(rendered.contains("Brass Desk Lamp"));
    assert!(rendered.contains("USD 45.00"));
    assert_eq!(upstream.grants(), ["client_credentials"]);
    assert_eq!(desk.ebay().auth_state().await, AuthState::ApplicationTokenOnly);
}

#[tokio::test]
async fn test_logout_forgets_session() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = authorized_desk(&upstream, dir.path()).await;

    desk.logout().await.unwrap();

    assert!(!desk.ebay().is_authenticated().await);
    assert!(desk.store().get_raw(keys::TOKENS).unwrap().is_none());
    assert!(desk.ebay().token_age().is_infinite());
    let err = desk.refresh_listings().await.unwrap_err();
    assert!(matches!(err, DeskError::Ebay(EbayError::NotAuthenticated)));
}
