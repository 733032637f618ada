//! Integration tests for Listing Desk.
//!
//! Tests run the real [`ListingDesk`] against [`FakeUpstream`], an in-process
//! axum server that plays both the eBay REST/OAuth endpoints and the Hugging
//! Face inference API. No network access or credentials are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p listing-desk-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `oauth_flow` - Consent flow, token refresh and the 401 retry
//! - `identification` - Source fusion, draft prefill and AI descriptions

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use listing_desk::config::{EbayConfig, VisionConfig};
use listing_desk::{DeskConfig, ListingDesk};
use listing_desk_core::Credentials;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Model names the fake inference API answers for.
pub const CLASSIFICATION_MODEL: &str = "test/classify";
pub const DETECTION_MODEL: &str = "test/detect";
pub const TEXT_MODEL: &str = "test/generate";

/// Text the fake generation model returns.
pub const GENERATED_DESCRIPTION: &str = "A sleek laptop computer, lightly used and ready for work.";

/// What the fake upstream has seen and how it should misbehave.
#[derive(Default)]
pub struct UpstreamState {
    grants: Mutex<Vec<String>>,
    listing_auth: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    updates: Mutex<Vec<(String, Value)>>,
    tokens_issued: AtomicU32,
    unauthorized_remaining: AtomicU32,
    reject_refresh: AtomicBool,
    detection_down: AtomicBool,
    generation_down: AtomicBool,
}

fn locked<T: Clone>(m: &Mutex<T>) -> T {
    m.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn push<T>(m: &Mutex<Vec<T>>, value: T) {
    m.lock().unwrap_or_else(PoisonError::into_inner).push(value);
}

/// In-process stand-in for eBay and the inference API.
pub struct FakeUpstream {
    addr: SocketAddr,
    state: Arc<UpstreamState>,
}

impl FakeUpstream {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::unwrap_used)]
    pub async fn start() -> Self {
        let state = Arc::new(UpstreamState::default());

        let app = Router::new()
            .route("/identity/v1/oauth2/token", post(token))
            .route("/sell/inventory/v1/inventory_item", get(inventory))
            .route("/sell/inventory/v1/inventory_item/{sku}", put(update_item))
            .route("/browse/v1/item_summary/search", get(search))
            .route("/models/{*model}", post(inference))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Base URL of the server.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Grant types received by the token endpoint, in order.
    #[must_use]
    pub fn grants(&self) -> Vec<String> {
        locked(&self.state.grants)
    }

    /// Authorization headers received by the inventory endpoint, in order.
    #[must_use]
    pub fn listing_auth(&self) -> Vec<String> {
        locked(&self.state.listing_auth)
    }

    /// Prompts received by the text-generation model.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        locked(&self.state.prompts)
    }

    /// Inventory item updates received, as `(sku, body)`.
    #[must_use]
    pub fn updates(&self) -> Vec<(String, Value)> {
        locked(&self.state.updates)
    }

    /// Answer the next `n` inventory requests with 401.
    pub fn reject_next_listing_requests(&self, n: u32) {
        self.state.unauthorized_remaining.store(n, Ordering::SeqCst);
    }

    /// Make the refresh grant fail.
    pub fn reject_refresh(&self) {
        self.state.reject_refresh.store(true, Ordering::SeqCst);
    }

    /// Make the detection model answer 503.
    pub fn take_detection_down(&self) {
        self.state.detection_down.store(true, Ordering::SeqCst);
    }

    /// Make the text-generation model answer 500.
    pub fn take_generation_down(&self) {
        self.state.generation_down.store(true, Ordering::SeqCst);
    }

    /// Desk configuration pointing every endpoint at this server.
    #[must_use]
    pub fn config(&self, data_dir: &Path) -> DeskConfig {
        let base = self.base_url();
        DeskConfig {
            data_dir: data_dir.to_path_buf(),
            http_timeout: Duration::from_secs(5),
            ebay: EbayConfig {
                credentials: Some(credentials()),
                sandbox: false,
                api_url: Some(base.clone()),
                token_url: Some(format!("{base}/identity/v1/oauth2/token")),
                signin_url: Some(format!("{base}/oauth2/authorize")),
                item_url: Some(base.clone()),
            },
            vision: VisionConfig {
                api_url: base,
                token: None,
                classification_model: CLASSIFICATION_MODEL.to_string(),
                detection_model: DETECTION_MODEL.to_string(),
                text_model: TEXT_MODEL.to_string(),
            },
        }
    }

    /// Open a desk against this server with its store under `data_dir`.
    ///
    /// # Panics
    ///
    /// Panics if the desk cannot be opened.
    #[allow(clippy::unwrap_used)]
    pub async fn desk(&self, data_dir: &Path) -> ListingDesk {
        ListingDesk::open(self.config(data_dir)).await.unwrap()
    }
}

/// Application credentials accepted by the fake token endpoint.
#[must_use]
pub fn credentials() -> Credentials {
    Credentials {
        app_id: "Seller-App-PRD-1234".to_string(),
        cert_id: "PRD-5f2c9e1a7b3d".to_string(),
        dev_id: "dev-42".to_string(),
        ru_name: "Seller-App-RuName".to_string(),
        sandbox: false,
    }
}

/// A solid-colour PNG.
///
/// # Panics
///
/// Panics if encoding fails.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

// =============================================================================
// Handlers
// =============================================================================

async fn token(
    State(state): State<Arc<UpstreamState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !basic {
        return (StatusCode::UNAUTHORIZED, "missing client credentials").into_response();
    }

    let grant = form.get("grant_type").cloned().unwrap_or_default();
    push(&state.grants, grant.clone());
    let n = state.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;

    match grant.as_str() {
        "client_credentials" => Json(json!({
            "access_token": format!("app-token-{n}"),
            "expires_in": 7200,
            "token_type": "Application Access Token",
        }))
        .into_response(),
        "authorization_code" if form.contains_key("code") => Json(json!({
            "access_token": format!("user-token-{n}"),
            "refresh_token": "refresh-token-1",
            "expires_in": 7200,
            "refresh_token_expires_in": 47_304_000,
            "token_type": "User Access Token",
        }))
        .into_response(),
        "refresh_token" if state.reject_refresh.load(Ordering::SeqCst) => (
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"the provided authorization refresh token is invalid"}"#,
        )
            .into_response(),
        "refresh_token" => Json(json!({
            "access_token": format!("user-token-{n}"),
            "expires_in": 7200,
            "token_type": "User Access Token",
        }))
        .into_response(),
        _ => (StatusCode::BAD_REQUEST, r#"{"error":"unsupported_grant_type"}"#).into_response(),
    }
}

async fn inventory(State(state): State<Arc<UpstreamState>>, headers: HeaderMap) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    push(&state.listing_auth, auth);

    let rejected = state
        .unauthorized_remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if rejected {
        return (
            StatusCode::UNAUTHORIZED,
            r#"{"errors":[{"errorId":1001,"message":"Invalid access token"}]}"#,
        )
            .into_response();
    }

    Json(json!({
        "total": 2,
        "inventoryItems": [
            {
                "sku": "CAM-001",
                "condition": "USED_EXCELLENT",
                "product": {
                    "title": "Vintage Film Camera",
                    "description": "35mm rangefinder",
                    "imageUrls": ["https://img.example.test/cam.jpg"],
                    "price": { "value": "129.99", "currency": "USD" }
                },
                "availability": { "shipToLocationAvailability": { "quantity": 3 } }
            },
            { "sku": "DRAFT-002" }
        ]
    }))
    .into_response()
}

async fn update_item(
    State(state): State<Arc<UpstreamState>>,
    UrlPath(sku): UrlPath<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    push(&state.updates, (sku, body));
    StatusCode::NO_CONTENT
}

async fn search(headers: HeaderMap) -> Response {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "));
    if !bearer {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    Json(json!({
        "total": 1,
        "itemSummaries": [{
            "itemId": "v1|1100|0",
            "title": "Brass Desk Lamp",
            "price": { "value": "45.00", "currency": "USD" },
            "condition": "Used",
            "itemWebUrl": "https://www.ebay.com/itm/1100"
        }]
    }))
    .into_response()
}

async fn inference(
    State(state): State<Arc<UpstreamState>>,
    UrlPath(model): UrlPath<String>,
    body: axum::body::Bytes,
) -> Response {
    match model.as_str() {
        CLASSIFICATION_MODEL => Json(json!([
            { "label": "laptop computer", "score": 0.92 },
            { "label": "notebook", "score": 0.05 }
        ]))
        .into_response(),
        DETECTION_MODEL if state.detection_down.load(Ordering::SeqCst) => {
            (StatusCode::SERVICE_UNAVAILABLE, r#"{"error":"Model is currently loading"}"#).into_response()
        }
        DETECTION_MODEL => Json(json!([
            { "label": "laptop", "score": 0.88, "box": { "xmin": 1, "ymin": 1, "xmax": 30, "ymax": 20 } }
        ]))
        .into_response(),
        TEXT_MODEL if state.generation_down.load(Ordering::SeqCst) => {
            (StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"internal"}"#).into_response()
        }
        TEXT_MODEL => {
            let prompt = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| v.get("inputs").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default();
            push(&state.prompts, prompt);
            Json(json!([{ "generated_text": GENERATED_DESCRIPTION }])).into_response()
        }
        _ => (StatusCode::NOT_FOUND, r#"{"error":"Model not found"}"#).into_response(),
    }
}
