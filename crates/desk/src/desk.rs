//! Seller-facing operations.
//!
//! [`ListingDesk`] wires user actions to the marketplace client, the
//! identification pipeline and the local store, and renders the results.

use std::path::Path;
use std::sync::Arc;

use listing_desk_core::{AuthState, Credentials, Draft, DraftError, DraftForm, ProductCategory};
use secrecy::SecretString;
use url::Url;

use crate::config::DeskConfig;
use crate::drafts;
use crate::ebay::client::DEFAULT_PAGE_SIZE;
use crate::ebay::{EbayClient, EbayError, INVENTORY_SCOPE};
use crate::error::DeskError;
use crate::render::{self, SessionStatus};
use crate::settings::{Settings, VisionSettings};
use crate::store::{LocalStore, keys};
use crate::vision::product::HIGH_CONFIDENCE;
use crate::vision::{IdentificationReport, ImageUpload, VisionService};

/// Base used to resolve redirect URLs given without scheme and host.
const CALLBACK_BASE: &str = "http://localhost/";

/// The seller's desk: session, listings, identification and drafts.
pub struct ListingDesk {
    config: DeskConfig,
    store: Arc<LocalStore>,
    ebay: EbayClient,
    vision: VisionService,
}

impl ListingDesk {
    /// Open the store at the configured location and build the clients.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Store` if the store file cannot be opened, or an
    /// HTTP client error if a client cannot be built.
    pub async fn open(config: DeskConfig) -> Result<Self, DeskError> {
        let store = Arc::new(LocalStore::open(config.store_path())?);
        Self::with_store(config, store).await
    }

    /// Build a desk on an existing store.
    ///
    /// # Errors
    ///
    /// Returns an HTTP client error if a client cannot be built.
    pub async fn with_store(config: DeskConfig, store: Arc<LocalStore>) -> Result<Self, DeskError> {
        let vision = VisionService::new(&config.vision, config.http_timeout)?;
        Self::with_parts(config, store, vision).await
    }

    /// Build a desk with a preassembled identification pipeline.
    ///
    /// Credentials come from configuration, else from the store; stored
    /// tokens and the stored inference token are loaded.
    ///
    /// # Errors
    ///
    /// Returns an HTTP client error if the marketplace client cannot be built.
    pub async fn with_parts(
        config: DeskConfig,
        store: Arc<LocalStore>,
        vision: VisionService,
    ) -> Result<Self, DeskError> {
        let ebay = EbayClient::new(&config.ebay, Arc::clone(&store), config.http_timeout)?;
        let desk = Self {
            config,
            store,
            ebay,
            vision,
        };

        match desk.resolve_credentials() {
            Some(credentials) => {
                desk.ebay.initialize(credentials).await;
            }
            None => {
                desk.ebay.load_stored_tokens().await;
            }
        }

        if let Some(token) = desk.stored_vision_token() {
            desk.vision.set_token(Some(token)).await;
        }

        Ok(desk)
    }

    /// Marketplace client.
    #[must_use]
    pub const fn ebay(&self) -> &EbayClient {
        &self.ebay
    }

    /// Identification pipeline.
    #[must_use]
    pub const fn vision(&self) -> &VisionService {
        &self.vision
    }

    /// Local store.
    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Credentials from configuration or the store, with the configured
    /// sandbox flag applied.
    #[must_use]
    pub fn resolve_credentials(&self) -> Option<Credentials> {
        self.config
            .ebay
            .credentials
            .clone()
            .or_else(|| self.store.get_or_log::<Credentials>(keys::CREDENTIALS))
            .map(|mut credentials| {
                credentials.sandbox = self.config.ebay.sandbox;
                credentials
            })
    }

    fn stored_vision_token(&self) -> Option<SecretString> {
        self.store
            .get_or_log::<VisionSettings>(keys::VISION)
            .and_then(|v| v.token())
            .or_else(|| self.load_settings().token())
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Start the consent flow: validate and remember the credentials, obtain
    /// an application token and return the URL the seller must visit.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Credentials` if a field is blank and
    /// `DeskError::Ebay` if the application token cannot be obtained.
    #[tracing::instrument(skip(self, credentials), fields(sandbox = credentials.sandbox))]
    pub async fn authenticate(&self, credentials: Credentials, scopes: &[&str]) -> Result<String, DeskError> {
        credentials.validate()?;
        self.store.set(keys::CREDENTIALS, &credentials)?;
        self.ebay.initialize(credentials).await;
        self.ebay.application_token().await?;

        let scopes = if scopes.is_empty() {
            &[INVENTORY_SCOPE][..]
        } else {
            scopes
        };
        Ok(self.ebay.authorization_url(scopes).await?)
    }

    /// Finish the consent flow from the URL eBay redirected to.
    ///
    /// # Errors
    ///
    /// Returns `EbayError::AuthorizationDenied` when the redirect carries an
    /// `error`, `DeskError::MissingCallbackParam` when it has no code or
    /// state, and `EbayError::InvalidState` on a state mismatch.
    #[tracing::instrument(skip_all)]
    pub async fn handle_callback(&self, redirect_url: &str) -> Result<(), DeskError> {
        let url = match Url::parse(redirect_url) {
            Ok(url) => url,
            Err(_) => Url::parse(CALLBACK_BASE)?.join(redirect_url)?,
        };

        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };

        if let Some(error) = param("error") {
            let detail = param("error_description").map_or(error.clone(), |d| format!("{error}: {d}"));
            return Err(EbayError::AuthorizationDenied(detail).into());
        }

        let code = param("code").ok_or(DeskError::MissingCallbackParam("code"))?;
        let state = param("state").ok_or(DeskError::MissingCallbackParam("state"))?;
        self.ebay.exchange_code(&code, &state).await?;
        Ok(())
    }

    /// Forget the marketplace session.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Ebay` if the store cannot be written.
    pub async fn logout(&self) -> Result<(), DeskError> {
        self.ebay.clear_tokens().await?;
        Ok(())
    }

    /// Facts about the current session.
    pub async fn session_status(&self) -> SessionStatus {
        SessionStatus {
            sandbox: self.ebay.credentials().await.sandbox,
            has_credentials: self.ebay.credentials().await.is_usable(),
            state: self.ebay.auth_state().await,
            user: self.ebay.user_info().await,
            token_age_secs: self.ebay.token_age(),
        }
    }

    /// Rendered session status.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Render` if rendering fails.
    pub async fn status(&self) -> Result<String, DeskError> {
        Ok(render::status(&self.session_status().await)?)
    }

    /// Public page URL for an item.
    pub async fn view_listing_url(&self, item_id: &str) -> String {
        self.ebay.item_page_url(item_id).await
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Fetch the seller's listings and render them.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Ebay` if the listings cannot be fetched.
    pub async fn refresh_listings(&self) -> Result<String, DeskError> {
        let listings = self.ebay.active_listings(DEFAULT_PAGE_SIZE, 0).await?;
        let endpoints = self.ebay.endpoints().await;
        Ok(render::listings(&listings, &endpoints)?)
    }

    /// Replace an inventory item with `body`.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Ebay` if the update is rejected.
    pub async fn update_listing(&self, sku: &str, body: &serde_json::Value) -> Result<serde_json::Value, DeskError> {
        Ok(self.ebay.update_listing(sku, body).await?)
    }

    // =========================================================================
    // Marketplace browsing
    // =========================================================================

    async fn ensure_public_token(&self) -> Result<(), DeskError> {
        if self.ebay.auth_state().await == AuthState::Unauthenticated {
            self.ebay.application_token().await?;
        }
        Ok(())
    }

    /// Search the marketplace and render the hits.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Ebay` if no token can be obtained or the search fails.
    pub async fn search_market(
        &self,
        query: &str,
        category_id: Option<&str>,
        limit: u32,
    ) -> Result<String, DeskError> {
        self.ensure_public_token().await?;
        let page = self.ebay.search_items(query, category_id, limit).await?;
        Ok(render::search(&page, &self.ebay.endpoints().await)?)
    }

    /// Render another seller's listings.
    ///
    /// # Errors
    ///
    /// See [`Self::search_market`].
    pub async fn seller_listings(&self, seller_id: &str) -> Result<String, DeskError> {
        self.ensure_public_token().await?;
        let page = self.ebay.seller_listings(seller_id).await?;
        Ok(render::search(&page, &self.ebay.endpoints().await)?)
    }

    /// Full item details as returned by the Browse API.
    ///
    /// # Errors
    ///
    /// See [`Self::search_market`].
    pub async fn item_details(&self, item_id: &str) -> Result<serde_json::Value, DeskError> {
        self.ensure_public_token().await?;
        Ok(self.ebay.item_details(item_id).await?)
    }

    /// The marketplace category tree.
    ///
    /// # Errors
    ///
    /// See [`Self::search_market`].
    pub async fn categories(&self) -> Result<serde_json::Value, DeskError> {
        self.ensure_public_token().await?;
        Ok(self.ebay.categories().await?)
    }

    // =========================================================================
    // Identification and drafts
    // =========================================================================

    /// Identify the product in an image and prefill the draft form.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Vision` if the file is not an acceptable image.
    #[tracing::instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn identify(&self, path: impl AsRef<Path>) -> Result<IdentificationReport, DeskError> {
        let upload = ImageUpload::from_path(path).await?;
        let report = self.vision.identify(&upload).await;
        drafts::save_form(&self.store, &DraftForm::from(&report.product_info))?;
        Ok(report)
    }

    /// Identify the product in an image and render the report.
    ///
    /// # Errors
    ///
    /// See [`Self::identify`].
    pub async fn identify_product(&self, path: impl AsRef<Path>) -> Result<String, DeskError> {
        let report = self.identify(path).await?;
        Ok(render::identification(&report)?)
    }

    /// Description for a title and category name.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::MissingTitle` if the title is blank.
    pub async fn generate_description(&self, title: &str, category: &str) -> Result<String, DeskError> {
        if title.trim().is_empty() {
            return Err(DraftError::MissingTitle.into());
        }
        let category: ProductCategory = category.parse().unwrap_or_default();
        Ok(self
            .vision
            .describe(title, category, Some(HIGH_CONFIDENCE))
            .await)
    }

    /// Generate a description for the stored form and save it there.
    ///
    /// # Errors
    ///
    /// See [`Self::generate_description`].
    pub async fn describe_draft(&self) -> Result<DraftForm, DeskError> {
        let mut form = self.draft_form();
        form.description = self.generate_description(&form.title, &form.category).await?;
        drafts::save_form(&self.store, &form)?;
        Ok(form)
    }

    /// The draft form being edited.
    #[must_use]
    pub fn draft_form(&self) -> DraftForm {
        drafts::load_form(&self.store)
    }

    /// Replace the draft form being edited.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Store` if the form cannot be written.
    pub fn save_draft_form(&self, form: &DraftForm) -> Result<(), DeskError> {
        drafts::save_form(&self.store, form)?;
        Ok(())
    }

    /// Validate and save a draft, then clear the form being edited.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::MissingFields` when the title or description is
    /// blank or the price is not positive.
    pub fn save_draft(&self, form: DraftForm) -> Result<Draft, DeskError> {
        let now = chrono::Utc::now();
        let draft = form.into_draft(drafts::generate_draft_id(now), now)?;
        drafts::append_draft(&self.store, draft.clone())?;
        drafts::reset_form(&self.store)?;
        tracing::info!(id = %draft.id, "draft saved");
        Ok(draft)
    }

    /// Render a preview of the form.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::PreviewIncomplete` when title or description is blank.
    pub fn preview_listing(&self, form: &DraftForm) -> Result<String, DeskError> {
        form.check_previewable()?;
        Ok(render::preview(form)?)
    }

    /// Saved drafts, oldest first.
    #[must_use]
    pub fn drafts(&self) -> Vec<Draft> {
        drafts::load_drafts(&self.store)
    }

    /// Rendered list of saved drafts.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Render` if rendering fails.
    pub fn render_drafts(&self) -> Result<String, DeskError> {
        Ok(render::drafts(&self.drafts())?)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Stored settings with defaults filled in.
    #[must_use]
    pub fn load_settings(&self) -> Settings {
        self.store
            .get_or_log::<Settings>(keys::SETTINGS)
            .unwrap_or_default()
            .normalized()
    }

    /// Persist settings and apply the inference token.
    ///
    /// A blank token falls back to the configured one.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Store` if the settings cannot be written.
    pub async fn save_settings(&self, settings: Settings) -> Result<Settings, DeskError> {
        let settings = settings.normalized();
        self.store.set(keys::SETTINGS, &settings)?;
        self.store.set(
            keys::VISION,
            &VisionSettings {
                huggingface_token: settings.huggingface_token.clone(),
            },
        )?;

        let token = settings.token().or_else(|| self.config.vision.token.clone());
        self.vision.set_token(token).await;
        tracing::info!("settings saved");
        Ok(settings)
    }

    /// Wipe every stored record and forget the session.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Store` if the store cannot be written.
    pub async fn clear_all_data(&self) -> Result<(), DeskError> {
        self.store.clear()?;
        self.ebay.clear_tokens().await?;
        self.vision.set_token(self.config.vision.token.clone()).await;
        tracing::info!("all local data cleared");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use rust_decimal::Decimal;

    use super::*;
    use crate::config::{EbayConfig, VisionConfig};

    fn config() -> DeskConfig {
        DeskConfig {
            data_dir: PathBuf::from("/nonexistent"),
            http_timeout: std::time::Duration::from_secs(1),
            ebay: EbayConfig::default(),
            vision: VisionConfig::default(),
        }
    }

    async fn desk() -> ListingDesk {
        ListingDesk::with_store(config(), Arc::new(LocalStore::in_memory()))
            .await
            .unwrap()
    }

    fn form() -> DraftForm {
        DraftForm {
            title: "Brass Lamp".to_string(),
            category: "home".to_string(),
            price: "30".to_string(),
            condition: "Used".to_string(),
            description: "A lamp.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_rejects_incomplete_credentials() {
        let desk = desk().await;
        let credentials = Credentials {
            app_id: "app".to_string(),
            ..Credentials::default()
        };
        let err = desk.authenticate(credentials, &[]).await.unwrap_err();
        assert!(matches!(err, DeskError::Credentials(_)));
        assert!(desk.store().get_raw(keys::CREDENTIALS).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_callback_error_param() {
        let desk = desk().await;
        let err = desk
            .handle_callback("https://example.test/cb?error=access_denied")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "eBay authorization failed: access_denied");
    }

    #[tokio::test]
    async fn test_callback_missing_params() {
        let desk = desk().await;
        let err = desk.handle_callback("?state=abc").await.unwrap_err();
        assert!(matches!(err, DeskError::MissingCallbackParam("code")));

        let err = desk.handle_callback("?code=abc").await.unwrap_err();
        assert!(matches!(err, DeskError::MissingCallbackParam("state")));
    }

    #[tokio::test]
    async fn test_callback_state_mismatch() {
        let desk = desk().await;
        desk.store().set(keys::OAUTH_STATE, "expected").unwrap();
        let err = desk.handle_callback("?code=abc&state=other").await.unwrap_err();
        assert!(matches!(err, DeskError::Ebay(EbayError::InvalidState)));
    }

    #[tokio::test]
    async fn test_refresh_listings_requires_login() {
        let desk = desk().await;
        let err = desk.refresh_listings().await.unwrap_err();
        assert!(err.needs_login());
    }

    #[tokio::test]
    async fn test_save_draft_validates_and_resets_form() {
        let desk = desk().await;
        desk.save_draft_form(&form()).unwrap();

        let bad = DraftForm {
            price: "0".to_string(),
            ..form()
        };
        assert!(matches!(
            desk.save_draft(bad),
            Err(DeskError::Draft(DraftError::MissingFields))
        ));

        let draft = desk.save_draft(form()).unwrap();
        assert_eq!(draft.price, Decimal::from(30));
        assert_eq!(desk.drafts(), vec![draft]);
        assert_eq!(desk.draft_form(), DraftForm::default());
    }

    #[tokio::test]
    async fn test_preview_requires_title_and_description() {
        let desk = desk().await;
        let incomplete = DraftForm {
            description: String::new(),
            ..form()
        };
        assert!(matches!(
            desk.preview_listing(&incomplete),
            Err(DeskError::Draft(DraftError::PreviewIncomplete))
        ));
        assert!(desk.preview_listing(&form()).unwrap().contains("Brass Lamp"));
    }

    #[tokio::test]
    async fn test_generate_description_without_token_uses_template() {
        let desk = desk().await;
        assert!(matches!(
            desk.generate_description("  ", "home").await,
            Err(DeskError::Draft(DraftError::MissingTitle))
        ));

        let description = desk.generate_description("Brass Lamp", "home").await.unwrap();
        assert!(description.starts_with("Beautiful Brass Lamp"));
        assert!(!description.contains("high confidence"));
    }

    #[tokio::test]
    async fn test_settings_round_trip_and_clear() {
        let desk = desk().await;
        assert_eq!(desk.load_settings(), Settings::default());

        let saved = desk
            .save_settings(Settings {
                huggingface_token: "hf_abc".to_string(),
                default_shipping: "4.50".to_string(),
                default_handling: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(saved.default_handling, "1");
        assert_eq!(desk.load_settings(), saved);
        assert!(desk.vision().client().has_token().await);

        let vision: VisionSettings = desk.store().get(keys::VISION).unwrap().unwrap();
        assert_eq!(vision.huggingface_token, "hf_abc");

        desk.clear_all_data().await.unwrap();
        assert!(desk.store().keys().unwrap().is_empty());
        assert!(!desk.vision().client().has_token().await);
    }

    #[tokio::test]
    async fn test_stored_credentials_take_configured_sandbox_flag() {
        let store = Arc::new(LocalStore::in_memory());
        store
            .set(
                keys::CREDENTIALS,
                &Credentials {
                    app_id: "a".to_string(),
                    cert_id: "c".to_string(),
                    dev_id: "d".to_string(),
                    ru_name: "r".to_string(),
                    sandbox: false,
                },
            )
            .unwrap();

        let mut config = config();
        config.ebay.sandbox = true;
        let desk = ListingDesk::with_store(config, store).await.unwrap();

        assert!(desk.resolve_credentials().unwrap().sandbox);
        assert_eq!(
            desk.view_listing_url("123").await,
            "https://www.sandbox.ebay.com/itm/123"
        );
    }
}
