//! Text rendering for listings, reports and previews.
//!
//! Views hold preformatted strings; templates only lay them out.

use askama::Template;
use listing_desk_core::{AuthState, Draft, DraftForm, Identification, Listing, ProductInfo};

use crate::ebay::{Endpoints, ItemSummaryPage, UserInfo};
use crate::settings::Settings;
use crate::text::{TITLE_DISPLAY_CHARS, capitalize_words, percent, truncate};
use crate::vision::IdentificationReport;

/// Identifications shown in a report.
pub const REPORT_TOP_N: usize = 5;

const NO_IMAGE: &str = "(no image)";
const NOT_SPECIFIED: &str = "Not specified";

// ─────────────────────────────────────────────────────────────────────────────
// Listings
// ─────────────────────────────────────────────────────────────────────────────

/// One rendered listing row.
#[derive(Debug, Clone)]
pub struct ListingRow {
    pub title: String,
    pub sku: String,
    pub price: String,
    pub quantity: i64,
    pub status: String,
    pub image: String,
    pub url: String,
}

impl ListingRow {
    fn new(listing: &Listing, endpoints: &Endpoints) -> Self {
        Self {
            title: truncate(&listing.title, TITLE_DISPLAY_CHARS),
            sku: listing.sku.clone(),
            price: listing.price().to_string(),
            quantity: listing.quantity,
            status: listing.status.to_string(),
            image: listing.primary_image().unwrap_or(NO_IMAGE).to_string(),
            url: endpoints.item_page(listing.page_id()),
        }
    }
}

#[derive(Template)]
#[template(path = "listings.txt")]
struct ListingsTemplate<'a> {
    rows: &'a [ListingRow],
}

#[derive(Template)]
#[template(path = "listings_empty.txt")]
struct EmptyListingsTemplate;

/// Render the listings table, or the empty-state message.
///
/// # Errors
///
/// Returns `askama::Error` if rendering fails.
pub fn listings(listings: &[Listing], endpoints: &Endpoints) -> askama::Result<String> {
    if listings.is_empty() {
        return EmptyListingsTemplate.render();
    }
    let rows: Vec<ListingRow> = listings.iter().map(|l| ListingRow::new(l, endpoints)).collect();
    ListingsTemplate { rows: &rows }.render()
}

// ─────────────────────────────────────────────────────────────────────────────
// Identification
// ─────────────────────────────────────────────────────────────────────────────

struct IdentificationItem {
    label: String,
    confidence: String,
    category: String,
}

impl From<&Identification> for IdentificationItem {
    fn from(ident: &Identification) -> Self {
        Self {
            label: capitalize_words(&ident.label),
            confidence: percent(ident.confidence),
            category: ident.category.to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "identification.txt")]
struct IdentificationTemplate<'a> {
    confidence: String,
    items: Vec<IdentificationItem>,
    title: &'a str,
    category: String,
    price: String,
}

/// Render an identification report: overall confidence, the top
/// identifications and the suggested product info.
///
/// # Errors
///
/// Returns `askama::Error` if rendering fails.
pub fn identification(report: &IdentificationReport) -> askama::Result<String> {
    let info: &ProductInfo = &report.product_info;
    IdentificationTemplate {
        confidence: percent(report.confidence),
        items: report
            .identifications
            .iter()
            .take(REPORT_TOP_N)
            .map(IdentificationItem::from)
            .collect(),
        title: &info.title,
        category: info.category.to_string(),
        price: info.suggested_price.to_string(),
    }
    .render()
}

// ─────────────────────────────────────────────────────────────────────────────
// Drafts
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "preview.txt")]
struct PreviewTemplate<'a> {
    title: &'a str,
    rule: String,
    description: &'a str,
    price: &'a str,
    condition: &'a str,
    category: &'a str,
}

/// Render a listing preview of the form. The caller checks completeness.
///
/// # Errors
///
/// Returns `askama::Error` if rendering fails.
pub fn preview(form: &DraftForm) -> askama::Result<String> {
    let category = if form.category.trim().is_empty() {
        NOT_SPECIFIED
    } else {
        form.category.as_str()
    };

    PreviewTemplate {
        title: &form.title,
        rule: "=".repeat(form.title.chars().count()),
        description: &form.description,
        price: &form.price,
        condition: &form.condition,
        category,
    }
    .render()
}

struct DraftRow {
    id: String,
    saved: String,
    title: String,
    price: String,
    condition: String,
    category: String,
}

#[derive(Template)]
#[template(path = "drafts.txt")]
struct DraftsTemplate {
    rows: Vec<DraftRow>,
}

/// Render the saved drafts list.
///
/// # Errors
///
/// Returns `askama::Error` if rendering fails.
pub fn drafts(drafts: &[Draft]) -> askama::Result<String> {
    let rows = drafts
        .iter()
        .map(|d| DraftRow {
            id: d.id.to_string(),
            saved: d.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            title: truncate(&d.title, TITLE_DISPLAY_CHARS),
            price: format!("${:.2}", d.price),
            condition: d.condition.clone(),
            category: if d.category.is_empty() {
                NOT_SPECIFIED.to_string()
            } else {
                d.category.clone()
            },
        })
        .collect();
    DraftsTemplate { rows }.render()
}

// ─────────────────────────────────────────────────────────────────────────────
// Marketplace search
// ─────────────────────────────────────────────────────────────────────────────

struct SearchRow {
    title: String,
    item_id: String,
    price: String,
    condition: String,
    url: String,
}

#[derive(Template)]
#[template(path = "search.txt")]
struct SearchTemplate {
    total: i64,
    rows: Vec<SearchRow>,
}

/// Render Browse API search hits.
///
/// # Errors
///
/// Returns `askama::Error` if rendering fails.
pub fn search(page: &ItemSummaryPage, endpoints: &Endpoints) -> askama::Result<String> {
    let rows: Vec<SearchRow> = page
        .item_summaries
        .iter()
        .map(|item| SearchRow {
            title: truncate(item.title.as_deref().unwrap_or("Untitled"), TITLE_DISPLAY_CHARS),
            item_id: item.item_id.clone(),
            price: item.price.as_ref().map_or_else(
                || "-".to_string(),
                |p| {
                    format!(
                        "{} {:.2}",
                        p.currency.as_deref().unwrap_or("USD"),
                        p.value.unwrap_or_default()
                    )
                },
            ),
            condition: item.condition.clone().unwrap_or_else(|| "-".to_string()),
            url: item
                .item_web_url
                .clone()
                .unwrap_or_else(|| endpoints.item_page(&item.item_id)),
        })
        .collect();

    #[allow(clippy::cast_possible_wrap)]
    let total = page.total.unwrap_or(rows.len() as i64);
    SearchTemplate { total, rows }.render()
}

// ─────────────────────────────────────────────────────────────────────────────
// Session and settings
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "status.txt")]
struct StatusTemplate {
    environment: &'static str,
    credentials: &'static str,
    state: String,
    authenticated: &'static str,
    valid_token: &'static str,
    token_age: String,
}

/// Session facts shown by the status view.
#[derive(Debug, Clone, Copy)]
pub struct SessionStatus {
    pub sandbox: bool,
    pub has_credentials: bool,
    pub state: AuthState,
    pub user: UserInfo,
    pub token_age_secs: f64,
}

/// Render the session status.
///
/// # Errors
///
/// Returns `askama::Error` if rendering fails.
pub fn status(status: &SessionStatus) -> askama::Result<String> {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    let token_age = if status.token_age_secs.is_finite() {
        format!("{:.0}s", status.token_age_secs)
    } else {
        "no stored token".to_string()
    };

    StatusTemplate {
        environment: if status.sandbox { "sandbox" } else { "production" },
        credentials: if status.has_credentials { "configured" } else { "missing" },
        state: status.state.to_string(),
        authenticated: yes_no(status.user.authenticated),
        valid_token: yes_no(status.user.has_valid_token),
        token_age,
    }
    .render()
}

#[derive(Template)]
#[template(path = "settings.txt")]
struct SettingsTemplate<'a> {
    token: &'static str,
    shipping: &'a str,
    handling: &'a str,
}

/// Render settings with the token hidden.
///
/// # Errors
///
/// Returns `askama::Error` if rendering fails.
pub fn settings(settings: &Settings) -> askama::Result<String> {
    SettingsTemplate {
        token: if settings.huggingface_token.trim().is_empty() {
            "not set"
        } else {
            "set"
        },
        shipping: &settings.default_shipping,
        handling: &settings.default_handling,
    }
    .render()
}
