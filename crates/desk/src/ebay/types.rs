//! Wire types for the eBay Inventory and Browse APIs and their conversion
//! into domain records.

use listing_desk_core::{Listing, ListingStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use listing_desk_core::price::DEFAULT_CURRENCY;

const UNTITLED: &str = "Untitled";
const DEFAULT_CONDITION: &str = "NEW";

// ─────────────────────────────────────────────────────────────────────────────
// Inventory API
// ─────────────────────────────────────────────────────────────────────────────

/// Page of inventory items.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemPage {
    #[serde(default)]
    pub inventory_items: Option<Vec<InventoryItem>>,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub next: Option<String>,
}

/// A single inventory item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub sku: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub product: Option<InventoryProduct>,
    #[serde(default)]
    pub availability: Option<Availability>,
}

/// Product details attached to an inventory item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryProduct {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Amount>,
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default)]
    pub ship_to_location_availability: Option<ShipToLocationAvailability>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipToLocationAvailability {
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Monetary amount; eBay sends the value as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl InventoryItem {
    fn quantity(&self) -> i64 {
        self.availability
            .as_ref()
            .and_then(|a| a.ship_to_location_availability.as_ref())
            .and_then(|s| s.quantity)
            .unwrap_or(0)
    }
}

impl From<InventoryItem> for Listing {
    fn from(item: InventoryItem) -> Self {
        let quantity = item.quantity();
        let product = item.product.unwrap_or_default();
        let (price, currency) = product
            .price
            .map(|p| (p.value, p.currency))
            .unwrap_or_default();

        // Items without a product title have not been published yet.
        let item_id = product.title.is_some().then(|| item.sku.clone());

        Self {
            title: product.title.unwrap_or_else(|| UNTITLED.to_string()),
            description: product.description.unwrap_or_default(),
            price: price.unwrap_or(Decimal::ZERO),
            currency: currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            quantity,
            condition: item.condition.unwrap_or_else(|| DEFAULT_CONDITION.to_string()),
            images: product.image_urls.unwrap_or_default(),
            category_id: product.category_id.unwrap_or_default(),
            item_id,
            status: ListingStatus::from_quantity(quantity),
            sku: item.sku,
        }
    }
}

impl From<InventoryItemPage> for Vec<Listing> {
    fn from(page: InventoryItemPage) -> Self {
        page.inventory_items
            .unwrap_or_default()
            .into_iter()
            .map(Listing::from)
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Browse API
// ─────────────────────────────────────────────────────────────────────────────

/// Result page of an item summary search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummaryPage {
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub item_summaries: Vec<ItemSummary>,
}

/// One search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub item_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<Amount>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub item_web_url: Option<String>,
}
