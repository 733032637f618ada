//! Seller inventory listing record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price::Price;
use super::status::ListingStatus;

/// A listing as shown to the seller, flattened from an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Seller-defined stock keeping unit.
    pub sku: String,
    /// Product title (`Untitled` when the marketplace has none).
    pub title: String,
    /// Product description.
    pub description: String,
    /// Listed price amount.
    pub price: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Ship-to-location quantity.
    pub quantity: i64,
    /// Marketplace condition code (e.g. `NEW`).
    pub condition: String,
    /// Product image URLs.
    pub images: Vec<String>,
    /// Marketplace category ID.
    pub category_id: String,
    /// Public item ID; only known once the item carries a product title.
    pub item_id: Option<String>,
    /// Availability status.
    pub status: ListingStatus,
}

impl Listing {
    /// Price with its currency.
    #[must_use]
    pub fn price(&self) -> Price {
        Price::new(self.price, self.currency.clone())
    }

    /// First image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Identifier used for the public item page.
    #[must_use]
    pub fn page_id(&self) -> &str {
        self.item_id.as_deref().unwrap_or(&self.sku)
    }
}
