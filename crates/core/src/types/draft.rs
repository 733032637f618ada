//! Draft listings composed locally before publishing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::DraftId;
use super::identification::ProductInfo;

/// Condition used when a form leaves it blank.
pub const DEFAULT_CONDITION: &str = "Used";

/// Errors raised when turning a [`DraftForm`] into something usable.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// Title, description or a positive price is missing.
    #[error("please fill in all required fields (title, description and a price above zero)")]
    MissingFields,
    /// Preview needs at least a title and description.
    #[error("please fill in title and description first")]
    PreviewIncomplete,
    /// Description generation needs a title.
    #[error("please enter a product title first")]
    MissingTitle,
}

/// Raw draft form contents, as typed by the seller or prefilled from an
/// identification.
///
/// `price` is kept as entered; it is only parsed when the draft is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftForm {
    /// Product title.
    pub title: String,
    /// Category name.
    pub category: String,
    /// Starting price as entered.
    pub price: String,
    /// Item condition.
    pub condition: String,
    /// Listing description.
    pub description: String,
}

impl DraftForm {
    /// Parsed price; anything unparseable counts as zero.
    #[must_use]
    pub fn parsed_price(&self) -> Decimal {
        self.price.trim().parse().unwrap_or(Decimal::ZERO)
    }

    /// Ensure the form has what a preview needs.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::PreviewIncomplete`] when title or description is blank.
    pub fn check_previewable(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(DraftError::PreviewIncomplete);
        }
        Ok(())
    }

    /// Validate the form and stamp it into a [`Draft`].
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::MissingFields`] when the title or description is
    /// blank or the price is not above zero.
    pub fn into_draft(self, id: DraftId, timestamp: DateTime<Utc>) -> Result<Draft, DraftError> {
        let price = self.parsed_price();
        if self.title.trim().is_empty() || self.description.trim().is_empty() || price <= Decimal::ZERO {
            return Err(DraftError::MissingFields);
        }

        Ok(Draft {
            title: self.title,
            category: self.category,
            price,
            condition: self.condition,
            description: self.description,
            timestamp,
            id,
        })
    }
}

impl From<&ProductInfo> for DraftForm {
    fn from(info: &ProductInfo) -> Self {
        let condition = if info.condition.is_empty() {
            DEFAULT_CONDITION.to_string()
        } else {
            info.condition.clone()
        };

        Self {
            title: info.title.clone(),
            category: info.category.to_string(),
            price: info.suggested_price.to_string(),
            condition,
            description: info.description.clone(),
        }
    }
}

/// A saved draft listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// Product title.
    pub title: String,
    /// Category name.
    pub category: String,
    /// Starting price.
    pub price: Decimal,
    /// Item condition.
    pub condition: String,
    /// Listing description.
    pub description: String,
    /// When the draft was saved.
    pub timestamp: DateTime<Utc>,
    /// Generated identifier.
    pub id: DraftId,
}
