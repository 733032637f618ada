//! Product identification records.
//!
//! An [`Identification`] is one label/confidence pair produced by a
//! classification source. A [`ProductInfo`] is the listing suggestion
//! synthesized from the best of them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Marketplace category guessed for a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Electronics,
    Fashion,
    Home,
    Sports,
    Toys,
    Automotive,
    Books,
    Health,
    #[default]
    General,
    /// Result of local colour analysis rather than a product guess.
    ColorAnalysis,
}

impl ProductCategory {
    /// Categories that take part in keyword matching, in matching order.
    pub const MATCHABLE: [Self; 8] = [
        Self::Electronics,
        Self::Fashion,
        Self::Home,
        Self::Sports,
        Self::Toys,
        Self::Automotive,
        Self::Books,
        Self::Health,
    ];

    /// Keywords that place a label in this category.
    #[must_use]
    pub const fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Electronics => &[
                "smartphone",
                "laptop",
                "tablet",
                "camera",
                "headphones",
                "speaker",
                "television",
                "monitor",
            ],
            Self::Fashion => &["shirt", "dress", "pants", "shoes", "bag", "watch", "jewelry", "hat"],
            Self::Home => &["furniture", "lamp", "pillow", "blanket", "decoration", "kitchen", "tool"],
            Self::Sports => &["ball", "equipment", "clothing", "fitness", "outdoor"],
            Self::Toys => &["doll", "game", "puzzle", "educational", "action figure"],
            Self::Automotive => &["car", "motorcycle", "tire", "part", "accessory"],
            Self::Books => &["book", "magazine", "educational", "fiction", "non-fiction"],
            Self::Health => &["supplement", "medical", "fitness", "beauty", "care"],
            Self::General | Self::ColorAnalysis => &[],
        }
    }

    /// Map a free-form classifier label to a category.
    ///
    /// The first category owning a keyword contained in the lower-cased label
    /// wins; labels matching nothing are [`ProductCategory::General`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        Self::MATCHABLE
            .into_iter()
            .find(|category| category.keywords().iter().any(|kw| lower.contains(kw)))
            .unwrap_or(Self::General)
    }

    /// Category name as persisted and displayed.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Electronics => "electronics",
            Self::Fashion => "fashion",
            Self::Home => "home",
            Self::Sports => "sports",
            Self::Toys => "toys",
            Self::Automotive => "automotive",
            Self::Books => "books",
            Self::Health => "health",
            Self::General => "general",
            Self::ColorAnalysis => "color_analysis",
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to [`ProductCategory::General`];
    /// `electronic` is accepted for `electronics`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "electronic" {
            return Ok(Self::Electronics);
        }
        Ok(Self::MATCHABLE
            .into_iter()
            .chain([Self::ColorAnalysis])
            .find(|c| c.as_str() == lower)
            .unwrap_or(Self::General))
    }
}

/// Pixel-space box reported by object detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

/// Facts measured from the image itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Name of the nearest reference colour to the dominant bucket.
    pub dominant_color: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
}

/// One label produced by a classification source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    /// Raw label text.
    pub label: String,
    /// Confidence score in `0.0..=1.0`.
    pub confidence: f64,
    /// Category derived from the label.
    pub category: ProductCategory,
    /// Detection box, for object-detection results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    /// Image facts, for local analysis results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,
}

impl Identification {
    /// A plain label/confidence pair categorized by keyword.
    #[must_use]
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        let label = label.into();
        let category = ProductCategory::from_label(&label);
        Self {
            label,
            confidence,
            category,
            bounding_box: None,
            metadata: None,
        }
    }
}

/// Listing suggestion synthesized from identifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub title: String,
    pub description: String,
    pub category: ProductCategory,
    pub suggested_price: Decimal,
    pub condition: String,
    pub keywords: Vec<String>,
    /// Merged image facts from all identifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<ImageMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_matches_keywords() {
        assert_eq!(ProductCategory::from_label("Laptop, notebook computer"), ProductCategory::Electronics);
        assert_eq!(ProductCategory::from_label("running shoes"), ProductCategory::Fashion);
        assert_eq!(ProductCategory::from_label("Table LAMP"), ProductCategory::Home);
        assert_eq!(ProductCategory::from_label("banana"), ProductCategory::General);
    }

    #[test]
    fn test_from_label_uses_first_matching_category() {
        // "fitness" belongs to both sports and health; sports is checked first.
        assert_eq!(ProductCategory::from_label("fitness tracker"), ProductCategory::Sports);
        // "educational" belongs to toys and books; toys wins.
        assert_eq!(ProductCategory::from_label("educational kit"), ProductCategory::Toys);
    }

    #[test]
    fn test_from_label_substring_semantics() {
        // "cardigan" contains "car".
        assert_eq!(ProductCategory::from_label("cardigan"), ProductCategory::Automotive);
    }

    #[test]
    fn test_category_round_trip_names() {
        assert_eq!("Electronics".parse::<ProductCategory>(), Ok(ProductCategory::Electronics));
        assert_eq!("".parse::<ProductCategory>(), Ok(ProductCategory::General));
        assert_eq!("electronic".parse::<ProductCategory>(), Ok(ProductCategory::Electronics));
        assert_eq!(ProductCategory::ColorAnalysis.to_string(), "color_analysis");
    }

    #[test]
    fn test_identification_serde_skips_empty_extras() {
        let json = serde_json::to_value(Identification::new("tabby cat", 0.5)).expect("serialize");
        assert!(json.get("bounding_box").is_none());
        assert_eq!(json["category"], "general");
    }
}
