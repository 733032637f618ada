//! Listing suggestions synthesized from identifications.

use listing_desk_core::{DEFAULT_CONDITION, Identification, ImageMetadata, ProductCategory, ProductInfo};
use rust_decimal::Decimal;

use crate::text::capitalize_words;

/// Confidence above which the description notes the identification.
pub const HIGH_CONFIDENCE: f64 = 0.8;

const HIGH_CONFIDENCE_NOTE: &str = "Product identified with high confidence using advanced AI technology.";
const KEYWORDS_PER_CATEGORY: usize = 5;

/// Listing title for a label.
#[must_use]
pub fn product_title(label: &str, category: ProductCategory) -> String {
    let prefix = match category {
        ProductCategory::Electronics => "Tech",
        ProductCategory::Fashion => "Style",
        ProductCategory::Home => "Home",
        ProductCategory::Sports => "Sports",
        ProductCategory::Automotive => "Auto",
        _ => "Quality",
    };
    let clean = capitalize_words(&label.replace(['_', '-'], " "));
    format!("{prefix} {clean} - Excellent Condition")
}

/// Base price for a category.
#[must_use]
pub fn suggested_price(category: ProductCategory) -> Decimal {
    let dollars = match category {
        ProductCategory::Electronics => 50,
        ProductCategory::Home => 30,
        ProductCategory::Sports => 35,
        ProductCategory::Automotive => 40,
        ProductCategory::Books => 15,
        ProductCategory::Toys => 20,
        _ => 25,
    };
    Decimal::from(dollars)
}

/// Search keywords: the label, the category, then the first few category
/// keywords, without repeats.
#[must_use]
pub fn keywords(label: &str, category: ProductCategory) -> Vec<String> {
    let candidates = [label, category.as_str()]
        .into_iter()
        .chain(category.keywords().iter().copied().take(KEYWORDS_PER_CATEGORY));

    let mut out: Vec<String> = Vec::new();
    for candidate in candidates {
        if !out.iter().any(|k| k == candidate) {
            out.push(candidate.to_string());
        }
    }
    out
}

/// Template description for a label.
///
/// `top_confidence` is the best identification's score, if any.
#[must_use]
pub fn template_description(label: &str, category: ProductCategory, top_confidence: Option<f64>) -> String {
    let body = match category {
        ProductCategory::Electronics => format!(
            "High-quality {label} in excellent condition. Perfect for everyday use with reliable performance. \
             Features modern design and user-friendly interface. Great value for money!"
        ),
        ProductCategory::Fashion => format!(
            "Stylish {label} that combines comfort and fashion. Made from quality materials with attention to \
             detail. Perfect for various occasions and easy to care for."
        ),
        ProductCategory::Home => format!(
            "Beautiful {label} that will enhance your home decor. Functional and aesthetically pleasing design. \
             Durable construction ensures long-lasting use."
        ),
        ProductCategory::Sports => format!(
            "Premium {label} for sports enthusiasts. Designed for performance and durability. Suitable for both \
             beginners and professionals."
        ),
        ProductCategory::Automotive => format!(
            "Reliable {label} for your vehicle. Quality construction meets safety standards. Easy installation \
             and long-lasting performance."
        ),
        _ => format!(
            "Quality {label} in good condition. Functional and well-maintained. Perfect for anyone looking for \
             reliable value. Fast shipping and excellent customer service guaranteed!"
        ),
    };

    match top_confidence {
        Some(confidence) if confidence > HIGH_CONFIDENCE => format!("{body}\n\n{HIGH_CONFIDENCE_NOTE}"),
        _ => body,
    }
}

/// Prompt sent to the text-generation model.
#[must_use]
pub fn description_prompt(label: &str, category: ProductCategory) -> String {
    format!(
        "Write a compelling eBay product description for a {label} in the {category} category. \
         Include key features, benefits, and selling points. Keep it under 200 words."
    )
}

/// Image facts gathered from the identifications; later entries win.
#[must_use]
pub fn specifications(identifications: &[Identification]) -> Option<ImageMetadata> {
    identifications.iter().rev().find_map(|i| i.metadata.clone())
}

/// Product info for the top identification with an already-chosen description.
#[must_use]
pub fn product_info(top: &Identification, description: String, identifications: &[Identification]) -> ProductInfo {
    ProductInfo {
        title: product_title(&top.label, top.category),
        description,
        category: top.category,
        suggested_price: suggested_price(top.category),
        condition: DEFAULT_CONDITION.to_string(),
        keywords: keywords(&top.label, top.category),
        specifications: specifications(identifications),
    }
}

/// Product info used when nothing was identified.
#[must_use]
pub fn generic_product_info() -> ProductInfo {
    ProductInfo {
        title: "Quality Product - Excellent Condition".to_string(),
        description: "Quality item in good condition. Perfect for anyone looking for reliable value. \
                      Fast shipping and excellent customer service guaranteed!"
            .to_string(),
        category: ProductCategory::General,
        suggested_price: Decimal::from(25),
        condition: DEFAULT_CONDITION.to_string(),
        keywords: vec!["quality".to_string(), "value".to_string(), "reliable".to_string()],
        specifications: None,
    }
}
