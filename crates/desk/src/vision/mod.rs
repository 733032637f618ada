//! Product identification from images.
//!
//! # Architecture
//!
//! - Several [`IdentificationSource`]s run concurrently against one upload:
//!   remote image classification, remote object detection, and local colour
//!   analysis
//! - A failed source is logged and contributes nothing
//! - Results are fused into one ranked list and the best label is turned
//!   into a [`ProductInfo`] from category templates and a price table
//!
//! # Example
//!
//! ```rust,ignore
//! let vision = VisionService::new(&config.vision, timeout)?;
//! let upload = ImageUpload::from_path("lamp.jpg").await?;
//! let report = vision.identify(&upload).await;
//! println!("{} ({:.1}%)", report.product_info.title, report.confidence * 100.0);
//! ```

pub mod client;
pub mod fusion;
pub mod local;
pub mod product;
pub mod upload;

pub use client::{HuggingFaceClient, RemoteClassifier};
pub use fusion::{IdentificationSource, fuse, overall_confidence};
pub use local::LocalAnalyzer;
pub use upload::{ImageUpload, MAX_UPLOAD_BYTES};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use listing_desk_core::{Identification, ProductCategory, ProductInfo};
use secrecy::SecretString;
use thiserror::Error;

use crate::config::VisionConfig;

/// Errors that can occur while identifying a product.
#[derive(Debug, Error)]
pub enum VisionError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The inference API answered with a non-success status.
    #[error("inference API error for {model}: {status}")]
    Api {
        /// Model that was called.
        model: String,
        /// HTTP status code.
        status: u16,
    },

    /// Text generation requested without an API token.
    #[error("text generation requires a Hugging Face token")]
    NoToken,

    /// Text generation returned nothing usable.
    #[error("text generation returned no text")]
    EmptyGeneration,

    /// The uploaded file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The uploaded file is not a recognised image.
    #[error("please select a valid image file")]
    NotAnImage,

    /// The uploaded file is over the size limit.
    #[error("image size must be less than 10MB (got {size} bytes)")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
    },

    /// Pixel data could not be decoded.
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// A blocking analysis task panicked or was cancelled.
    #[error("analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Outcome of running every source against one image.
#[derive(Debug, Clone)]
pub struct IdentificationReport {
    /// Fused identifications, best first.
    pub identifications: Vec<Identification>,
    /// Listing suggestion built from the best identification.
    pub product_info: ProductInfo,
    /// Mean confidence of `identifications`.
    pub confidence: f64,
}

/// Identification pipeline: sources, fusion and description generation.
#[derive(Clone)]
pub struct VisionService {
    client: HuggingFaceClient,
    sources: Vec<Arc<dyn IdentificationSource>>,
}

impl VisionService {
    /// Build the service with the default sources.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::Http` if the HTTP client cannot be built.
    pub fn new(config: &VisionConfig, timeout: Duration) -> Result<Self, VisionError> {
        let client = HuggingFaceClient::new(config, timeout)?;
        let sources: Vec<Arc<dyn IdentificationSource>> = vec![
            Arc::new(RemoteClassifier::classification(client.clone())),
            Arc::new(RemoteClassifier::detection(client.clone())),
            Arc::new(LocalAnalyzer),
        ];
        Ok(Self { client, sources })
    }

    /// Build the service with explicit sources.
    #[must_use]
    pub const fn with_sources(client: HuggingFaceClient, sources: Vec<Arc<dyn IdentificationSource>>) -> Self {
        Self { client, sources }
    }

    /// The underlying inference client.
    #[must_use]
    pub const fn client(&self) -> &HuggingFaceClient {
        &self.client
    }

    /// Replace the API token used by every remote call.
    pub async fn set_token(&self, token: Option<SecretString>) {
        self.client.set_token(token).await;
    }

    /// Run every source, fuse the results and synthesize product info.
    pub async fn identify(&self, upload: &ImageUpload) -> IdentificationReport {
        let results = fusion::identify_all(&self.sources, upload).await;
        let identifications = fuse(results);
        let confidence = overall_confidence(&identifications);
        let product_info = self.product_info(&identifications).await;

        tracing::info!(
            count = identifications.len(),
            confidence,
            title = %product_info.title,
            "identification complete"
        );

        IdentificationReport {
            identifications,
            product_info,
            confidence,
        }
    }

    /// Listing suggestion for a fused identification list.
    pub async fn product_info(&self, identifications: &[Identification]) -> ProductInfo {
        let Some(top) = identifications.first() else {
            return product::generic_product_info();
        };

        let description = self
            .describe(&top.label, top.category, Some(top.confidence))
            .await;
        product::product_info(top, description, identifications)
    }

    /// Listing description for a label.
    ///
    /// Uses text generation when a token is configured and falls back to the
    /// category template on any failure.
    pub async fn describe(&self, label: &str, category: ProductCategory, top_confidence: Option<f64>) -> String {
        if self.client.has_token().await {
            match self.client.generate_text(&product::description_prompt(label, category)).await {
                Ok(text) => return text,
                Err(e) => tracing::warn!(error = %e, "AI description generation failed"),
            }
        }
        product::template_description(label, category, top_confidence)
    }
}
