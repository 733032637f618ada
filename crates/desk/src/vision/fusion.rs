//! Merging identification sources into one ranked list.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use listing_desk_core::Identification;

use super::VisionError;
use super::upload::ImageUpload;

/// Something that can label an image.
#[async_trait]
pub trait IdentificationSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Label the image.
    async fn identify(&self, upload: &ImageUpload) -> Result<Vec<Identification>, VisionError>;
}

/// Run every source concurrently.
///
/// Returns one result list per successful source, in source order. A failed
/// source is logged and skipped.
pub async fn identify_all(
    sources: &[Arc<dyn IdentificationSource>],
    upload: &ImageUpload,
) -> Vec<Vec<Identification>> {
    let outcomes = join_all(sources.iter().map(|source| source.identify(upload))).await;

    sources
        .iter()
        .zip(outcomes)
        .filter_map(|(source, outcome)| match outcome {
            Ok(results) => {
                tracing::debug!(source = source.name(), count = results.len(), "source succeeded");
                Some(results)
            }
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "identification source failed");
                None
            }
        })
        .collect()
}

/// Flatten, drop repeated labels (case-insensitive, first occurrence kept)
/// and sort by descending confidence.
///
/// The sort is stable, so equal confidences keep source order.
#[must_use]
pub fn fuse(results: Vec<Vec<Identification>>) -> Vec<Identification> {
    let mut seen = HashSet::new();
    let mut fused: Vec<Identification> = results
        .into_iter()
        .flatten()
        .filter(|ident| seen.insert(ident.label.to_lowercase()))
        .collect();

    fused.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    fused
}

/// Mean confidence; zero for an empty list.
#[must_use]
pub fn overall_confidence(identifications: &[Identification]) -> f64 {
    if identifications.is_empty() {
        return 0.0;
    }
    let total: f64 = identifications.iter().map(|i| i.confidence).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = identifications.len() as f64;
    total / count
}
