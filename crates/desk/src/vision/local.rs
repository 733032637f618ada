//! Local pixel-sampling analysis.
//!
//! Needs no network: decodes the image, finds the dominant quantized colour
//! and reports it as a single identification.

use std::collections::HashMap;

use async_trait::async_trait;
use image::RgbaImage;
use listing_desk_core::{Identification, ImageMetadata, ProductCategory};

use super::fusion::IdentificationSource;
use super::upload::ImageUpload;
use super::VisionError;

/// Confidence reported for the dominant colour.
pub const LOCAL_CONFIDENCE: f64 = 0.8;

/// Only every n-th pixel is sampled.
const SAMPLE_STRIDE: usize = 4;

/// Channel quantization step.
const BUCKET: u8 = 32;

const REFERENCE_COLORS: [(&str, [u8; 3]); 10] = [
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("purple", [128, 0, 128]),
    ("orange", [255, 165, 0]),
    ("brown", [139, 69, 19]),
    ("gray", [128, 128, 128]),
];

/// Dominant-colour analysis as an identification source.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAnalyzer;

#[async_trait]
impl IdentificationSource for LocalAnalyzer {
    fn name(&self) -> &'static str {
        "local_analysis"
    }

    async fn identify(&self, upload: &ImageUpload) -> Result<Vec<Identification>, VisionError> {
        let bytes = upload.shared_bytes();
        let metadata = tokio::task::spawn_blocking(move || -> Result<ImageMetadata, VisionError> {
            let image = image::load_from_memory(&bytes)?.to_rgba8();
            Ok(analyze(&image))
        })
        .await??;

        tracing::debug!(color = %metadata.dominant_color, "local analysis complete");

        Ok(vec![Identification {
            label: metadata.dominant_color.clone(),
            confidence: LOCAL_CONFIDENCE,
            category: ProductCategory::ColorAnalysis,
            bounding_box: None,
            metadata: Some(metadata),
        }])
    }
}

/// Measure an already-decoded image.
#[must_use]
pub fn analyze(image: &RgbaImage) -> ImageMetadata {
    let (width, height) = image.dimensions();
    let dominant_color =
        dominant_bucket(image).map_or_else(|| "unknown".to_string(), |[r, g, b]| rgb_to_color_name(r, g, b).to_string());

    let aspect_ratio = if height == 0 {
        0.0
    } else {
        f64::from(width) / f64::from(height)
    };

    ImageMetadata {
        dominant_color,
        width,
        height,
        aspect_ratio,
    }
}

/// Most frequent quantized colour among sampled pixels.
///
/// Ties go to the bucket seen first.
fn dominant_bucket(image: &RgbaImage) -> Option<[u8; 3]> {
    let mut order: Vec<[u8; 3]> = Vec::new();
    let mut counts: HashMap<[u8; 3], usize> = HashMap::new();

    for pixel in image.pixels().step_by(SAMPLE_STRIDE) {
        let [r, g, b, _] = pixel.0;
        let key = [quantize(r), quantize(g), quantize(b)];
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    let mut best: Option<([u8; 3], usize)> = None;
    for key in order {
        let count = counts.get(&key).copied().unwrap_or(0);
        if best.is_none_or(|(_, max)| count > max) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}

const fn quantize(channel: u8) -> u8 {
    channel / BUCKET * BUCKET
}

/// Nearest reference colour by Euclidean distance.
#[must_use]
pub fn rgb_to_color_name(r: u8, g: u8, b: u8) -> &'static str {
    let distance = |[cr, cg, cb]: [u8; 3]| {
        let dr = i32::from(r) - i32::from(cr);
        let dg = i32::from(g) - i32::from(cg);
        let db = i32::from(b) - i32::from(cb);
        dr * dr + dg * dg + db * db
    };

    let mut closest = "unknown";
    let mut min = i32::MAX;
    for (name, rgb) in REFERENCE_COLORS {
        let d = distance(rgb);
        if d < min {
            min = d;
            closest = name;
        }
    }
    closest
}
