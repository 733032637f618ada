//! Identification pipeline and description generation against a fake
//! inference API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use listing_desk::settings::Settings;
use listing_desk::vision::VisionError;
use listing_desk::DeskError;
use listing_desk_core::{DraftError, DraftForm, ProductCategory};
use listing_desk_integration_tests::{FakeUpstream, GENERATED_DESCRIPTION, solid_png};

fn write_image(dir: &std::path::Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn token_settings() -> Settings {
    Settings {
        huggingface_token: "hf_Zt8qW3nLx5Rv2Kc9".to_string(),
        ..Settings::default()
    }
}

#[tokio::test]
async fn test_fused_report_survives_failing_source() {
    let upstream = FakeUpstream::start().await;
    upstream.take_detection_down();
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;
    let image = write_image(dir.path(), "laptop.png", &solid_png(8, 8, [255, 0, 0, 255]));

    let report = desk.identify(&image).await.unwrap();

    let labels: Vec<&str> = report.identifications.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["laptop computer", "red", "notebook"]);
    assert_eq!(report.identifications[1].category, ProductCategory::ColorAnalysis);

    let expected = (0.92 + 0.8 + 0.05) / 3.0;
    assert!((report.confidence - expected).abs() < 1e-9);

    let info = &report.product_info;
    assert_eq!(info.title, "Tech Laptop Computer - Excellent Condition");
    assert_eq!(info.category, ProductCategory::Electronics);
    assert!(info.description.starts_with("High-quality laptop computer"));
    assert!(info.description.ends_with("using advanced AI technology."));
    assert_eq!(info.specifications.as_ref().unwrap().dominant_color, "red");

    let form = desk.draft_form();
    assert_eq!(form.title, info.title);
    assert_eq!(form.category, "electronics");
    assert_eq!(form.price, "50");
    assert_eq!(form.condition, "Used");
}

#[tokio::test]
async fn test_detection_results_are_merged_without_duplicates() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;
    let image = write_image(dir.path(), "laptop.png", &solid_png(8, 8, [0, 0, 255, 255]));

    let report = desk.identify(&image).await.unwrap();

    let labels: Vec<&str> = report.identifications.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["laptop computer", "laptop", "blue", "notebook"]);
    assert!(report.identifications[1].bounding_box.is_some());

    let rendered = desk.identify_product(&image).await.unwrap();
    assert!(rendered.contains("Identified Items:"));
    assert!(rendered.contains("Laptop Computer (92.0%) - Category: electronics"));
    assert!(rendered.contains("Suggested Price: $50"));
}

#[tokio::test]
async fn test_non_image_is_rejected_before_any_request() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;
    let notes = write_image(dir.path(), "notes.txt", b"definitely not pixels");

    let err = desk.identify(&notes).await.unwrap_err();

    assert!(matches!(err, DeskError::Vision(VisionError::NotAnImage)));
    assert_eq!(desk.draft_form(), DraftForm::default());
}

#[tokio::test]
async fn test_ai_description_with_token() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;
    desk.save_settings(token_settings()).await.unwrap();

    let description = desk.generate_description("Laptop Computer", "electronics").await.unwrap();

    assert_eq!(description, GENERATED_DESCRIPTION);
    let prompts = upstream.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("Write a compelling eBay product description for a Laptop Computer"));
    assert!(prompts[0].contains("in the electronics category"));
}

#[tokio::test]
async fn test_ai_failure_falls_back_to_template() {
    let upstream = FakeUpstream::start().await;
    upstream.take_generation_down();
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;
    desk.save_settings(token_settings()).await.unwrap();

    let description = desk.generate_description("Brass Lamp", "home").await.unwrap();

    assert!(description.starts_with("Beautiful Brass Lamp that will enhance your home decor."));
    assert!(!description.contains("high confidence"));
}

#[tokio::test]
async fn test_describe_draft_then_save() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;
    desk.save_settings(token_settings()).await.unwrap();

    desk.save_draft_form(&DraftForm {
        title: "Laptop Computer".to_string(),
        category: "electronics".to_string(),
        price: "450".to_string(),
        condition: "Used".to_string(),
        description: String::new(),
    })
    .unwrap();

    let form = desk.describe_draft().await.unwrap();
    assert_eq!(form.description, GENERATED_DESCRIPTION);

    let preview = desk.preview_listing(&form).unwrap();
    assert!(preview.contains("Price: $450"));

    let draft = desk.save_draft(form).unwrap();
    assert_eq!(desk.drafts(), vec![draft]);
    assert_eq!(desk.draft_form(), DraftForm::default());

    // The draft survives a restart.
    let reopened = upstream.desk(dir.path()).await;
    assert_eq!(reopened.drafts().len(), 1);
    assert!(reopened.render_drafts().unwrap().contains("Laptop Computer"));
}

#[tokio::test]
async fn test_describe_requires_title() {
    let upstream = FakeUpstream::start().await;
    let dir = tempfile::tempdir().unwrap();
    let desk = upstream.desk(dir.path()).await;

    let err = desk.describe_draft().await.unwrap_err();
    assert!(matches!(err, DeskError::Draft(DraftError::MissingTitle)));
    assert!(upstream.prompts().is_empty());
}
