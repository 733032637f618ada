//! Inventory listing commands.

use std::path::Path;

use listing_desk::ListingDesk;

use super::CommandError;

/// Print the seller's listings.
pub async fn show(desk: &ListingDesk) -> Result<(), CommandError> {
    print!("{}", desk.refresh_listings().await?);
    Ok(())
}

/// Replace an inventory item with the JSON in `file`.
pub async fn update(desk: &ListingDesk, sku: &str, file: &Path) -> Result<(), CommandError> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .map_err(|source| CommandError::Read {
            path: file.to_path_buf(),
            source,
        })?;
    let body: serde_json::Value = serde_json::from_str(&raw)?;

    let response = desk.update_listing(sku, &body).await?;
    tracing::info!(sku, "listing updated");

    if response.is_null() {
        println!("Listing {sku} updated.");
    } else {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}
