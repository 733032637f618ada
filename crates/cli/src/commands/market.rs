//! Marketplace browsing commands.

use listing_desk::ListingDesk;

use super::CommandError;

/// Search the marketplace.
pub async fn search(
    desk: &ListingDesk,
    query: &str,
    category: Option<&str>,
    limit: u32,
) -> Result<(), CommandError> {
    print!("{}", desk.search_market(query, category, limit).await?);
    Ok(())
}

/// Show another seller's listings.
pub async fn seller(desk: &ListingDesk, seller_id: &str) -> Result<(), CommandError> {
    print!("{}", desk.seller_listings(seller_id).await?);
    Ok(())
}

/// Print item details as JSON.
pub async fn item(desk: &ListingDesk, item_id: &str) -> Result<(), CommandError> {
    let details = desk.item_details(item_id).await?;
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}

/// Print the category tree as JSON.
pub async fn categories(desk: &ListingDesk) -> Result<(), CommandError> {
    let tree = desk.categories().await?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}
