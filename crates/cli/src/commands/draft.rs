//! Identification and draft commands.
//!
//! # Usage
//!
//! ```bash
//! ldesk identify lamp.jpg
//! ldesk draft set --price 24.99 --condition "Used"
//! ldesk draft describe
//! ldesk draft preview
//! ldesk draft save
//! ldesk draft list
//! ```

use std::path::Path;

use listing_desk::ListingDesk;
use listing_desk_core::DraftForm;

use super::CommandError;
use crate::DraftFields;

/// Identify an image and print the report; the draft form is prefilled.
pub async fn identify(desk: &ListingDesk, image: &Path) -> Result<(), CommandError> {
    print!("{}", desk.identify_product(image).await?);
    println!();
    println!("Draft form prefilled. Review it with `ldesk draft show`.");
    Ok(())
}

/// Print the draft form.
pub fn show(desk: &ListingDesk) {
    let form = desk.draft_form();
    let field = |value: &str| {
        if value.is_empty() {
            "(empty)".to_string()
        } else {
            value.to_string()
        }
    };
    println!("Title:       {}", field(&form.title));
    println!("Category:    {}", field(&form.category));
    println!("Price:       {}", field(&form.price));
    println!("Condition:   {}", field(&form.condition));
    println!("Description:");
    println!("{}", field(&form.description));
}

fn apply(mut form: DraftForm, fields: DraftFields) -> DraftForm {
    if let Some(title) = fields.title {
        form.title = title;
    }
    if let Some(category) = fields.category {
        form.category = category;
    }
    if let Some(price) = fields.price {
        form.price = price;
    }
    if let Some(condition) = fields.condition {
        form.condition = condition;
    }
    if let Some(description) = fields.description {
        form.description = description;
    }
    form
}

/// Change fields of the draft form.
pub fn set(desk: &ListingDesk, fields: DraftFields) -> Result<(), CommandError> {
    let form = apply(desk.draft_form(), fields);
    desk.save_draft_form(&form)?;
    show(desk);
    Ok(())
}

/// Generate a description into the draft form.
pub async fn describe(desk: &ListingDesk) -> Result<(), CommandError> {
    let form = desk.describe_draft().await?;
    println!("{}", form.description);
    Ok(())
}

/// Preview the draft form.
pub fn preview(desk: &ListingDesk) -> Result<(), CommandError> {
    print!("{}", desk.preview_listing(&desk.draft_form())?);
    Ok(())
}

/// Save the draft form as a draft.
pub fn save(desk: &ListingDesk) -> Result<(), CommandError> {
    let draft = desk.save_draft(desk.draft_form())?;
    println!("Draft saved successfully! ({})", draft.id);
    Ok(())
}

/// List saved drafts.
pub fn list(desk: &ListingDesk) -> Result<(), CommandError> {
    print!("{}", desk.render_drafts()?);
    Ok(())
}
