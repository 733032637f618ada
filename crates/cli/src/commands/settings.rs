//! Settings and data management commands.

use listing_desk::settings::Settings;
use listing_desk::{DeskError, ListingDesk, render};

use super::CommandError;

/// Print the settings.
pub fn show(desk: &ListingDesk) -> Result<(), CommandError> {
    let rendered = render::settings(&desk.load_settings()).map_err(DeskError::from)?;
    print!("{rendered}");
    Ok(())
}

fn apply(
    current: Settings,
    huggingface_token: Option<String>,
    shipping: Option<String>,
    handling: Option<String>,
) -> Settings {
    Settings {
        huggingface_token: huggingface_token.unwrap_or(current.huggingface_token),
        default_shipping: shipping.unwrap_or(current.default_shipping),
        default_handling: handling.unwrap_or(current.default_handling),
    }
}

/// Change settings.
pub async fn set(
    desk: &ListingDesk,
    huggingface_token: Option<String>,
    shipping: Option<String>,
    handling: Option<String>,
) -> Result<(), CommandError> {
    let settings = apply(desk.load_settings(), huggingface_token, shipping, handling);
    desk.save_settings(settings).await?;
    println!("Settings saved successfully!");
    Ok(())
}

/// Wipe all local data.
pub async fn clear(desk: &ListingDesk, confirmed: bool) -> Result<(), CommandError> {
    if !confirmed {
        return Err(CommandError::NotConfirmed);
    }
    desk.clear_all_data().await?;
    println!("All data cleared.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_unset_values() {
        let current = Settings {
            huggingface_token: "hf_old".to_string(),
            default_shipping: "5.00".to_string(),
            default_handling: "2".to_string(),
        };
        let updated = apply(current, Some(String::new()), None, Some("3".to_string()));
        assert!(updated.huggingface_token.is_empty());
        assert_eq!(updated.default_shipping, "5.00");
        assert_eq!(updated.default_handling, "3");
    }
}
