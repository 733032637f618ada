//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! ldesk auth login --app-id APP --cert-id CERT --dev-id DEV --ru-name RU
//! ldesk auth callback 'https://example.com/accepted?code=v%5E1.1...&state=...'
//! ldesk auth status
//! ldesk auth refresh
//! ldesk auth logout
//! ```

use listing_desk::ListingDesk;
use listing_desk_core::Credentials;

use super::CommandError;
use crate::LoginArgs;

/// Merge command-line credentials over the remembered ones.
fn merge_credentials(known: Option<Credentials>, args: LoginArgs, sandbox: bool) -> Credentials {
    let known = known.unwrap_or_default();
    Credentials {
        app_id: args.app_id.unwrap_or(known.app_id),
        cert_id: args.cert_id.unwrap_or(known.cert_id),
        dev_id: args.dev_id.unwrap_or(known.dev_id),
        ru_name: args.ru_name.unwrap_or(known.ru_name),
        sandbox,
    }
}

/// Start the consent flow and print the authorization URL.
pub async fn login(desk: &ListingDesk, args: LoginArgs, sandbox: bool) -> Result<(), CommandError> {
    let scopes = args.scopes.clone();
    let credentials = merge_credentials(desk.resolve_credentials(), args, sandbox);
    let scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();

    let url = desk.authenticate(credentials, &scopes).await?;

    println!("Open this URL in a browser and grant access:");
    println!();
    println!("  {url}");
    println!();
    println!("Then run `ldesk auth callback '<redirect URL>'` with the URL eBay sends you to.");
    Ok(())
}

/// Complete the consent flow.
pub async fn callback(desk: &ListingDesk, url: &str) -> Result<(), CommandError> {
    desk.handle_callback(url).await?;
    println!("Successfully connected to eBay.");
    Ok(())
}

/// Print the session status.
pub async fn status(desk: &ListingDesk) -> Result<(), CommandError> {
    print!("{}", desk.status().await?);
    Ok(())
}

/// Refresh the user token.
pub async fn refresh(desk: &ListingDesk) -> Result<(), CommandError> {
    desk.ebay()
        .refresh_access_token()
        .await
        .map_err(listing_desk::DeskError::from)?;
    println!("Token refreshed.");
    Ok(())
}

/// Forget the session.
pub async fn logout(desk: &ListingDesk) -> Result<(), CommandError> {
    desk.logout().await?;
    println!("Disconnected from eBay.");
    Ok(())
}
