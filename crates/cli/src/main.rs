//! Listing Desk CLI - eBay seller desk in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Connect to eBay (prints the consent URL)
//! ldesk auth login --app-id APP --cert-id CERT --dev-id DEV --ru-name RU
//!
//! # Finish the consent flow with the URL eBay redirected to
//! ldesk auth callback 'https://example.com/accepted?code=...&state=...'
//!
//! # Show active listings
//! ldesk listings
//!
//! # Identify a product photo and prefill a draft
//! ldesk identify lamp.jpg
//! ldesk draft preview
//! ldesk draft save
//! ```
//!
//! # Commands
//!
//! - `auth` - Login, callback, status, refresh, logout
//! - `listings` - Show or update inventory listings
//! - `market` - Search the marketplace and browse items
//! - `identify` - Identify the product in an image
//! - `draft` - Edit, preview and save draft listings
//! - `settings` - Show or change settings
//! - `clear` - Wipe all local data
//! - `open` - Print the public page URL of an item
//!
//! # Logging
//!
//! `RUST_LOG` controls verbosity (default `listing_desk=info,listing_desk_cli=info`);
//! set `LISTING_DESK_LOG_JSON=1` for JSON log lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use commands::CommandError;
use listing_desk::{DeskConfig, DeskError, ListingDesk};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ldesk")]
#[command(author, version, about = "Listing Desk - eBay seller tools")]
struct Cli {
    /// Use the eBay sandbox
    #[arg(long, global = true)]
    sandbox: bool,

    /// Directory holding the local store (overrides `LISTING_DESK_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to or disconnect from eBay
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Show or update your inventory listings
    Listings {
        #[command(subcommand)]
        action: Option<ListingsAction>,
    },
    /// Browse the marketplace
    Market {
        #[command(subcommand)]
        action: MarketAction,
    },
    /// Identify the product in an image and prefill the draft form
    Identify {
        /// Image file (max 10MB)
        image: PathBuf,
    },
    /// Work on draft listings
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
    /// Clear all local data (credentials, tokens, drafts, settings)
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
    /// Print the public page URL of an item
    Open {
        /// Item ID or SKU
        item_id: String,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Start the consent flow and print the authorization URL
    Login(LoginArgs),
    /// Complete the consent flow from the redirect URL
    Callback {
        /// Full redirect URL (or just its query string)
        url: String,
    },
    /// Show the session status
    Status,
    /// Refresh the user token now
    Refresh,
    /// Forget the session
    Logout,
}

#[derive(Args)]
struct LoginArgs {
    /// Application (client) ID
    #[arg(long)]
    app_id: Option<String>,
    /// Certificate ID (client secret)
    #[arg(long)]
    cert_id: Option<String>,
    /// Developer ID
    #[arg(long)]
    dev_id: Option<String>,
    /// Redirect URI name
    #[arg(long)]
    ru_name: Option<String>,
    /// OAuth scope to request (repeatable)
    #[arg(long = "scope")]
    scopes: Vec<String>,
}

#[derive(Subcommand)]
enum ListingsAction {
    /// Replace an inventory item with a JSON body
    Update {
        /// Item SKU
        sku: String,
        /// File holding the inventory item JSON
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum MarketAction {
    /// Search items
    Search {
        /// Search keywords
        query: String,
        /// Restrict to a category ID
        #[arg(short, long)]
        category: Option<String>,
        /// Maximum results
        #[arg(short, long, default_value_t = 50)]
        limit: u32,
    },
    /// Show another seller's listings
    Seller {
        /// Seller username
        seller_id: String,
    },
    /// Show full item details as JSON
    Item {
        /// Item ID
        item_id: String,
    },
    /// Show the category tree as JSON
    Categories,
}

#[derive(Subcommand)]
enum DraftAction {
    /// Show the draft form
    Show,
    /// Change fields of the draft form
    Set(DraftFields),
    /// Generate a description for the draft form
    Describe,
    /// Preview the draft form as a listing
    Preview,
    /// Save the draft form as a draft
    Save,
    /// List saved drafts
    List,
}

#[derive(Args)]
struct DraftFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    condition: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show settings
    Show,
    /// Change settings
    Set {
        /// Hugging Face API token (empty string clears it)
        #[arg(long)]
        huggingface_token: Option<String>,
        /// Default shipping cost
        #[arg(long)]
        shipping: Option<String>,
        /// Default handling time in days
        #[arg(long)]
        handling: Option<String>,
    },
}

#[tokio::main]
#[allow(clippy::print_stdout)]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        if let Some(hint) = e.hint() {
            println!("{hint}");
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "listing_desk=info,listing_desk_cli=info".into());

    let json = std::env::var("LISTING_DESK_LOG_JSON").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), CommandError> {
    let mut config = DeskConfig::from_env().map_err(DeskError::from)?;
    if cli.sandbox {
        config.ebay.sandbox = true;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let sandbox = config.ebay.sandbox;
    let desk = ListingDesk::open(config).await?;

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login(args) => commands::auth::login(&desk, args, sandbox).await?,
            AuthAction::Callback { url } => commands::auth::callback(&desk, &url).await?,
            AuthAction::Status => commands::auth::status(&desk).await?,
            AuthAction::Refresh => commands::auth::refresh(&desk).await?,
            AuthAction::Logout => commands::auth::logout(&desk).await?,
        },
        Commands::Listings { action } => match action {
            None => commands::listings::show(&desk).await?,
            Some(ListingsAction::Update { sku, file }) => {
                commands::listings::update(&desk, &sku, &file).await?;
            }
        },
        Commands::Market { action } => match action {
            MarketAction::Search {
                query,
                category,
                limit,
            } => commands::market::search(&desk, &query, category.as_deref(), limit).await?,
            MarketAction::Seller { seller_id } => commands::market::seller(&desk, &seller_id).await?,
            MarketAction::Item { item_id } => commands::market::item(&desk, &item_id).await?,
            MarketAction::Categories => commands::market::categories(&desk).await?,
        },
        Commands::Identify { image } => commands::draft::identify(&desk, &image).await?,
        Commands::Draft { action } => match action {
            DraftAction::Show => commands::draft::show(&desk),
            DraftAction::Set(fields) => commands::draft::set(&desk, fields)?,
            DraftAction::Describe => commands::draft::describe(&desk).await?,
            DraftAction::Preview => commands::draft::preview(&desk)?,
            DraftAction::Save => commands::draft::save(&desk)?,
            DraftAction::List => commands::draft::list(&desk)?,
        },
        Commands::Settings { action } => match action {
            None | Some(SettingsAction::Show) => commands::settings::show(&desk)?,
            Some(SettingsAction::Set {
                huggingface_token,
                shipping,
                handling,
            }) => commands::settings::set(&desk, huggingface_token, shipping, handling).await?,
        },
        Commands::Clear { yes } => commands::settings::clear(&desk, yes).await?,
        Commands::Open { item_id } => println!("{}", desk.view_listing_url(&item_id).await),
    }
    Ok(())
}
