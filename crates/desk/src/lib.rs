//! Listing Desk library.
//!
//! Seller-side eBay client: OAuth token lifecycle, inventory listings,
//! AI-assisted product identification and local draft keeping.
//!
//! # Security
//!
//! This crate handles marketplace credentials and tokens:
//! - The cert ID and tokens are persisted in the local store file
//! - `Debug` output of configuration and settings redacts secrets
//! - Secrets are never logged
//!
//! # Modules
//!
//! - [`ebay`] - OAuth grants and REST calls
//! - [`vision`] - Identification sources, fusion and product synthesis
//! - [`store`] - Fixed-key JSON blob persistence
//! - [`desk`] - User-facing operations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod desk;
pub mod drafts;
pub mod ebay;
pub mod error;
pub mod render;
pub mod settings;
pub mod store;
pub mod text;
pub mod vision;

pub use config::DeskConfig;
pub use desk::ListingDesk;
pub use error::DeskError;
