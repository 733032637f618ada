//! Core types for Listing Desk.
//!
//! This module provides type-safe records for the seller's domain concepts.

pub mod credential;
pub mod draft;
pub mod id;
pub mod identification;
pub mod listing;
pub mod price;
pub mod status;
pub mod token;

pub use credential::{Credentials, CredentialsError};
pub use draft::{DEFAULT_CONDITION, Draft, DraftError, DraftForm};
pub use id::DraftId;
pub use identification::{BoundingBox, Identification, ImageMetadata, ProductCategory, ProductInfo};
pub use listing::Listing;
pub use price::Price;
pub use status::*;
pub use token::StoredTokens;
