//! Top-level error type for controller operations.

use listing_desk_core::{CredentialsError, DraftError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::ebay::EbayError;
use crate::store::StoreError;
use crate::vision::VisionError;

/// Errors surfaced by [`crate::ListingDesk`] operations.
#[derive(Debug, Error)]
pub enum DeskError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ebay(#[from] EbayError),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error(transparent)]
    Draft(#[from] DraftError),

    /// A template failed to render.
    #[error("render error: {0}")]
    Render(#[from] askama::Error),

    /// The redirect URL could not be parsed.
    #[error("invalid redirect URL: {0}")]
    RedirectUrl(#[from] url::ParseError),

    /// The redirect carried neither a code nor an error.
    #[error("redirect URL is missing the '{0}' parameter")]
    MissingCallbackParam(&'static str),
}

impl DeskError {
    /// Whether re-authenticating would likely fix this error.
    #[must_use]
    pub const fn needs_login(&self) -> bool {
        matches!(
            self,
            Self::Ebay(EbayError::NotAuthenticated | EbayError::Unauthorized(_) | EbayError::NoRefreshToken)
        )
    }
}
