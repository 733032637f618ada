//! Status enums for listings and the OAuth session.

use serde::{Deserialize, Serialize};

/// Listing availability derived from the inventory quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ListingStatus {
    /// At least one unit can be shipped.
    Active,
    /// Nothing left to ship.
    #[default]
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl ListingStatus {
    /// Status for a given ship-to-location quantity.
    #[must_use]
    pub const fn from_quantity(quantity: i64) -> Self {
        if quantity > 0 {
            Self::Active
        } else {
            Self::OutOfStock
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::OutOfStock => "Out of Stock",
        }
    }

    /// Lowercase, hyphenated form used for styling hooks.
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OutOfStock => "out-of-stock",
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the marketplace session stands in the OAuth token lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No token of any kind.
    #[default]
    Unauthenticated,
    /// Client-credentials token only; public endpoints are reachable.
    ApplicationTokenOnly,
    /// A user access token (and usually a refresh token) is held.
    UserAuthorized,
    /// A refresh-token grant is in flight.
    TokenRefreshing,
}

impl AuthState {
    /// Whether user-scoped endpoints may be called.
    #[must_use]
    pub const fn has_user_token(&self) -> bool {
        matches!(self, Self::UserAuthorized | Self::TokenRefreshing)
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unauthenticated => "not connected",
            Self::ApplicationTokenOnly => "application token only",
            Self::UserAuthorized => "connected",
            Self::TokenRefreshing => "refreshing token",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_status_from_quantity() {
        assert_eq!(ListingStatus::from_quantity(3), ListingStatus::Active);
        assert_eq!(ListingStatus::from_quantity(0), ListingStatus::OutOfStock);
        assert_eq!(ListingStatus::from_quantity(-1), ListingStatus::OutOfStock);
    }

    #[test]
    fn test_listing_status_serde_labels() {
        assert_eq!(
            serde_json::to_string(&ListingStatus::OutOfStock).expect("serialize"),
            "\"Out of Stock\""
        );
        assert_eq!(ListingStatus::OutOfStock.slug(), "out-of-stock");
    }

    #[test]
    fn test_auth_state_user_token() {
        assert!(!AuthState::Unauthenticated.has_user_token());
        assert!(!AuthState::ApplicationTokenOnly.has_user_token());
        assert!(AuthState::UserAuthorized.has_user_token());
        assert!(AuthState::TokenRefreshing.has_user_token());
    }
}
