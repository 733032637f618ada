//! Persisted OAuth token record.

use serde::{Deserialize, Serialize};

/// OAuth tokens as they are persisted between runs.
///
/// `timestamp` is the issue time in milliseconds since the Unix epoch. The
/// token's age is measured from it, so a refresh resets the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    /// The user access token.
    pub access_token: String,
    /// The refresh token, when one has been issued.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds as reported by the token endpoint.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Issue time (milliseconds since epoch).
    pub timestamp: i64,
}

impl StoredTokens {
    /// Age of the token in seconds relative to `now_ms`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn age_secs(&self, now_ms: i64) -> f64 {
        (now_ms - self.timestamp) as f64 / 1000.0
    }

    /// Whether the token was issued more than `threshold_secs` ago.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_older_than(&self, threshold_secs: i64, now_ms: i64) -> bool {
        self.age_secs(now_ms) > threshold_secs as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issued_at(timestamp: i64) -> StoredTokens {
        StoredTokens {
            access_token: "v^1.1#access".to_string(),
            refresh_token: Some("v^1.1#refresh".to_string()),
            expires_in: Some(7200),
            timestamp,
        }
    }

    #[test]
    fn test_age_secs() {
        let tokens = issued_at(1_000_000);
        assert!((tokens.age_secs(1_090_000) - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_is_older_than_threshold() {
        let tokens = issued_at(0);
        assert!(!tokens.is_older_than(3000, 3_000_000));
        assert!(tokens.is_older_than(3000, 3_000_001));
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let tokens: StoredTokens =
            serde_json::from_str(r#"{"access_token":"abc","timestamp":42}"#).expect("parse");
        assert_eq!(tokens.refresh_token, None);
        assert_eq!(tokens.expires_in, None);
    }
}
