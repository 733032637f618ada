//! Persisted application settings.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

const DEFAULT_SHIPPING: &str = "9.99";
const DEFAULT_HANDLING: &str = "1";

/// Seller settings kept in the local store.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Hugging Face API token; empty when unset.
    #[serde(default)]
    pub huggingface_token: String,
    /// Default shipping cost, as entered.
    #[serde(default = "default_shipping")]
    pub default_shipping: String,
    /// Default handling time in days, as entered.
    #[serde(default = "default_handling")]
    pub default_handling: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            huggingface_token: String::new(),
            default_shipping: default_shipping(),
            default_handling: default_handling(),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("huggingface_token", &redacted(&self.huggingface_token))
            .field("default_shipping", &self.default_shipping)
            .field("default_handling", &self.default_handling)
            .finish()
    }
}

impl Settings {
    /// Fill blank fields with their defaults.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.default_shipping.trim().is_empty() {
            self.default_shipping = default_shipping();
        }
        if self.default_handling.trim().is_empty() {
            self.default_handling = default_handling();
        }
        self
    }

    /// The token as a secret, if one is set.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        secret(&self.huggingface_token)
    }
}

/// Inference settings kept separately from [`Settings`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionSettings {
    #[serde(default)]
    pub huggingface_token: String,
}

impl std::fmt::Debug for VisionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionSettings")
            .field("huggingface_token", &redacted(&self.huggingface_token))
            .finish()
    }
}

impl VisionSettings {
    /// The token as a secret, if one is set.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        secret(&self.huggingface_token)
    }
}

fn default_shipping() -> String {
    DEFAULT_SHIPPING.to_string()
}

fn default_handling() -> String {
    DEFAULT_HANDLING.to_string()
}

fn secret(value: &str) -> Option<SecretString> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| SecretString::from(trimmed.to_string()))
}

const fn redacted(value: &str) -> &'static str {
    if value.is_empty() { "" } else { "[REDACTED]" }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"huggingfaceToken":"hf_x"}"#).unwrap();
        assert_eq!(settings.default_shipping, "9.99");
        assert_eq!(settings.default_handling, "1");
        assert_eq!(settings.token().unwrap().expose_secret(), "hf_x");
    }

    #[test]
    fn test_blank_fields_normalized() {
        let settings = Settings {
            huggingface_token: "  ".to_string(),
            default_shipping: String::new(),
            default_handling: "3".to_string(),
        }
        .normalized();
        assert_eq!(settings.default_shipping, "9.99");
        assert_eq!(settings.default_handling, "3");
        assert!(settings.token().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings = Settings {
            huggingface_token: "hf_secret".to_string(),
            ..Settings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("hf_secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
