//! Listing Desk configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional. Credentials can instead be supplied on the
//! command line and are remembered in the local store.
//!
//! ## Marketplace
//! - `EBAY_APP_ID`, `EBAY_CERT_ID`, `EBAY_DEV_ID`, `EBAY_RU_NAME` - Application
//!   credentials (all four must be set together)
//! - `EBAY_SANDBOX` - Use the sandbox environment (`true`/`1`, default: false)
//! - `EBAY_API_URL` - Override the REST API base URL
//! - `EBAY_TOKEN_URL` - Override the OAuth token endpoint
//! - `EBAY_SIGNIN_URL` - Override the user consent (sign-in) endpoint
//! - `EBAY_ITEM_URL` - Override the public item page base URL
//!
//! ## Inference
//! - `HUGGINGFACE_TOKEN` - Hugging Face API token (enables AI descriptions)
//! - `HUGGINGFACE_API_URL` - Inference API base (default: <https://api-inference.huggingface.co>)
//! - `HUGGINGFACE_CLASSIFICATION_MODEL` - default: google/vit-base-patch16-224
//! - `HUGGINGFACE_DETECTION_MODEL` - default: facebook/detr-resnet-50
//! - `HUGGINGFACE_TEXT_MODEL` - default: microsoft/DialoGPT-medium
//!
//! ## Runtime
//! - `LISTING_DESK_DATA_DIR` - Directory holding `store.json` (default: platform data dir)
//! - `LISTING_DESK_HTTP_TIMEOUT_SECS` - HTTP timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use listing_desk_core::Credentials;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_HUGGINGFACE_API_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_CLASSIFICATION_MODEL: &str = "google/vit-base-patch16-224";
const DEFAULT_DETECTION_MODEL: &str = "facebook/detr-resnet-50";
const DEFAULT_TEXT_MODEL: &str = "microsoft/DialoGPT-medium";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "enter-",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("Could not determine a data directory; set LISTING_DESK_DATA_DIR")]
    NoDataDir,
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    /// Directory holding the local store.
    pub data_dir: PathBuf,
    /// Timeout applied to every outbound HTTP request.
    pub http_timeout: Duration,
    /// Marketplace configuration.
    pub ebay: EbayConfig,
    /// Inference configuration.
    pub vision: VisionConfig,
}

/// Marketplace configuration.
#[derive(Debug, Clone, Default)]
pub struct EbayConfig {
    /// Credentials from the environment, when all four are present.
    pub credentials: Option<Credentials>,
    /// Use sandbox endpoints.
    pub sandbox: bool,
    /// REST API base override.
    pub api_url: Option<String>,
    /// Token endpoint override.
    pub token_url: Option<String>,
    /// Consent endpoint override.
    pub signin_url: Option<String>,
    /// Public item page base override.
    pub item_url: Option<String>,
}

/// Hugging Face inference configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct VisionConfig {
    /// Inference API base URL.
    pub api_url: String,
    /// Optional API token.
    pub token: Option<SecretString>,
    /// Model used for image classification.
    pub classification_model: String,
    /// Model used for object detection.
    pub detection_model: String,
    /// Model used for description generation.
    pub text_model: String,
}

impl std::fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionConfig")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("classification_model", &self.classification_model)
            .field("detection_model", &self.detection_model)
            .field("text_model", &self.text_model)
            .finish()
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_HUGGINGFACE_API_URL.to_string(),
            token: None,
            classification_model: DEFAULT_CLASSIFICATION_MODEL.to_string(),
            detection_model: DEFAULT_DETECTION_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }
}

impl DeskConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or no data directory
    /// can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or no data directory
    /// can be determined.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match get("LISTING_DESK_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|d| d.join("listing-desk"))
                .ok_or(ConfigError::NoDataDir)?,
        };

        let http_timeout = get("LISTING_DESK_HTTP_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar("LISTING_DESK_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        let sandbox = get("EBAY_SANDBOX")
            .map(|v| parse_bool("EBAY_SANDBOX", &v))
            .transpose()?
            .unwrap_or(false);

        let credentials = match (
            get("EBAY_APP_ID"),
            get("EBAY_CERT_ID"),
            get("EBAY_DEV_ID"),
            get("EBAY_RU_NAME"),
        ) {
            (Some(app_id), Some(cert_id), Some(dev_id), Some(ru_name)) => {
                warn_if_weak(&cert_id, "EBAY_CERT_ID");
                Some(Credentials {
                    app_id,
                    cert_id,
                    dev_id,
                    ru_name,
                    sandbox,
                })
            }
            (None, None, None, None) => None,
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "EBAY_*".to_string(),
                    "EBAY_APP_ID, EBAY_CERT_ID, EBAY_DEV_ID and EBAY_RU_NAME must be set together"
                        .to_string(),
                ));
            }
        };

        let ebay = EbayConfig {
            credentials,
            sandbox,
            api_url: get("EBAY_API_URL"),
            token_url: get("EBAY_TOKEN_URL"),
            signin_url: get("EBAY_SIGNIN_URL"),
            item_url: get("EBAY_ITEM_URL"),
        };

        let token = get("HUGGINGFACE_TOKEN").map(|token| {
            warn_if_weak(&token, "HUGGINGFACE_TOKEN");
            SecretString::from(token)
        });

        let vision = VisionConfig {
            api_url: get("HUGGINGFACE_API_URL")
                .unwrap_or_else(|| DEFAULT_HUGGINGFACE_API_URL.to_string()),
            token,
            classification_model: get("HUGGINGFACE_CLASSIFICATION_MODEL")
                .unwrap_or_else(|| DEFAULT_CLASSIFICATION_MODEL.to_string()),
            detection_model: get("HUGGINGFACE_DETECTION_MODEL")
                .unwrap_or_else(|| DEFAULT_DETECTION_MODEL.to_string()),
            text_model: get("HUGGINGFACE_TEXT_MODEL")
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
        };

        Ok(Self {
            data_dir,
            http_timeout: Duration::from_secs(http_timeout),
            ebay,
            vision,
        })
    }

    /// Path of the JSON store file.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Calculate Shannon entropy in bits per character.
#[allow(clippy::cast_precision_loss)]
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq = std::collections::HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0usize) += 1;
    }

    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"),
        ));
    }

    Ok(())
}

fn warn_if_weak(secret: &str, var_name: &str) {
    if let Err(e) = validate_secret_strength(secret, var_name) {
        tracing::warn!("{var_name} validation warning: {e}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DeskConfig::from_lookup(lookup(&[("LISTING_DESK_DATA_DIR", "/tmp/desk")])).unwrap();
        assert_eq!(config.store_path(), PathBuf::from("/tmp/desk/store.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(!config.ebay.sandbox);
        assert!(config.ebay.credentials.is_none());
        assert_eq!(config.vision.api_url, DEFAULT_HUGGINGFACE_API_URL);
        assert_eq!(config.vision.classification_model, "google/vit-base-patch16-224");
        assert!(config.vision.token.is_none());
    }

    #[test]
    fn test_credentials_from_env() {
        let config = DeskConfig::from_lookup(lookup(&[
            ("LISTING_DESK_DATA_DIR", "/tmp/desk"),
            ("EBAY_APP_ID", "App-123"),
            ("EBAY_CERT_ID", "PRD-9f8e7d6c5b4a"),
            ("EBAY_DEV_ID", "dev-1"),
            ("EBAY_RU_NAME", "ru-name"),
            ("EBAY_SANDBOX", "true"),
        ]))
        .unwrap();

        let creds = config.ebay.credentials.unwrap();
        assert_eq!(creds.app_id, "App-123");
        assert!(creds.sandbox);
        assert!(config.ebay.sandbox);
    }

    #[test]
    fn test_partial_credentials_rejected() {
        let result = DeskConfig::from_lookup(lookup(&[
            ("LISTING_DESK_DATA_DIR", "/tmp/desk"),
            ("EBAY_APP_ID", "App-123"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_invalid_bool_and_timeout() {
        let result = DeskConfig::from_lookup(lookup(&[
            ("LISTING_DESK_DATA_DIR", "/tmp/desk"),
            ("EBAY_SANDBOX", "maybe"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "EBAY_SANDBOX"));

        let result = DeskConfig::from_lookup(lookup(&[
            ("LISTING_DESK_DATA_DIR", "/tmp/desk"),
            ("LISTING_DESK_HTTP_TIMEOUT_SECS", "soon"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(validate_secret_strength("your-token-here", "T").is_err());
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaa", "T").is_err());
        assert!(validate_secret_strength("hf_aB3xY9mK2nL5pQ7rT0uW4zC6", "T").is_ok());
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_vision_config_debug_redacts_token() {
        let config = VisionConfig {
            token: Some(SecretString::from("hf_super_secret_token")),
            ..VisionConfig::default()
        };
        let output = format!("{config:?}");
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("hf_super_secret_token"));
    }
}
