//! Marketplace application credentials.

use serde::{Deserialize, Serialize};

/// Errors raised when validating [`Credentials`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    /// A required field is empty.
    #[error("all credential fields are required ({0} is missing)")]
    Missing(&'static str),
}

/// Developer application credentials for the eBay APIs.
///
/// The `sandbox` flag selects the endpoint set but is deliberately not
/// persisted: stored credentials always reload as production and the flag is
/// supplied again by configuration or the command line.
///
/// Implements `Debug` manually to redact the cert ID (the client secret).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Application (client) ID.
    pub app_id: String,
    /// Certificate ID (client secret).
    pub cert_id: String,
    /// Developer ID.
    pub dev_id: String,
    /// Redirect URI name registered for the application.
    pub ru_name: String,
    /// Use the sandbox environment.
    #[serde(skip)]
    pub sandbox: bool,
}

impl Credentials {
    /// Check that every credential field is present.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::Missing`] naming the first empty field.
    pub fn validate(&self) -> Result<(), CredentialsError> {
        let fields = [
            ("app_id", &self.app_id),
            ("cert_id", &self.cert_id),
            ("dev_id", &self.dev_id),
            ("ru_name", &self.ru_name),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(CredentialsError::Missing(name));
            }
        }

        Ok(())
    }

    /// Whether enough is present to talk to the token endpoint.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.app_id.is_empty() && !self.cert_id.is_empty() && !self.dev_id.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("cert_id", &"[REDACTED]")
            .field("dev_id", &self.dev_id)
            .field("ru_name", &self.ru_name)
            .field("sandbox", &self.sandbox)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Credentials {
        Credentials {
            app_id: "Seller-App-PRD-1234".to_string(),
            cert_id: "PRD-cert-5678".to_string(),
            dev_id: "dev-9012".to_string(),
            ru_name: "Seller-Seller-App-abcd".to_string(),
            sandbox: true,
        }
    }

    #[test]
    fn test_validate_complete() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let mut creds = complete();
        creds.dev_id = "  ".to_string();
        creds.ru_name = String::new();
        assert_eq!(creds.validate(), Err(CredentialsError::Missing("dev_id")));
    }

    #[test]
    fn test_sandbox_flag_not_serialized() {
        let json = serde_json::to_value(complete()).expect("serialize");
        assert!(json.get("sandbox").is_none());
        assert_eq!(json["appId"], "Seller-App-PRD-1234");

        let back: Credentials = serde_json::from_value(json).expect("deserialize");
        assert!(!back.sandbox);
    }

    #[test]
    fn test_debug_redacts_cert_id() {
        let output = format!("{:?}", complete());
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("PRD-cert-5678"));
    }
}
