//! Slack signing configuration.

use std::{env, fmt, sync::Arc};

/// Maximum age in seconds a signed request may have before it is rejected
pub const MAX_PERMITTED_REQUEST_AGE: u64 = 100;

/// Default upper bound on the request body buffered for verification
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024;

/// Shared signing secret used as the HMAC key
///
/// The bytes are never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    /// Create a secret from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    /// Borrow the raw key bytes
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

impl From<&str> for SigningSecret {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for SigningSecret {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl From<&[u8]> for SigningSecret {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

impl From<Vec<u8>> for SigningSecret {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

/// Configuration for Slack request verification
#[derive(Clone, Debug)]
pub struct SlackSigningConfig {
    pub secret: SigningSecret,
    pub max_request_age_seconds: u64,
    pub max_body_bytes: usize,
}

impl Default for SlackSigningConfig {
    fn default() -> Self {
        Self {
            secret: SigningSecret::from(""),
            max_request_age_seconds: MAX_PERMITTED_REQUEST_AGE,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl SlackSigningConfig {
    /// Create a configuration with the given secret and default limits
    pub fn new(secret: impl Into<SigningSecret>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let secret = env::var("SLACK_SIGNING_SECRET").unwrap_or_default();

        let max_request_age_seconds = env::var("SLACK_MAX_REQUEST_AGE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(MAX_PERMITTED_REQUEST_AGE);

        let max_body_bytes = env::var("SLACK_MAX_BODY_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        if secret.is_empty() {
            tracing::warn!(
                target: "slack_verify",
                "SLACK_SIGNING_SECRET is not set; every request will fail signature verification"
            );
        }

        Self {
            secret: SigningSecret::from(secret),
            max_request_age_seconds,
            max_body_bytes,
        }
    }
}
