//! Credential management for FalconX API authentication.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use secrecy::{ExposeSecret, SecretString};

use crate::error::FalconxError;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "FALCONX_API_KEY";
/// Environment variable holding the base64 secret key.
pub const ENV_SECRET_KEY: &str = "FALCONX_SECRET_KEY";
/// Environment variable holding the passphrase.
pub const ENV_PASSPHRASE: &str = "FALCONX_PASSPHRASE";

/// API credentials: key, base64-encoded secret and passphrase.
///
/// Validated on construction and immutable afterwards. The secret and the
/// passphrase never appear in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret_key: SecretString,
    passphrase: SecretString,
}

impl Credentials {
    /// Create credentials, failing with [`FalconxError::Config`] when any part
    /// is empty or the secret is not valid base64.
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Result<Self, FalconxError> {
        let api_key = api_key.into();
        let secret_key = secret_key.into();
        let passphrase = passphrase.into();

        let mut missing = Vec::new();
        if api_key.trim().is_empty() {
            missing.push("API key");
        }
        if secret_key.trim().is_empty() {
            missing.push("secret key");
        }
        if passphrase.trim().is_empty() {
            missing.push("passphrase");
        }
        if !missing.is_empty() {
            return Err(FalconxError::Config(format!(
                "missing credential: {}",
                missing.join(", ")
            )));
        }

        if BASE64.decode(secret_key.as_bytes()).is_err() {
            return Err(FalconxError::Config(
                "secret key must be valid base64".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            secret_key: SecretString::from(secret_key),
            passphrase: SecretString::from(passphrase),
        })
    }

    /// Load credentials from `FALCONX_API_KEY`, `FALCONX_SECRET_KEY` and
    /// `FALCONX_PASSPHRASE`.
    pub fn from_env() -> Result<Self, FalconxError> {
        Self::from_env_vars(ENV_API_KEY, ENV_SECRET_KEY, ENV_PASSPHRASE)
    }

    /// Load credentials from custom environment variable names.
    ///
    /// Unset variables are reported the same way as empty ones.
    pub fn from_env_vars(
        key_var: &str,
        secret_var: &str,
        passphrase_var: &str,
    ) -> Result<Self, FalconxError> {
        let read = |var: &str| std::env::var(var).unwrap_or_default();
        Self::new(read(key_var), read(secret_var), read(passphrase_var))
    }

    /// The public API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base64 secret for signing.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }

    /// Get the passphrase for the passphrase header.
    pub fn expose_passphrase(&self) -> &str {
        self.passphrase.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}
