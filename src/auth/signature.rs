//! HMAC-SHA256 signature generation for FalconX API authentication.
//!
//! Every authenticated call (REST request or streaming handshake) is signed as:
//! ```text
//! HMAC-SHA256(timestamp + METHOD + path + body, base64_decode(secret_key))
//! ```
//!
//! The signature is then base64-encoded and sent in the `FX-ACCESS-SIGN`
//! header, together with the timestamp, the API key and the passphrase.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::{Credentials, Timestamp};
use crate::error::FalconxError;

type HmacSha256 = Hmac<Sha256>;

/// Authentication header names.
pub mod headers {
    /// Base64 HMAC signature.
    pub const ACCESS_SIGN: &str = "FX-ACCESS-SIGN";
    /// Signing timestamp in fractional seconds.
    pub const ACCESS_TIMESTAMP: &str = "FX-ACCESS-TIMESTAMP";
    /// Public API key.
    pub const ACCESS_KEY: &str = "FX-ACCESS-KEY";
    /// Account passphrase.
    pub const ACCESS_PASSPHRASE: &str = "FX-ACCESS-PASSPHRASE";
}

/// Sign a request for the FalconX API.
///
/// # Arguments
///
/// * `credentials` - API credentials containing the secret
/// * `timestamp` - The rendered signing timestamp (e.g. "1700000000.123")
/// * `method` - HTTP method; upper-cased before signing
/// * `path` - The versioned request path (e.g. "/v1/pairs")
/// * `body` - The exact body sent on the wire, empty when there is none
///
/// # Returns
///
/// Base64-encoded HMAC-SHA256 signature.
///
/// # Example
///
/// ```rust,no_run
/// use falconx_api_client::auth::{Credentials, sign_request};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = Credentials::new("api_key", "YXBpX3NlY3JldA==", "passphrase")?;
/// let signature = sign_request(&credentials, "1700000000.123", "GET", "/v1/pairs", "")?;
/// # Ok(())
/// # }
/// ```
pub fn sign_request(
    credentials: &Credentials,
    timestamp: &str,
    method: &str,
    path: &str,
    body: &str,
) -> Result<String, FalconxError> {
    let secret_decoded = BASE64
        .decode(credentials.expose_secret())
        .map_err(|_| FalconxError::Config("secret key must be valid base64".to_string()))?;

    let mut hmac = HmacSha256::new_from_slice(&secret_decoded)
        .map_err(|e| FalconxError::Config(format!("Invalid HMAC key: {e}")))?;
    hmac.update(timestamp.as_bytes());
    hmac.update(method.to_ascii_uppercase().as_bytes());
    hmac.update(path.as_bytes());
    hmac.update(body.as_bytes());

    Ok(BASE64.encode(hmac.finalize().into_bytes()))
}

/// The four authentication headers for one call.
///
/// Built fresh for every request; a timestamp is never reused.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    /// Base64 HMAC signature.
    pub sign: String,
    /// Rendered timestamp that was signed.
    pub timestamp: String,
    /// Public API key.
    pub key: String,
    passphrase: String,
}

impl AuthHeaders {
    /// Sign `method`/`path`/`body` at `timestamp` and collect the header values.
    pub fn new(
        credentials: &Credentials,
        timestamp: Timestamp,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<Self, FalconxError> {
        let timestamp = timestamp.to_string();
        let sign = sign_request(credentials, &timestamp, method, path, body)?;
        Ok(Self {
            sign,
            timestamp,
            key: credentials.api_key().to_string(),
            passphrase: credentials.expose_passphrase().to_string(),
        })
    }

    /// The passphrase header value.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Header name/value pairs in wire form.
    pub fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            (headers::ACCESS_SIGN, self.sign.as_str()),
            (headers::ACCESS_TIMESTAMP, self.timestamp.as_str()),
            (headers::ACCESS_KEY, self.key.as_str()),
            (headers::ACCESS_PASSPHRASE, self.passphrase.as_str()),
        ]
    }
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeaders")
            .field("sign", &self.sign)
            .field("timestamp", &self.timestamp)
            .field("key", &self.key)
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}
