//! FalconX REST API client.
//!
//! [`FalconxRestClient::send`] is the authenticated transport; the typed
//! endpoint methods are thin wrappers over it.

mod client;
mod endpoints;
mod types;

pub use client::{FalconxRestClient, FalconxRestClientBuilder};
pub use endpoints::*;
pub use reqwest::Method;
pub use types::*;

/// The path that is signed and requested for a logical API path.
///
/// Adds the `/v1` prefix when it is missing.
///
/// ```
/// use falconx_api_client::rest::signing_path;
///
/// assert_eq!(signing_path("/pairs"), "/v1/pairs");
/// assert_eq!(signing_path("/v1/pairs"), "/v1/pairs");
/// ```
pub fn signing_path(path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    if path == API_VERSION_PREFIX || path.starts_with(&format!("{API_VERSION_PREFIX}/")) {
        path
    } else {
        format!("{API_VERSION_PREFIX}{path}")
    }
}
