//! Authentication module for the FalconX API.
//!
//! This module provides:
//! - Credential management with secure secret storage
//! - Timestamp capture at signing time
//! - HMAC-SHA256 signature generation for authenticated calls

mod credentials;
mod signature;
mod timestamp;

pub use credentials::{Credentials, ENV_API_KEY, ENV_PASSPHRASE, ENV_SECRET_KEY};
pub use signature::{AuthHeaders, headers, sign_request};
pub use timestamp::{SystemClock, Timestamp, TimestampProvider};
