//! # FalconX Client
//!
//! An async Rust client library for the FalconX REST and streaming APIs.
//!
//! ## Features
//!
//! - Signed REST transport with typed endpoints
//! - Socket.IO streaming session with automatic reconnection
//! - Subscription replay after every reconnect
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use falconx_api_client::auth::Credentials;
//! use falconx_api_client::rest::FalconxRestClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FalconxRestClient::new(Credentials::from_env()?);
//!     let balances = client.get_balances(None).await?;
//!     println!("Balances: {:?}", balances);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod rest;
pub mod types;
pub mod ws;

// Re-export commonly used types at crate root
pub use error::{ApiError, FalconxError};
pub use types::common::{Platform, Side, TokenPair, TokenQuantity};

/// Result type alias using FalconxError
pub type Result<T> = std::result::Result<T, FalconxError>;
