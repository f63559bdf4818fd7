//! FalconX streaming (Socket.IO) client.
//!
//! This module provides:
//! - [`StreamingSession`]: signed handshake, connection state machine and
//!   automatic reconnection
//! - [`SubscriptionManager`]: subscription registry with replay on reconnect
//!   and per-subscription event streams
//! - [`packet`]: the Engine.IO v3 / Socket.IO v2 text codec
//!
//! # Example
//!
//! ```rust,no_run
//! use falconx_api_client::auth::Credentials;
//! use falconx_api_client::types::TokenPair;
//! use falconx_api_client::ws::{SessionConfig, StreamingSession, Subscription, SubscriptionManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::builder().use_stage().build();
//!     let session = StreamingSession::new(Credentials::from_env()?, config)?;
//!     let manager = SubscriptionManager::new(session)?;
//!
//!     let pair = TokenPair::new("ETH", "USD");
//!     let mut quotes = manager.subscribe(Subscription::quotes("eth", &pair, &[10.into()]))?;
//!     manager.session().connect()?;
//!
//!     if let Some(quote) = quotes.recv().await {
//!         println!("{}", quote.payload);
//!     }
//!
//!     manager.close().await;
//!     Ok(())
//! }
//! ```

mod config;
mod events;
pub mod packet;
mod session;
mod subscription;

pub use config::{SessionConfig, SessionConfigBuilder, endpoints};
pub use events::{ChannelMessage, ConnectionState, Listener, OutboundEvent, SessionEvent};
pub use session::{SessionObserver, StreamingSession};
pub use subscription::{
    CLIENT_REQUEST_ID, SUBSCRIBE_EVENT, Subscription, SubscriptionManager, UNSUBSCRIBE_EVENT,
};
