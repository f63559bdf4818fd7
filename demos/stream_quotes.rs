//! Example: Streaming quotes with automatic resubscription.
//!
//! Subscriptions are replayed by the manager every time the session
//! reconnects, so the loop below keeps receiving prices across drops.
//!
//! Run with: cargo run --example stream_quotes

use falconx_api_client::TokenPair;
use falconx_api_client::auth::Credentials;
use falconx_api_client::ws::{
    SessionConfig, SessionEvent, StreamingSession, Subscription, SubscriptionManager,
};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = SessionConfig::builder().use_stage().build();
    let session = StreamingSession::new(Credentials::from_env()?, config)?;
    let mut lifecycle = session.listen();
    let manager = SubscriptionManager::new(session)?;

    let pair = TokenPair::new("BTC", "USD");
    let quantities = [Decimal::ONE, Decimal::new(5, 0)];
    let mut prices = manager.subscribe(Subscription::quotes("btc-usd", &pair, &quantities))?;
    let mut unmatched = manager.unmatched();

    manager.session().connect()?;
    println!("Connecting... press Ctrl+C to exit.\n");

    let mut received = 0;
    loop {
        tokio::select! {
            Some(event) = lifecycle.recv() => match event {
                SessionEvent::Message(_) => {}
                SessionEvent::Disconnected { reason } => println!("[disconnect] {}", reason),
                other => println!("[{}]", other.name()),
            },
            Some(price) = prices.recv() => {
                println!("[{}] {}", price.event, price.payload);
                received += 1;
                if received >= 20 {
                    break;
                }
            }
            Some(message) = unmatched.recv() => {
                println!("[unmatched {}] {}", message.event, message.payload);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    manager.unsubscribe("btc-usd")?;
    manager.close().await;
    println!("\nSession closed after {} price events", received);

    Ok(())
}
