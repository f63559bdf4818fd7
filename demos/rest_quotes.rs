//! Example: Requesting a quote and reading account data over REST.
//!
//! Requires FALCONX_API_KEY, FALCONX_SECRET_KEY and FALCONX_PASSPHRASE.
//! Uses the stage environment so no real trade is made.
//!
//! Run with: cargo run --example rest_quotes

use falconx_api_client::Side;
use falconx_api_client::auth::Credentials;
use falconx_api_client::rest::{FalconxRestClient, Method, QuoteRequest};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let credentials = Credentials::from_env()?;
    let client = FalconxRestClient::builder(credentials).use_stage().build();

    let pairs = client.get_trading_pairs().await?;
    println!("{} tradable pairs", pairs.len());
    for pair in pairs.iter().take(5) {
        println!("  {}", pair);
    }

    let request = QuoteRequest::new("BTC", "USD", Decimal::new(1, 1), Side::TwoWay)
        .client_order_id("example-quote");
    let quote = client.get_quote(&request).await?;
    println!(
        "Quote {}: buy {:?} / sell {:?}, expires {}",
        quote.fx_quote_id, quote.buy_price, quote.sell_price, quote.t_expiry
    );

    for balance in client.get_balances(None).await? {
        println!("[{}] {}: {}", balance.platform, balance.token, balance.balance);
    }

    // Endpoints without a typed wrapper can be called through `send`.
    let limits = client.send(Method::GET, "/rate_limit", None).await?;
    println!("Rate limits: {}", limits);

    Ok(())
}
