//! Example: Working with FalconxError and ApiError.
//!
//! Run with: cargo run --example error_handling

use falconx_api_client::auth::Credentials;
use falconx_api_client::error::{ApiError, FalconxError};
use falconx_api_client::rest::FalconxRestClient;
use reqwest::StatusCode;

#[tokio::main]
async fn main() {
    // Credential problems are reported before any request is made.
    match Credentials::new("key", "not base64!!", "") {
        Ok(_) => println!("Unexpectedly valid credentials"),
        Err(FalconxError::Config(msg)) => println!("Config error: {}", msg),
        Err(other) => println!("Unexpected error: {}", other),
    }

    // Status codes map onto error kinds.
    let body = r#"{"status":"failure","message":"Invalid signature"}"#;
    for status in [
        StatusCode::UNAUTHORIZED,
        StatusCode::NOT_FOUND,
        StatusCode::BAD_GATEWAY,
    ] {
        let err = FalconxError::from_status(status, body);
        let kind = match &err {
            FalconxError::Auth(_) => "auth",
            FalconxError::Client(_) => "client",
            FalconxError::Server(_) => "server",
            _ => "other",
        };
        println!("{} -> {} ({})", status, kind, err);
    }

    let api_error = ApiError::new(429, "Too Many Requests", "rate limit exceeded");
    println!("API error: {}", api_error);

    // An unreachable host never produces a response.
    let credentials = match Credentials::new("key", "c2VjcmV0", "passphrase") {
        Ok(credentials) => credentials,
        Err(e) => {
            println!("Failed to build credentials: {}", e);
            return;
        }
    };
    let client = FalconxRestClient::builder(credentials)
        .base_url("http://127.0.0.1:1")
        .build();
    if let Err(err) = client.get_trading_pairs().await {
        println!("Status: {:?}, error: {}", err.status(), err);
    }
}
