//! Common domain types for the FalconX API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A base/quote token pair, e.g. BTC/USD.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    /// Base token (e.g. "BTC")
    pub base_token: String,
    /// Quote token (e.g. "USD")
    pub quote_token: String,
}

impl TokenPair {
    /// Create a token pair.
    pub fn new(base_token: impl Into<String>, quote_token: impl Into<String>) -> Self {
        Self {
            base_token: base_token.into(),
            quote_token: quote_token.into(),
        }
    }
}

impl std::fmt::Display for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base_token, self.quote_token)
    }
}

/// An amount of a specific token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenQuantity {
    /// Token symbol
    pub token: String,
    /// Amount, sent and received as a decimal string
    pub value: Decimal,
}

impl TokenQuantity {
    /// Create a token quantity.
    pub fn new(token: impl Into<String>, value: Decimal) -> Self {
        Self {
            token: token.into(),
            value,
        }
    }
}

/// Side of a quote request or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Buy the base token
    Buy,
    /// Sell the base token
    Sell,
    /// Quote both sides (quotes only)
    TwoWay,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
            Side::TwoWay => write!(f, "two_way"),
        }
    }
}

/// Trading platform a record or limit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Web trading interface
    Browser,
    /// API trading
    Api,
    /// Margin trading
    Margin,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Browser => write!(f, "browser"),
            Platform::Api => write!(f, "api"),
            Platform::Margin => write!(f, "margin"),
        }
    }
}

/// Order type for [`place_order`](crate::rest::FalconxRestClient::place_order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Execute immediately at the quoted price
    Market,
    /// Execute at the limit price or better
    Limit,
}

/// Time in force for limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Fill or kill
    Fok,
    /// Good till cancelled
    Gtc,
    /// Immediate or cancel
    Ioc,
}

/// Lifecycle status of a derivative trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    /// Trade is live
    Open,
    /// Trade was closed out
    Closed,
    /// Trade has settled
    Settled,
    /// Counterparty defaulted
    Defaulted,
}

/// Derivative product type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Non-deliverable forward
    Ndf,
    /// Call option
    CallOption,
    /// Put option
    PutOption,
    /// Interest rate swap
    Irs,
    /// Any option
    #[serde(rename = "option")]
    AnyOption,
}

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    /// Funds received
    Deposit,
    /// Funds sent out
    Withdrawal,
}
