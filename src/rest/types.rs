//! Request and response types for the FalconX REST API.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::common::*;

// Requests

/// Parameters for requesting a quote.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteRequest {
    /// Pair to quote
    pub token_pair: TokenPair,
    /// Requested size, denominated in the base token
    pub quantity: TokenQuantity,
    /// Side to quote
    pub side: Side,
    /// Client order ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl QuoteRequest {
    /// Create a quote request for `quantity` units of the base token.
    pub fn new(
        base: impl Into<String>,
        quote: impl Into<String>,
        quantity: Decimal,
        side: Side,
    ) -> Self {
        let base = base.into();
        Self {
            token_pair: TokenPair::new(base.clone(), quote),
            quantity: TokenQuantity::new(base, quantity),
            side,
            client_order_id: None,
        }
    }

    /// Attach a client order ID.
    pub fn client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }
}

/// Parameters for placing a market or limit order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Pair to trade
    pub token_pair: TokenPair,
    /// Order size, denominated in the base token
    pub quantity: TokenQuantity,
    /// Buy or sell
    pub side: Side,
    /// Market or limit
    pub order_type: OrderType,
    /// Time in force (limit orders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
    /// Limit price (limit orders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
    /// Allowed slippage in basis points (FOK limit orders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage_bps: Option<Decimal>,
    /// Client order ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Create a market order request.
    pub fn market(
        base: impl Into<String>,
        quote: impl Into<String>,
        quantity: Decimal,
        side: Side,
    ) -> Self {
        let base = base.into();
        Self {
            token_pair: TokenPair::new(base.clone(), quote),
            quantity: TokenQuantity::new(base, quantity),
            side,
            order_type: OrderType::Market,
            time_in_force: None,
            limit_price: None,
            slippage_bps: None,
            client_order_id: None,
        }
    }

    /// Create a limit order request.
    pub fn limit(
        base: impl Into<String>,
        quote: impl Into<String>,
        quantity: Decimal,
        side: Side,
        limit_price: Decimal,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            order_type: OrderType::Limit,
            time_in_force: Some(time_in_force),
            limit_price: Some(limit_price),
            ..Self::market(base, quote, quantity, side)
        }
    }

    /// Set the slippage tolerance (FOK limit orders).
    pub fn slippage_bps(mut self, bps: Decimal) -> Self {
        self.slippage_bps = Some(bps);
        self
    }

    /// Attach a client order ID.
    pub fn client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }
}

/// Parameters for executing a previously requested quote.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteQuoteRequest {
    /// Quote ID returned by `get_quote`
    pub fx_quote_id: String,
    /// Side to execute (buy or sell)
    pub side: Side,
}

/// Optional time range and platform filter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryRequest {
    /// Range start, ISO 8601
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_start: Option<String>,
    /// Range end, ISO 8601
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_end: Option<String>,
    /// Platform filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl HistoryRequest {
    /// Create a request covering `t_start..t_end`.
    pub fn range(t_start: impl Into<String>, t_end: impl Into<String>) -> Self {
        Self {
            t_start: Some(t_start.into()),
            t_end: Some(t_end.into()),
            platform: None,
        }
    }

    /// Restrict to one platform.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }
}

/// Parameters for a withdrawal request.
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalRequest {
    /// Token to withdraw
    pub token: String,
    /// Amount to withdraw
    pub amount: Decimal,
    /// Platform to withdraw from
    pub platform: Platform,
}

/// Filters for the derivatives endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivativesRequest {
    /// Trade status filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_status: Option<TradeStatus>,
    /// Product type filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<ProductType>,
    /// Comma separated markets, e.g. "BTC-USD,ETH-USD"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_list: Option<String>,
}

// Responses

/// A quote, as returned by the quote, order, execute and status endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    /// Result status ("success" or "failure")
    pub status: String,
    /// Quote ID
    pub fx_quote_id: String,
    /// Price to buy at
    pub buy_price: Option<Decimal>,
    /// Price to sell at
    pub sell_price: Option<Decimal>,
    /// Platform the quote was made on
    pub platform: Option<Platform>,
    /// Quoted pair
    pub token_pair: TokenPair,
    /// Requested quantity
    pub quantity_requested: TokenQuantity,
    /// Requested side
    pub side_requested: Side,
    /// Quote time
    pub t_quote: String,
    /// Quote expiry
    pub t_expiry: String,
    /// Whether the quote was executed
    #[serde(default)]
    pub is_filled: bool,
    /// Side that was executed
    pub side_executed: Option<Side>,
    /// Price that was executed
    pub price_executed: Option<Decimal>,
    /// Execution time
    pub t_execute: Option<String>,
    /// Trader that requested the quote
    pub trader_email: Option<String>,
    /// Client order ID echoed back
    pub client_order_id: Option<String>,
    /// Order type (orders only)
    pub order_type: Option<OrderType>,
    /// Time in force (orders only)
    pub time_in_force: Option<TimeInForce>,
    /// Limit price (orders only)
    pub limit_price: Option<Decimal>,
    /// Slippage tolerance (orders only)
    pub slippage_bps: Option<Decimal>,
    /// Fee in basis points
    pub fee_bps: Option<Decimal>,
    /// Fee in USD
    pub fee_usd: Option<Decimal>,
    /// Business error details, if any
    pub error: Option<serde_json::Value>,
}

/// A balance held on one platform.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBalance {
    /// Token symbol
    pub token: String,
    /// Balance
    pub balance: Decimal,
    /// Platform holding the balance
    pub platform: Platform,
}

/// A deposit or withdrawal.
#[derive(Debug, Clone, Deserialize)]
pub struct Transfer {
    /// Direction
    #[serde(rename = "type")]
    pub transfer_type: TransferType,
    /// Platform name (free-form on the server side)
    pub platform: String,
    /// Token symbol
    pub token: String,
    /// Amount
    pub quantity: Decimal,
    /// Creation time
    pub t_create: String,
}

/// Trading volume over a range.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeVolume {
    /// Range start
    pub start_date: String,
    /// Range end
    pub end_date: String,
    /// Volume in USD
    pub usd_volume: Decimal,
}

/// One limit bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct Limit {
    /// Remaining allowance
    pub remaining: Decimal,
    /// Total allowance
    pub total: Decimal,
    /// Used allowance
    pub used: Decimal,
}

/// Gross and net trade limits for a platform.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeLimits {
    /// Gross limits
    pub gross_limits: Limit,
    /// Net limits
    pub net_limits: Limit,
}

/// Response for a withdrawal request.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalResponse {
    /// Result status
    pub status: String,
    /// Server message
    pub message: Option<String>,
}

/// Quote rate limit windows; `None` means no limit for that window.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitWindows {
    /// Quotes per hour
    pub per_hour: Option<u32>,
    /// Quotes per minute
    pub per_minute: Option<u32>,
    /// Quotes per second
    pub per_second: Option<u32>,
}

/// Response for the rate limit endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimits {
    /// Quote limits
    pub num_quotes_limit: RateLimitWindows,
}

/// Min/max trade size.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeSizeLimits {
    /// Maximum size
    pub max: Decimal,
    /// Minimum size
    pub min: Decimal,
}

/// Trade size limits for one pair on one platform.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeSizes {
    /// Platform
    pub platform: Platform,
    /// Pair
    pub token_pair: TokenPair,
    /// Limits in the quote token
    pub trade_size_limits_in_quote_token: TradeSizeLimits,
}

/// Envelope used by the derivatives endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DerivativesResponse<T> {
    /// Result status
    pub status: String,
    /// Payload
    pub response: T,
}

/// A derivative trade with its current mark-to-market data.
///
/// The server renders most values as display strings; fields not modelled here
/// are kept in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct DerivativeTrade {
    /// Trade ID
    pub trade_id: String,
    /// Trade status
    pub status: TradeStatus,
    /// Market, e.g. "ETH - USD"
    pub market: String,
    /// Product name
    pub product: Option<String>,
    /// Trade quantity
    pub quantity: Option<Decimal>,
    /// Side as displayed
    pub side: Option<String>,
    /// Other fields (dates, premium, greeks, ...)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Margin held against derivative positions.
#[derive(Debug, Clone, Deserialize)]
pub struct DerivativeMargin {
    /// Token symbol
    pub token: String,
    /// Total margin
    pub total_margin: Decimal,
}

/// USD balance of one token across platforms.
#[derive(Debug, Clone, Deserialize)]
pub struct TotalBalance {
    /// Token symbol
    pub token: String,
    /// Total balance
    pub total_balance: Decimal,
}
