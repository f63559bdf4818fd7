//! REST API endpoint constants.
//!
//! Paths are logical paths without the API version prefix; see
//! [`signing_path`](crate::rest::signing_path).

/// Base URL for the FalconX production API.
pub const BASE_URL: &str = "https://api.falconx.io";

/// Base URL for the FalconX stage API.
pub const STAGE_URL: &str = "https://api-stage.falconx.io";

/// Version prefix carried by every request path.
pub const API_VERSION_PREFIX: &str = "/v1";

/// Trading endpoints.
pub mod trading {
    /// List tradable pairs.
    pub const PAIRS: &str = "/pairs";

    /// Request a quote, or list executed quotes (GET).
    pub const QUOTES: &str = "/quotes";

    /// Execute a quote.
    pub const EXECUTE_QUOTE: &str = "/quotes/execute";

    /// Place a market or limit order.
    pub const ORDER: &str = "/order";

    /// Status of one quote.
    pub fn quote_status(fx_quote_id: &str) -> String {
        format!("{QUOTES}/{fx_quote_id}")
    }
}

/// Account endpoints.
pub mod account {
    /// Balances per platform.
    pub const BALANCES: &str = "/balances";

    /// Total balances across platforms.
    pub const TOTAL_BALANCES: &str = "/balances/total";

    /// Deposits and withdrawals.
    pub const TRANSFERS: &str = "/transfers";

    /// Trading volume over a range.
    pub const TRADE_VOLUME: &str = "/get_trade_volume";

    /// Trailing 30 day volume.
    pub const TRAILING_VOLUME: &str = "/get_30_day_trailing_volume";

    /// Withdrawal requests.
    pub const WITHDRAW: &str = "/withdraw";

    /// Quote rate limits.
    pub const RATE_LIMIT: &str = "/rate_limit";

    /// Trade size limits.
    pub const TRADE_SIZES: &str = "/trade_sizes";

    /// Trade limits for a platform.
    pub fn trade_limits(platform: &str) -> String {
        format!("/get_trade_limits/{platform}")
    }
}

/// Derivatives endpoints.
pub mod derivatives {
    /// Derivative trades.
    pub const DERIVATIVES: &str = "/derivatives";

    /// Margin held against derivatives.
    pub const MARGINS: &str = "/derivatives/margins";
}
