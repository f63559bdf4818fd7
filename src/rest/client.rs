//! FalconX REST API client implementation.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::{AuthHeaders, Credentials, SystemClock, TimestampProvider};
use crate::error::FalconxError;
use crate::rest::endpoints::{BASE_URL, STAGE_URL, account, derivatives, trading};
use crate::rest::signing_path;
use crate::rest::types::*;
use crate::types::{Platform, TokenPair};

/// The FalconX REST API client.
///
/// Every call is signed at dispatch with a fresh timestamp. Calls are never
/// cached, deduplicated or retried; failures are returned to the caller.
///
/// # Example
///
/// ```rust,no_run
/// use falconx_api_client::auth::Credentials;
/// use falconx_api_client::rest::FalconxRestClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = FalconxRestClient::new(Credentials::from_env()?);
///
///     for pair in client.get_trading_pairs().await? {
///         println!("{pair}");
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct FalconxRestClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    credentials: Credentials,
    timestamp_provider: Arc<dyn TimestampProvider>,
}

impl FalconxRestClient {
    /// Create a client for the production API.
    pub fn new(credentials: Credentials) -> Self {
        Self::builder(credentials).build()
    }

    /// Create a new client builder.
    pub fn builder(credentials: Credentials) -> FalconxRestClientBuilder {
        FalconxRestClientBuilder::new(credentials)
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a signed request and return the decoded response body.
    ///
    /// `path` may be given with or without the `/v1` prefix. A `body` that is
    /// absent, `null` or an empty object is neither signed nor sent; any other
    /// body is serialized once and that exact text is signed and transmitted,
    /// GET requests included.
    ///
    /// An empty 2xx body decodes to [`Value::Null`].
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, FalconxError> {
        let text = self.dispatch(method, path, body).await?;
        decode_body(&text)
    }

    /// Send a signed request, serializing `params` as the body and decoding
    /// the response into `T`.
    pub async fn send_typed<T, P>(
        &self,
        method: Method,
        path: &str,
        params: Option<&P>,
    ) -> Result<T, FalconxError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let body = params.map(serde_json::to_value).transpose()?;
        let text = self.dispatch(method, path, body.as_ref()).await?;
        decode_body(&text)
    }

    /// Sign and send one request, returning the raw 2xx body.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<String, FalconxError> {
        let path = signing_path(path);
        let body = canonical_body(body)?;

        let auth = AuthHeaders::new(
            &self.credentials,
            self.timestamp_provider.timestamp(),
            method.as_str(),
            &path,
            body.as_deref().unwrap_or(""),
        )?;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, has_body = body.is_some(), "Sending FalconX request");

        let mut request = self.http_client.request(method, &url);
        for (name, value) in auth.pairs() {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FalconxError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FalconxError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "FalconX request failed");
            return Err(FalconxError::from_status(status, &text));
        }

        Ok(text)
    }

    // Trading endpoints.

    /// Get the list of tradable token pairs.
    pub async fn get_trading_pairs(&self) -> Result<Vec<TokenPair>, FalconxError> {
        self.send_typed::<_, Value>(Method::GET, trading::PAIRS, None)
            .await
    }

    /// Request a quote.
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, FalconxError> {
        self.send_typed(Method::POST, trading::QUOTES, Some(request))
            .await
    }

    /// Place a market or limit order.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use falconx_api_client::rest::{FalconxRestClient, OrderRequest};
    /// # use falconx_api_client::types::Side;
    /// # async fn example(client: &FalconxRestClient) -> Result<(), Box<dyn std::error::Error>> {
    /// let order = OrderRequest::market("BTC", "USD", "0.5".parse()?, Side::Buy)
    ///     .client_order_id("my-order-1");
    /// let filled = client.place_order(&order).await?;
    /// println!("{:?} @ {:?}", filled.side_executed, filled.price_executed);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn place_order(&self, request: &OrderRequest) -> Result<Quote, FalconxError> {
        self.send_typed(Method::POST, trading::ORDER, Some(request))
            .await
    }

    /// Execute a previously requested quote.
    pub async fn execute_quote(
        &self,
        request: &ExecuteQuoteRequest,
    ) -> Result<Quote, FalconxError> {
        self.send_typed(Method::POST, trading::EXECUTE_QUOTE, Some(request))
            .await
    }

    /// Get the status of a quote.
    pub async fn get_quote_status(&self, fx_quote_id: &str) -> Result<Quote, FalconxError> {
        self.send_typed::<_, Value>(Method::GET, &trading::quote_status(fx_quote_id), None)
            .await
    }

    /// Get executed quotes in a time range.
    pub async fn get_executed_quotes(
        &self,
        request: &HistoryRequest,
    ) -> Result<Vec<Quote>, FalconxError> {
        self.send_typed(Method::GET, trading::QUOTES, Some(request))
            .await
    }

    // Account endpoints.

    /// Get balances, optionally for a single platform.
    pub async fn get_balances(
        &self,
        platform: Option<Platform>,
    ) -> Result<Vec<TokenBalance>, FalconxError> {
        let params = platform.map(|platform| serde_json::json!({ "platform": platform }));
        self.send_typed(Method::GET, account::BALANCES, params.as_ref())
            .await
    }

    /// Get total balances per token across platforms.
    pub async fn get_total_balances(&self) -> Result<Vec<TotalBalance>, FalconxError> {
        self.send_typed::<_, Value>(Method::GET, account::TOTAL_BALANCES, None)
            .await
    }

    /// Get deposits and withdrawals.
    pub async fn get_transfers(
        &self,
        request: &HistoryRequest,
    ) -> Result<Vec<Transfer>, FalconxError> {
        self.send_typed(Method::GET, account::TRANSFERS, Some(request))
            .await
    }

    /// Get trading volume between `t_start` and `t_end` (ISO 8601).
    pub async fn get_trade_volume(
        &self,
        t_start: &str,
        t_end: &str,
    ) -> Result<TradeVolume, FalconxError> {
        let request = HistoryRequest::range(t_start, t_end);
        self.send_typed(Method::GET, account::TRADE_VOLUME, Some(&request))
            .await
    }

    /// Get the USD trading volume of the last 30 days.
    pub async fn get_30_day_trailing_volume(&self) -> Result<TradeVolume, FalconxError> {
        self.send_typed::<_, Value>(Method::GET, account::TRAILING_VOLUME, None)
            .await
    }

    /// Get the current trade limits of a platform.
    pub async fn get_trade_limits(&self, platform: Platform) -> Result<TradeLimits, FalconxError> {
        let path = account::trade_limits(&platform.to_string());
        self.send_typed::<_, Value>(Method::GET, &path, None).await
    }

    /// Submit a withdrawal request.
    pub async fn submit_withdrawal_request(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<WithdrawalResponse, FalconxError> {
        self.send_typed(Method::POST, account::WITHDRAW, Some(request))
            .await
    }

    /// Get quote rate limits.
    pub async fn get_rate_limits(&self) -> Result<RateLimits, FalconxError> {
        self.send_typed::<_, Value>(Method::GET, account::RATE_LIMIT, None)
            .await
    }

    /// Get trade size limits per pair and platform.
    pub async fn get_trade_sizes(&self) -> Result<Vec<TradeSizes>, FalconxError> {
        self.send_typed::<_, Value>(Method::GET, account::TRADE_SIZES, None)
            .await
    }

    // Derivatives endpoints.

    /// Get derivative trades with current mark-to-market data.
    pub async fn get_derivatives(
        &self,
        request: &DerivativesRequest,
    ) -> Result<DerivativesResponse<Vec<DerivativeTrade>>, FalconxError> {
        self.send_typed(Method::GET, derivatives::DERIVATIVES, Some(request))
            .await
    }

    /// Get total derivative margin per token.
    pub async fn get_derivative_margins(
        &self,
    ) -> Result<DerivativesResponse<Vec<DerivativeMargin>>, FalconxError> {
        self.send_typed::<_, Value>(Method::GET, derivatives::MARGINS, None)
            .await
    }
}

impl std::fmt::Debug for FalconxRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FalconxRestClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.credentials.api_key())
            .finish()
    }
}

/// Serialize a request body the way it is both signed and sent.
///
/// Returns `None` for an absent body, `null` or an empty object. Object keys
/// come out sorted at every level.
pub(crate) fn canonical_body(body: Option<&Value>) -> Result<Option<String>, FalconxError> {
    match body {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => Ok(Some(serde_json::to_string(&sorted(value))?)),
    }
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sorted(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, FalconxError> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| FalconxError::InvalidResponse(e.to_string()))
}

/// Builder for [`FalconxRestClient`].
pub struct FalconxRestClientBuilder {
    base_url: String,
    credentials: Credentials,
    timestamp_provider: Option<Arc<dyn TimestampProvider>>,
    user_agent: Option<String>,
}

impl FalconxRestClientBuilder {
    /// Create a new builder for the production API.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            credentials,
            timestamp_provider: None,
            user_agent: None,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use the stage environment.
    pub fn use_stage(mut self) -> Self {
        self.base_url = STAGE_URL.to_string();
        self
    }

    /// Set a custom timestamp provider.
    pub fn timestamp_provider(mut self, provider: Arc<dyn TimestampProvider>) -> Self {
        self.timestamp_provider = Some(provider);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> FalconxRestClient {
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("falconx-api-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("falconx-api-client"));
        headers.insert(USER_AGENT, header_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        let timestamp_provider = self
            .timestamp_provider
            .unwrap_or_else(|| Arc::new(SystemClock));

        FalconxRestClient {
            http_client: client,
            base_url: self.base_url,
            credentials: self.credentials,
            timestamp_provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_body_skips_empty() {
        assert_eq!(canonical_body(None).unwrap(), None);
        assert_eq!(canonical_body(Some(&Value::Null)).unwrap(), None);
        assert_eq!(canonical_body(Some(&json!({}))).unwrap(), None);
    }

    #[test]
    fn test_canonical_body_sorts_keys() {
        let body = json!({"side": "buy", "quantity": {"value": "1", "token": "BTC"}});
        assert_eq!(
            canonical_body(Some(&body)).unwrap().as_deref(),
            Some(r#"{"quantity":{"token":"BTC","value":"1"},"side":"buy"}"#)
        );
    }

    #[test]
    fn test_decode_empty_body_is_null() {
        let value: Value = decode_body("").unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_decode_mismatch_is_invalid_response() {
        let result: Result<Vec<TokenPair>, _> = decode_body(r#"{"unexpected":true}"#);
        assert!(matches!(result, Err(FalconxError::InvalidResponse(_))));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let credentials = Credentials::new("key", "c2VjcmV0", "pass").unwrap();
        let client = FalconxRestClient::builder(credentials)
            .base_url("http://localhost:8080/")
            .build();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credentials = Credentials::new("key", "c2VjcmV0", "hunter2").unwrap();
        let client = FalconxRestClient::new(credentials);
        let debug = format!("{client:?}");
        assert!(debug.contains("api.falconx.io"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("c2VjcmV0"));
    }
}
