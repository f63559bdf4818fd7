use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use falconx_api_client::auth::{Credentials, Timestamp, TimestampProvider, headers, sign_request};
use falconx_api_client::error::FalconxError;
use falconx_api_client::rest::{
    DerivativesRequest, FalconxRestClient, HistoryRequest, Method, OrderRequest, QuoteRequest,
    WithdrawalRequest,
};
use falconx_api_client::types::{Platform, ProductType, Side, TimeInForce, TradeStatus};

const FIXED_MILLIS: i64 = 1_700_000_000_123;
const FIXED_TIMESTAMP: &str = "1700000000.123";

struct FixedClock;

impl TimestampProvider for FixedClock {
    fn timestamp(&self) -> Timestamp {
        Timestamp::from_millis(FIXED_MILLIS)
    }
}

fn credentials() -> Credentials {
    Credentials::new("test_key", STANDARD.encode("test_secret"), "test_pass").unwrap()
}

fn build_client(server: &MockServer) -> FalconxRestClient {
    FalconxRestClient::builder(credentials())
        .base_url(server.uri())
        .timestamp_provider(Arc::new(FixedClock))
        .build()
}

fn expected_signature(method: &str, path: &str, body: &str) -> String {
    sign_request(&credentials(), FIXED_TIMESTAMP, method, path, body).unwrap()
}

#[tokio::test]
async fn test_get_without_params_is_signed_and_has_no_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/pairs"))
        .and(header(headers::ACCESS_KEY, "test_key"))
        .and(header(headers::ACCESS_PASSPHRASE, "test_pass"))
        .and(header(headers::ACCESS_TIMESTAMP, FIXED_TIMESTAMP))
        .and(header(
            headers::ACCESS_SIGN,
            expected_signature("GET", "/v1/pairs", "").as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"base_token": "BTC", "quote_token": "USD"},
            {"base_token": "ETH", "quote_token": "USD"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let pairs = client.get_trading_pairs().await.unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[1].to_string(), "ETH/USD");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_send_accepts_path_with_or_without_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/rate_limit"))
        .and(header(
            headers::ACCESS_SIGN,
            expected_signature("GET", "/v1/rate_limit", "").as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let a = client.send(Method::GET, "/rate_limit", None).await.unwrap();
    let b = client.send(Method::GET, "/v1/rate_limit", None).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_empty_object_body_is_not_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/derivatives/margins"))
        .and(header(
            headers::ACCESS_SIGN,
            expected_signature("GET", "/v1/derivatives/margins", "").as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response": [{"token": "BTC", "total_margin": 10.3}]
        })))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let value = client
        .send(Method::GET, "/derivatives/margins", Some(&json!({})))
        .await
        .unwrap();
    assert_eq!(value["status"], "success");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_post_body_signed_equals_body_sent() {
    let server = MockServer::start().await;

    let body = r#"{"client_order_id":"abc","quantity":{"token":"BTC","value":"0.1"},"side":"two_way","token_pair":{"base_token":"BTC","quote_token":"USD"}}"#;

    Mock::given(method("POST"))
        .and(path("/v1/quotes"))
        .and(header("content-type", "application/json"))
        .and(header(
            headers::ACCESS_SIGN,
            expected_signature("POST", "/v1/quotes", body).as_str(),
        ))
        .and(body_string(body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "fx_quote_id": "00c884b056f949338788dfb59e495377",
            "buy_price": 12650,
            "sell_price": 12648.5,
            "platform": "api",
            "token_pair": {"base_token": "BTC", "quote_token": "USD"},
            "quantity_requested": {"token": "BTC", "value": "0.10000"},
            "side_requested": "two_way",
            "t_quote": "2019-06-27T11:59:21.875725+00:00",
            "t_expiry": "2019-06-27T11:59:22.875725+00:00",
            "is_filled": false,
            "side_executed": null,
            "price_executed": null,
            "t_execute": null,
            "trader_email": "trader1@company.com",
            "client_order_id": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let request = QuoteRequest::new("BTC", "USD", "0.1".parse().unwrap(), Side::TwoWay)
        .client_order_id("abc");
    let quote = client.get_quote(&request).await.unwrap();

    assert_eq!(quote.fx_quote_id, "00c884b056f949338788dfb59e495377");
    assert_eq!(quote.sell_price, Some(Decimal::new(126485, 1)));
    assert_eq!(quote.platform, Some(Platform::Api));
}

#[tokio::test]
async fn test_get_params_travel_as_signed_body() {
    let server = MockServer::start().await;
    let body = r#"{"platform":"api","t_end":"2019-06-30T00:00:00+00:00","t_start":"2019-06-01T00:00:00+00:00"}"#;

    Mock::given(method("GET"))
        .and(path("/v1/transfers"))
        .and(header(
            headers::ACCESS_SIGN,
            expected_signature("GET", "/v1/transfers", body).as_str(),
        ))
        .and(body_string(body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "type": "deposit",
            "platform": "api",
            "token": "BTC",
            "quantity": 1.0,
            "t_create": "2019-06-20T01:01:01+00:00"
        }])))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let request = HistoryRequest::range("2019-06-01T00:00:00+00:00", "2019-06-30T00:00:00+00:00")
        .platform(Platform::Api);
    let transfers = client.get_transfers(&request).await.unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].token, "BTC");
}

#[tokio::test]
async fn test_place_limit_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/order"))
        .and(wiremock::matchers::body_partial_json(json!({
            "order_type": "limit",
            "time_in_force": "fok",
            "limit_price": "8547.11",
            "slippage_bps": "2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "fx_quote_id": "q1",
            "buy_price": 8545.12,
            "sell_price": null,
            "token_pair": {"base_token": "BTC", "quote_token": "USD"},
            "quantity_requested": {"token": "BTC", "value": "1"},
            "side_requested": "buy",
            "t_quote": "2019-06-27T11:59:21.875725+00:00",
            "t_expiry": "2019-06-27T11:59:22.875725+00:00",
            "is_filled": true,
            "side_executed": "buy",
            "price_executed": 8545.12,
            "t_execute": "2019-06-27T11:59:21.905725+00:00",
            "order_type": "limit",
            "time_in_force": "fok",
            "limit_price": 8547.11,
            "slippage_bps": 2
        })))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let order = OrderRequest::limit(
        "BTC",
        "USD",
        "1".parse().unwrap(),
        Side::Buy,
        "8547.11".parse().unwrap(),
        TimeInForce::Fok,
    )
    .slippage_bps("2".parse().unwrap());

    let filled = client.place_order(&order).await.unwrap();
    assert!(filled.is_filled);
    assert_eq!(filled.side_executed, Some(Side::Buy));
    assert_eq!(filled.time_in_force, Some(TimeInForce::Fok));
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error_with_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/balances"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "failure",
            "message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let err = client.get_balances(None).await.unwrap_err();
    match err {
        FalconxError::Auth(api) => {
            assert_eq!(api.status, 401);
            assert_eq!(api.status_text, "Unauthorized");
            assert_eq!(api.message, "Invalid API key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_client_and_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/quotes/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("quote not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/trade_sizes"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let client = build_client(&server);

    let err = client.get_quote_status("missing").await.unwrap_err();
    assert!(matches!(err, FalconxError::Client(_)));
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.api_error().unwrap().message, "quote not found");

    let err = client.get_trade_sizes().await.unwrap_err();
    assert!(matches!(err, FalconxError::Server(_)));
    assert_eq!(err.api_error().unwrap().message, "boom");
}

#[tokio::test]
async fn test_unexpected_status_is_not_a_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/rate_limit"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let err = client.get_rate_limits().await.unwrap_err();
    assert!(
        matches!(&err, FalconxError::InvalidResponse(msg) if msg.contains("304")),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let client = FalconxRestClient::builder(credentials())
        .base_url("http://127.0.0.1:1")
        .build();

    let err = client.get_rate_limits().await.unwrap_err();
    assert!(matches!(err, FalconxError::Transport(_)), "got {err:?}");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_identical_calls_are_not_deduplicated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/balances/total"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"token": "BTC", "total_balance": 63.24596788904755}
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let (a, b) = tokio::join!(client.get_total_balances(), client.get_total_balances());
    assert_eq!(a.unwrap()[0].token, "BTC");
    assert_eq!(b.unwrap()[0].token, "BTC");
}

#[tokio::test]
async fn test_undecodable_success_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/get_trade_limits/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": 1})))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let err = client.get_trade_limits(Platform::Api).await.unwrap_err();
    assert!(matches!(err, FalconxError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_account_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/get_trade_limits/margin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gross_limits": {"remaining": 5469.694069321, "total": 10000, "used": 4530.305930679},
            "net_limits": {"remaining": 4556.667753705194, "total": 5000, "used": 443.33224629480617}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/rate_limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "num_quotes_limit": {"per_hour": null, "per_minute": 24, "per_second": null}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/get_30_day_trailing_volume"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "end_date": "2020-07-27T17:22:42.202198",
            "start_date": "2020-06-27T17:22:42.202198",
            "usd_volume": 19941.405434647015
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/withdraw"))
        .and(body_string(r#"{"amount":"2.5","platform":"browser","token":"ETH"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Withdrawal request submitted successfully",
            "status": "success"
        })))
        .mount(&server)
        .await;

    let client = build_client(&server);

    let limits = client.get_trade_limits(Platform::Margin).await.unwrap();
    assert_eq!(limits.gross_limits.total, Decimal::from(10000));

    let rate_limits = client.get_rate_limits().await.unwrap();
    assert_eq!(rate_limits.num_quotes_limit.per_minute, Some(24));
    assert!(rate_limits.num_quotes_limit.per_hour.is_none());

    let volume = client.get_30_day_trailing_volume().await.unwrap();
    assert_eq!(volume.start_date, "2020-06-27T17:22:42.202198");

    let withdrawal = WithdrawalRequest {
        token: "ETH".into(),
        amount: "2.5".parse().unwrap(),
        platform: Platform::Browser,
    };
    let response = client.submit_withdrawal_request(&withdrawal).await.unwrap();
    assert_eq!(response.status, "success");
}

#[tokio::test]
async fn test_get_derivatives_with_filters() {
    let server = MockServer::start().await;
    let body = r#"{"market_list":"BTC-USD,ETH-USD","product_type":"call_option","trade_status":"open"}"#;

    Mock::given(method("GET"))
        .and(path("/v1/derivatives"))
        .and(body_string(body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response": [{
                "trade_id": "12a29e52cfe745c4a4ee556f372ebce2",
                "status": "open",
                "market": "ETH - USD",
                "product": "OPTION",
                "quantity": 500,
                "side": "Sell",
                "premium": "100,000.00 USD"
            }]
        })))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let request = DerivativesRequest {
        trade_status: Some(TradeStatus::Open),
        product_type: Some(ProductType::CallOption),
        market_list: Some("BTC-USD,ETH-USD".into()),
    };
    let response = client.get_derivatives(&request).await.unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.response[0].quantity, Some(Decimal::from(500)));
    assert_eq!(response.response[0].extra["premium"], "100,000.00 USD");
}

#[test]
fn test_empty_passphrase_is_config_error() {
    let err = Credentials::new("test_key", STANDARD.encode("test_secret"), "  ").unwrap_err();
    assert!(matches!(err, FalconxError::Config(ref msg) if msg.contains("passphrase")));
}
