//! Subscription bookkeeping on top of a [`StreamingSession`].
//!
//! Subscriptions are kept in insertion order and replayed, with their original
//! parameters, every time the session (re)connects. Incoming business events
//! are routed to the subscription whose id matches the payload's
//! `client_request_id`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::error::FalconxError;
use crate::types::TokenPair;
use crate::ws::events::{ChannelMessage, Listener, OutboundEvent};
use crate::ws::session::{SessionObserver, StreamingSession};

/// Event emitted to start a subscription.
pub const SUBSCRIBE_EVENT: &str = "subscribe";
/// Event emitted to end a subscription.
pub const UNSUBSCRIBE_EVENT: &str = "unsubscribe";
/// Payload key correlating events with subscriptions.
pub const CLIENT_REQUEST_ID: &str = "client_request_id";

/// A price stream subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    /// Caller-chosen id, sent as `client_request_id`.
    pub id: String,
    /// Channel parameters, sent as-is.
    pub channel_params: Map<String, Value>,
}

impl Subscription {
    /// Create a subscription with arbitrary channel parameters.
    pub fn new(id: impl Into<String>, channel_params: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            channel_params,
        }
    }

    /// Subscribe to quotes for `token_pair` at each of `quantities`.
    pub fn quotes(id: impl Into<String>, token_pair: &TokenPair, quantities: &[Decimal]) -> Self {
        let quantities = quantities
            .iter()
            .map(|quantity| {
                let text = quantity.normalize().to_string();
                text.parse::<serde_json::Number>()
                    .map(Value::Number)
                    .unwrap_or(Value::String(text))
            })
            .collect();

        let mut params = Map::new();
        params.insert(
            "token_pair".to_string(),
            serde_json::json!({
                "base_token": token_pair.base_token,
                "quote_token": token_pair.quote_token,
            }),
        );
        params.insert("quantity".to_string(), Value::Array(quantities));
        Self::new(id, params)
    }

    fn subscribe_event(&self) -> OutboundEvent {
        let mut payload = self.channel_params.clone();
        payload.insert(CLIENT_REQUEST_ID.to_string(), Value::String(self.id.clone()));
        OutboundEvent::new(SUBSCRIBE_EVENT, Value::Object(payload))
    }

    fn unsubscribe_event(id: &str) -> OutboundEvent {
        OutboundEvent::new(UNSUBSCRIBE_EVENT, serde_json::json!({ CLIENT_REQUEST_ID: id }))
    }
}

struct Entry {
    subscription: Subscription,
    listener: mpsc::UnboundedSender<ChannelMessage>,
}

#[derive(Default)]
struct Registry {
    connected: bool,
    entries: Vec<Entry>,
    unmatched: Vec<mpsc::UnboundedSender<ChannelMessage>>,
}

impl Registry {
    fn position(&self, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.subscription.id == id)
    }

    fn route(&mut self, message: &ChannelMessage) {
        let target = message.client_request_id().and_then(|id| self.position(id));

        match target {
            Some(index) => {
                if self.entries[index].listener.send(message.clone()).is_err() {
                    tracing::debug!(
                        id = %self.entries[index].subscription.id,
                        "Subscription listener dropped"
                    );
                }
            }
            None => self.unmatched.retain(|tx| tx.send(message.clone()).is_ok()),
        }
    }
}

#[derive(Default)]
struct SharedRegistry(Mutex<Registry>);

impl SharedRegistry {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionObserver for SharedRegistry {
    fn on_connected(&self) -> Vec<OutboundEvent> {
        let mut registry = self.lock();
        registry.connected = true;
        let replay: Vec<OutboundEvent> = registry
            .entries
            .iter()
            .map(|entry| entry.subscription.subscribe_event())
            .collect();
        if !replay.is_empty() {
            tracing::info!(count = replay.len(), "Replaying subscriptions");
        }
        replay
    }

    fn on_disconnected(&self) {
        self.lock().connected = false;
    }

    fn on_event(&self, message: &ChannelMessage) {
        self.lock().route(message);
    }
}

/// Keeps subscriptions alive across reconnects.
///
/// # Example
///
/// ```rust,no_run
/// use falconx_api_client::auth::Credentials;
/// use falconx_api_client::types::TokenPair;
/// use falconx_api_client::ws::{SessionConfig, StreamingSession, Subscription, SubscriptionManager};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = StreamingSession::new(Credentials::from_env()?, SessionConfig::default())?;
///     let manager = SubscriptionManager::new(session)?;
///
///     let pair = TokenPair::new("BTC", "USD");
///     let mut prices = manager.subscribe(Subscription::quotes("btc-1", &pair, &[1.into()]))?;
///     manager.session().connect()?;
///
///     while let Some(price) = prices.recv().await {
///         println!("{}: {}", price.event, price.payload);
///     }
///
///     Ok(())
/// }
/// ```
pub struct SubscriptionManager {
    session: StreamingSession,
    registry: Arc<SharedRegistry>,
}

impl SubscriptionManager {
    /// Take over `session` and start tracking subscriptions on it.
    pub fn new(session: StreamingSession) -> Result<Self, FalconxError> {
        let registry = Arc::new(SharedRegistry::default());
        session.observe(registry.clone())?;
        Ok(Self { session, registry })
    }

    /// Record a subscription and emit it when connected.
    ///
    /// Re-subscribing an existing id replaces its parameters in place and
    /// returns a new listener; the previous listener stops receiving events.
    /// When connected, the old subscription is ended on the server before the
    /// new one is sent.
    pub fn subscribe(
        &self,
        subscription: Subscription,
    ) -> Result<Listener<ChannelMessage>, FalconxError> {
        if subscription.id.is_empty() {
            return Err(FalconxError::Config("subscription id must not be empty".into()));
        }

        let (tx, listener) = Listener::channel();
        let mut registry = self.registry.lock();
        let existing = registry.position(&subscription.id);

        if registry.connected {
            if existing.is_some() {
                self.session.send_event(Subscription::unsubscribe_event(&subscription.id))?;
            }
            self.session.send_event(subscription.subscribe_event())?;
        }

        let entry = Entry {
            subscription,
            listener: tx,
        };
        match existing {
            Some(index) => registry.entries[index] = entry,
            None => registry.entries.push(entry),
        }

        Ok(listener)
    }

    /// Forget a subscription and, when connected, tell the server.
    ///
    /// Unknown ids are ignored.
    pub fn unsubscribe(&self, id: &str) -> Result<(), FalconxError> {
        let mut registry = self.registry.lock();
        let Some(index) = registry.position(id) else {
            return Ok(());
        };
        registry.entries.remove(index);

        if registry.connected {
            self.session.send_event(Subscription::unsubscribe_event(id))?;
        }
        Ok(())
    }

    /// Business events not correlated with any live subscription.
    pub fn unmatched(&self) -> Listener<ChannelMessage> {
        let (tx, listener) = Listener::channel();
        self.registry.lock().unmatched.push(tx);
        listener
    }

    /// Snapshot of the live subscriptions, in insertion order.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.registry
            .lock()
            .entries
            .iter()
            .map(|entry| entry.subscription.clone())
            .collect()
    }

    /// The underlying session.
    pub fn session(&self) -> &StreamingSession {
        &self.session
    }

    /// Close the session and end every subscription stream.
    pub async fn close(self) {
        {
            let mut registry = self.registry.lock();
            registry.entries.clear();
            registry.unmatched.clear();
        }
        self.session.close().await;
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("session", &self.session)
            .field("subscriptions", &self.registry.lock().entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn message(payload: Value) -> ChannelMessage {
        ChannelMessage {
            event: "stream".into(),
            payload,
        }
    }

    fn registry_with(ids: &[&str]) -> (SharedRegistry, Vec<Listener<ChannelMessage>>) {
        let registry = SharedRegistry::default();
        let mut listeners = Vec::new();
        for id in ids {
            let (tx, listener) = Listener::channel();
            registry.lock().entries.push(Entry {
                subscription: Subscription::new(*id, params(json!({"quantity": [1]}))),
                listener: tx,
            });
            listeners.push(listener);
        }
        (registry, listeners)
    }

    #[test]
    fn test_subscribe_payload_is_flat() {
        let subscription = Subscription::new("myid", params(json!({"quantity": [1]})));
        let event = subscription.subscribe_event();
        assert_eq!(event.event, "subscribe");
        assert_eq!(
            event.payload,
            json!({"quantity": [1], "client_request_id": "myid"})
        );
    }

    #[test]
    fn test_quotes_subscription_params() {
        let pair = TokenPair::new("BTC", "USD");
        let subscription =
            Subscription::quotes("q1", &pair, &["1".parse().unwrap(), "0.50".parse().unwrap()]);
        assert_eq!(
            Value::Object(subscription.channel_params),
            json!({
                "token_pair": {"base_token": "BTC", "quote_token": "USD"},
                "quantity": [1, 0.5]
            })
        );
    }

    #[test]
    fn test_unsubscribe_payload() {
        let event = Subscription::unsubscribe_event("myid");
        assert_eq!(event.event, "unsubscribe");
        assert_eq!(event.payload, json!({"client_request_id": "myid"}));
    }

    #[test]
    fn test_on_connected_replays_in_insertion_order() {
        let (registry, _listeners) = registry_with(&["b", "a", "c"]);
        let replay = registry.on_connected();
        let ids: Vec<_> = replay
            .iter()
            .map(|event| event.payload[CLIENT_REQUEST_ID].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert!(registry.lock().connected);

        registry.on_disconnected();
        assert!(!registry.lock().connected);
    }

    #[tokio::test]
    async fn test_route_by_client_request_id() {
        let (registry, mut listeners) = registry_with(&["a", "b"]);
        let (tx, mut unmatched) = Listener::channel();
        registry.lock().unmatched.push(tx);

        registry.on_event(&message(json!({"client_request_id": "b", "buy_price": 1})));
        registry.on_event(&message(json!({"client_request_id": "zzz"})));
        registry.on_event(&message(json!({"status": "ok"})));

        let routed = listeners[1].recv().await.unwrap();
        assert_eq!(routed.payload["buy_price"], 1);

        let first = unmatched.recv().await.unwrap();
        let second = unmatched.recv().await.unwrap();
        assert_eq!(first.payload["client_request_id"], "zzz");
        assert_eq!(second.payload["status"], "ok");

        drop(registry);
        assert!(listeners[0].recv().await.is_none());
    }
}
