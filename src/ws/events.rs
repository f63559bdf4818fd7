//! Streaming session events and listener streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Connection state of a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not connected and not trying to connect.
    Disconnected,
    /// First connection attempt in progress.
    Connecting,
    /// Handshake complete and namespace joined.
    Connected,
    /// Connection lost or failed; attempting again.
    Reconnecting,
    /// Session shut down; terminal.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A business event received on the namespace, passed through unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    /// Event name, e.g. `stream`, `response` or `subscription_success`.
    pub event: String,
    /// Event payload.
    pub payload: Value,
}

impl ChannelMessage {
    /// The `client_request_id` the payload is correlated by, if any.
    pub fn client_request_id(&self) -> Option<&str> {
        self.payload.get("client_request_id")?.as_str()
    }
}

/// An event emitted to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEvent {
    /// Event name.
    pub event: String,
    /// Event payload.
    pub payload: Value,
}

impl OutboundEvent {
    /// Create an outbound event.
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

/// Event delivered to session listeners, in receive order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Namespace joined.
    Connected,
    /// An established connection ended.
    Disconnected {
        /// Why the connection ended.
        reason: String,
    },
    /// A connection attempt failed.
    ConnectError(String),
    /// A protocol or socket error that did not end the connection by itself.
    Error(String),
    /// A new connection attempt is starting.
    Reconnecting,
    /// A business event.
    Message(ChannelMessage),
}

impl SessionEvent {
    /// Socket.IO style event name.
    pub fn name(&self) -> &str {
        match self {
            SessionEvent::Connected => "connect",
            SessionEvent::Disconnected { .. } => "disconnect",
            SessionEvent::ConnectError(_) => "connect_error",
            SessionEvent::Error(_) => "error",
            SessionEvent::Reconnecting => "reconnecting",
            SessionEvent::Message(message) => &message.event,
        }
    }
}

/// A stream of events for one listener.
///
/// Ends when the session is closed.
#[derive(Debug)]
pub struct Listener<T> {
    inner: UnboundedReceiverStream<T>,
}

impl<T> Listener<T> {
    pub(crate) fn channel() -> (mpsc::UnboundedSender<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                inner: UnboundedReceiverStream::new(rx),
            },
        )
    }

    /// Receive the next event, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<T> {
        self.inner.next().await
    }
}

impl<T> Stream for Listener<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
