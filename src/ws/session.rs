//! Authenticated Socket.IO streaming session.
//!
//! A [`StreamingSession`] is a handle to a driver task that owns the socket
//! and the connection state. Handle calls are turned into commands; the
//! driver performs the signed handshake, keeps the Engine.IO heartbeat,
//! reconnects after unexpected disconnects and fans incoming events out to
//! listeners and observers.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep, sleep_until, timeout};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::auth::{AuthHeaders, Credentials, SystemClock, TimestampProvider};
use crate::error::FalconxError;
use crate::ws::config::{SessionConfig, endpoints};
use crate::ws::events::{ChannelMessage, ConnectionState, Listener, OutboundEvent, SessionEvent};
use crate::ws::packet::{EnginePacket, OpenInfo, SocketPacket};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Pause after a failed connection attempt.
const FAILED_ATTEMPT_DELAY: Duration = Duration::from_secs(1);

const CLIENT_DISCONNECT: &str = "io client disconnect";

/// Hooks called by the driver task on connection lifecycle events.
///
/// Callbacks run on the driver task and must not block.
pub trait SessionObserver: Send + Sync {
    /// The namespace was joined. Returned events are sent, in order, before
    /// listeners see the `connect` event.
    fn on_connected(&self) -> Vec<OutboundEvent> {
        Vec::new()
    }

    /// An established connection ended.
    fn on_disconnected(&self) {}

    /// A business event arrived.
    fn on_event(&self, _message: &ChannelMessage) {}
}

enum Command {
    Connect,
    Disconnect,
    Emit(OutboundEvent),
    Listen(mpsc::UnboundedSender<SessionEvent>),
    Observe(Arc<dyn SessionObserver>),
    Close,
}

/// A streaming session to the FalconX Socket.IO server.
///
/// Must be created inside a Tokio runtime. Dropping the handle shuts the
/// session down like [`close`](Self::close) without waiting for it.
///
/// # Example
///
/// ```rust,no_run
/// use falconx_api_client::auth::Credentials;
/// use falconx_api_client::ws::{SessionConfig, SessionEvent, StreamingSession};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = StreamingSession::new(Credentials::from_env()?, SessionConfig::default())?;
///     let mut events = session.listen();
///     session.connect()?;
///
///     while let Some(event) = events.recv().await {
///         if let SessionEvent::Message(message) = event {
///             println!("{}: {}", message.event, message.payload);
///         }
///     }
///
///     Ok(())
/// }
/// ```
pub struct StreamingSession {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl StreamingSession {
    /// Create a session in the `Disconnected` state.
    ///
    /// Fails with [`FalconxError::Config`] when the configured URL cannot be
    /// used.
    pub fn new(credentials: Credentials, config: SessionConfig) -> Result<Self, FalconxError> {
        Self::with_clock(credentials, config, Arc::new(SystemClock))
    }

    /// Create a session that signs its handshakes with timestamps from `clock`.
    pub fn with_clock(
        credentials: Credentials,
        config: SessionConfig,
        clock: Arc<dyn TimestampProvider>,
    ) -> Result<Self, FalconxError> {
        let url = config.handshake_url()?;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let driver = Driver {
            connector: Connector {
                credentials,
                config,
                url,
                clock,
            },
            commands: commands_rx,
            state: state_tx,
            audience: Audience::default(),
        };
        let task = tokio::spawn(driver.run());

        Ok(Self {
            commands: commands_tx,
            state: state_rx,
            task,
        })
    }

    /// Start connecting. A no-op while connecting, reconnecting or connected.
    pub fn connect(&self) -> Result<(), FalconxError> {
        self.command(Command::Connect)
    }

    /// Drop the connection, or cancel an attempt in progress, and stay
    /// disconnected until the next [`connect`](Self::connect).
    pub fn disconnect(&self) -> Result<(), FalconxError> {
        self.command(Command::Disconnect)
    }

    /// Emit `event` with `payload` on the namespace.
    ///
    /// Fails with [`FalconxError::Stream`] unless the session is connected.
    pub fn emit(&self, event: impl Into<String>, payload: Value) -> Result<(), FalconxError> {
        let state = self.state();
        if state != ConnectionState::Connected {
            return Err(FalconxError::Stream(format!("cannot emit while {state}")));
        }
        self.send_event(OutboundEvent::new(event, payload))
    }

    /// Queue an event for the current connection without checking the state.
    pub(crate) fn send_event(&self, event: OutboundEvent) -> Result<(), FalconxError> {
        self.command(Command::Emit(event))
    }

    pub(crate) fn observe(&self, observer: Arc<dyn SessionObserver>) -> Result<(), FalconxError> {
        self.command(Command::Observe(observer))
    }

    /// Subscribe to every session event from now on.
    ///
    /// The stream ends when the session is closed.
    pub fn listen(&self) -> Listener<SessionEvent> {
        let (tx, listener) = Listener::channel();
        if self.command(Command::Listen(tx)).is_err() {
            tracing::debug!("Listener registered on a closed session");
        }
        listener
    }

    /// The current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver that observes every state change.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Wait until the session reaches `target`.
    pub async fn wait_for_state(&self, target: ConnectionState) -> Result<(), FalconxError> {
        let mut changes = self.state.clone();
        let reached = changes.wait_for(|state| *state == target).await.is_ok();
        if reached {
            Ok(())
        } else {
            Err(FalconxError::Stream(format!("session closed before {target}")))
        }
    }

    /// Shut the session down and wait for the driver to stop.
    ///
    /// Listener streams end; the state becomes `Closed`.
    pub async fn close(self) {
        if self.commands.send(Command::Close).is_ok() {
            if let Err(e) = self.task.await {
                tracing::warn!("Streaming session driver failed: {}", e);
            }
        }
    }

    fn command(&self, command: Command) -> Result<(), FalconxError> {
        self.commands
            .send(command)
            .map_err(|_| FalconxError::Stream("session closed".into()))
    }
}

impl std::fmt::Debug for StreamingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingSession")
            .field("state", &self.state())
            .finish()
    }
}

/// Immutable inputs of a connection attempt.
struct Connector {
    credentials: Credentials,
    config: SessionConfig,
    url: Url,
    clock: Arc<dyn TimestampProvider>,
}

impl Connector {
    /// Open the socket with signed headers and join the namespace.
    async fn handshake(&self) -> Result<(WsStream, OpenInfo), FalconxError> {
        let auth = AuthHeaders::new(
            &self.credentials,
            self.clock.timestamp(),
            "GET",
            endpoints::HANDSHAKE_PATH,
            "",
        )?;

        let mut request = self.url.as_str().into_client_request()?;
        for (name, value) in auth.pairs() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FalconxError::Stream(format!("invalid header name: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| FalconxError::Stream(format!("invalid header value: {e}")))?;
            request.headers_mut().insert(name, value);
        }

        tracing::debug!(url = %self.url, "Opening streaming socket");
        let (mut socket, _) = connect_async(request).await?;

        let open = loop {
            match next_packet(&mut socket).await? {
                EnginePacket::Open(info) => break info,
                other => tracing::debug!(?other, "Ignoring packet before open"),
            }
        };

        let namespace = &self.config.namespace;
        send_packet(
            &mut socket,
            EnginePacket::Message(SocketPacket::Connect {
                nsp: namespace.clone(),
            }),
        )
        .await?;

        loop {
            match next_packet(&mut socket).await? {
                EnginePacket::Message(SocketPacket::Connect { nsp }) if nsp == *namespace => break,
                EnginePacket::Message(SocketPacket::Error { nsp, data }) if nsp == *namespace => {
                    return Err(FalconxError::Stream(format!(
                        "namespace {namespace} rejected: {data}"
                    )));
                }
                EnginePacket::Ping(data) => {
                    send_packet(&mut socket, EnginePacket::Pong(data)).await?
                }
                other => tracing::debug!(?other, "Ignoring packet before namespace ack"),
            }
        }

        Ok((socket, open))
    }
}

#[derive(Default)]
struct Audience {
    listeners: Vec<mpsc::UnboundedSender<SessionEvent>>,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl Audience {
    fn publish(&mut self, event: SessionEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn apply(&mut self, command: Option<Command>) -> Flow {
        match command {
            None | Some(Command::Close) => Flow::Close,
            Some(Command::Connect) => Flow::Connect,
            Some(Command::Disconnect) => Flow::Disconnect,
            Some(Command::Emit(event)) => Flow::Emit(event),
            Some(Command::Listen(tx)) => {
                self.listeners.push(tx);
                Flow::Continue
            }
            Some(Command::Observe(observer)) => {
                self.observers.push(observer);
                Flow::Continue
            }
        }
    }

    fn disconnected(&mut self, reason: &str) {
        self.publish(SessionEvent::Disconnected {
            reason: reason.to_string(),
        });
        for observer in &self.observers {
            observer.on_disconnected();
        }
    }
}

/// What a command asks the driver to do next.
enum Flow {
    Continue,
    Connect,
    Disconnect,
    Emit(OutboundEvent),
    Close,
}

enum Phase {
    Idle,
    Attempt { delay: Option<Duration> },
}

struct Driver {
    connector: Connector,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<ConnectionState>,
    audience: Audience,
}

impl Driver {
    async fn run(mut self) {
        let mut phase = Some(Phase::Idle);
        while let Some(current) = phase {
            phase = match current {
                Phase::Idle => self.idle().await,
                Phase::Attempt { delay } => self.attempt(delay).await,
            };
        }
        self.state.send_replace(ConnectionState::Closed);
        tracing::debug!("Streaming session closed");
    }

    async fn idle(&mut self) -> Option<Phase> {
        self.state.send_replace(ConnectionState::Disconnected);
        loop {
            match self.audience.apply(self.commands.recv().await) {
                Flow::Connect => {
                    tracing::info!("Connecting streaming session");
                    self.state.send_replace(ConnectionState::Connecting);
                    return Some(Phase::Attempt { delay: None });
                }
                Flow::Emit(event) => {
                    tracing::warn!(event = %event.event, "Dropping emit while disconnected")
                }
                Flow::Continue | Flow::Disconnect => {}
                Flow::Close => return None,
            }
        }
    }

    async fn attempt(&mut self, delay: Option<Duration>) -> Option<Phase> {
        if let Some(delay) = delay {
            let pause = sleep(delay);
            tokio::pin!(pause);
            loop {
                tokio::select! {
                    _ = &mut pause => break,
                    command = self.commands.recv() => match self.audience.apply(command) {
                        Flow::Emit(event) => {
                            tracing::warn!(event = %event.event, "Dropping emit while reconnecting")
                        }
                        Flow::Continue | Flow::Connect => {}
                        Flow::Disconnect => return Some(Phase::Idle),
                        Flow::Close => return None,
                    },
                }
            }
        }

        let result = {
            let handshake = timeout(
                self.connector.config.handshake_timeout,
                self.connector.handshake(),
            );
            tokio::pin!(handshake);
            loop {
                tokio::select! {
                    result = &mut handshake => break result,
                    command = self.commands.recv() => match self.audience.apply(command) {
                        Flow::Emit(event) => {
                            tracing::warn!(event = %event.event, "Dropping emit while connecting")
                        }
                        Flow::Continue | Flow::Connect => {}
                        Flow::Disconnect => return Some(Phase::Idle),
                        Flow::Close => return None,
                    },
                }
            }
        };

        match result {
            Ok(Ok((socket, open))) => self.connected(socket, open).await,
            Ok(Err(e)) => self.attempt_failed(e.to_string()),
            Err(_) => self.attempt_failed("handshake timed out".to_string()),
        }
    }

    fn attempt_failed(&mut self, reason: String) -> Option<Phase> {
        tracing::warn!(%reason, "Streaming connection attempt failed");
        self.audience.publish(SessionEvent::ConnectError(reason));
        self.state.send_replace(ConnectionState::Reconnecting);
        self.audience.publish(SessionEvent::Reconnecting);
        Some(Phase::Attempt {
            delay: Some(FAILED_ATTEMPT_DELAY),
        })
    }

    fn lost(&mut self, reason: &str) -> Option<Phase> {
        tracing::warn!(%reason, "Streaming connection lost");
        self.audience.disconnected(reason);
        self.state.send_replace(ConnectionState::Reconnecting);
        self.audience.publish(SessionEvent::Reconnecting);
        Some(Phase::Attempt { delay: None })
    }

    async fn connected(&mut self, mut socket: WsStream, open: OpenInfo) -> Option<Phase> {
        let namespace = self.connector.config.namespace.clone();

        // Emits queued before this connection belong to the previous one.
        loop {
            match self.commands.try_recv() {
                Ok(command) => match self.audience.apply(Some(command)) {
                    Flow::Emit(event) => {
                        tracing::debug!(
                            event = %event.event,
                            "Dropping emit from previous connection"
                        )
                    }
                    Flow::Continue | Flow::Connect => {}
                    Flow::Disconnect => {
                        leave(&mut socket, &namespace).await;
                        return Some(Phase::Idle);
                    }
                    Flow::Close => {
                        leave(&mut socket, &namespace).await;
                        return None;
                    }
                },
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    leave(&mut socket, &namespace).await;
                    return None;
                }
            }
        }

        self.state.send_replace(ConnectionState::Connected);
        tracing::info!(sid = %open.sid, %namespace, "Streaming session connected");

        let replay: Vec<OutboundEvent> = self
            .audience
            .observers
            .iter()
            .flat_map(|observer| observer.on_connected())
            .collect();
        for event in replay {
            if let Err(e) = send_event(&mut socket, &namespace, event).await {
                self.audience.publish(SessionEvent::Error(e.to_string()));
                return self.lost("transport error");
            }
        }
        self.audience.publish(SessionEvent::Connected);

        let period = open.ping_interval().max(Duration::from_millis(1));
        let mut heartbeat = interval_at(Instant::now() + period, period);
        let mut pong_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                command = self.commands.recv() => match self.audience.apply(command) {
                    Flow::Continue | Flow::Connect => {}
                    Flow::Emit(event) => {
                        if let Err(e) = send_event(&mut socket, &namespace, event).await {
                            self.audience.publish(SessionEvent::Error(e.to_string()));
                            return self.lost("transport error");
                        }
                    }
                    Flow::Disconnect => {
                        leave(&mut socket, &namespace).await;
                        self.audience.disconnected(CLIENT_DISCONNECT);
                        return Some(Phase::Idle);
                    }
                    Flow::Close => {
                        leave(&mut socket, &namespace).await;
                        self.audience.disconnected(CLIENT_DISCONNECT);
                        return None;
                    }
                },
                frame = socket.next() => match frame {
                    Some(Ok(Message::Text(text))) => match EnginePacket::decode(&text) {
                        Ok(packet) => {
                            let outcome = self
                                .dispatch(&mut socket, &namespace, packet, &mut pong_deadline)
                                .await;
                            if let Some(reason) = outcome {
                                return self.lost(reason);
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Dropping undecodable frame: {}", e);
                            self.audience.publish(SessionEvent::Error(e.to_string()));
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => return self.lost("transport close"),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        self.audience.publish(SessionEvent::Error(e.to_string()));
                        return self.lost("transport error");
                    }
                },
                _ = heartbeat.tick() => {
                    if let Err(e) = send_packet(&mut socket, EnginePacket::Ping(None)).await {
                        self.audience.publish(SessionEvent::Error(e.to_string()));
                        return self.lost("transport error");
                    }
                    if pong_deadline.is_none() {
                        pong_deadline = Some(Instant::now() + open.ping_timeout());
                    }
                }
                _ = sleep_until(pong_deadline.unwrap_or_else(Instant::now)),
                    if pong_deadline.is_some() =>
                {
                    return self.lost("ping timeout");
                }
            }
        }
    }

    /// Handle one packet on an established connection. Returns the
    /// disconnect reason when the packet ends the connection.
    async fn dispatch(
        &mut self,
        socket: &mut WsStream,
        namespace: &str,
        packet: EnginePacket,
        pong_deadline: &mut Option<Instant>,
    ) -> Option<&'static str> {
        match packet {
            EnginePacket::Pong(_) => *pong_deadline = None,
            EnginePacket::Ping(data) => {
                if send_packet(socket, EnginePacket::Pong(data)).await.is_err() {
                    return Some("transport error");
                }
            }
            EnginePacket::Close => return Some("transport close"),
            EnginePacket::Message(packet) if packet.nsp() == namespace => match packet {
                SocketPacket::Event { name, payload, .. } => {
                    let message = ChannelMessage {
                        event: name,
                        payload,
                    };
                    for observer in &self.audience.observers {
                        observer.on_event(&message);
                    }
                    self.audience.publish(SessionEvent::Message(message));
                }
                SocketPacket::Disconnect { .. } => return Some("io server disconnect"),
                SocketPacket::Error { data, .. } => {
                    self.audience.publish(SessionEvent::Error(data.to_string()));
                }
                other => tracing::debug!(?other, "Ignoring socket packet"),
            },
            other => tracing::debug!(?other, "Ignoring engine packet"),
        }
        None
    }
}

async fn next_packet(socket: &mut WsStream) -> Result<EnginePacket, FalconxError> {
    loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => return EnginePacket::decode(&text),
            Some(Ok(Message::Close(_))) | None => {
                return Err(FalconxError::Stream("connection closed during handshake".into()));
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

async fn send_packet(socket: &mut WsStream, packet: EnginePacket) -> Result<(), FalconxError> {
    let text = packet.encode()?;
    socket.send(Message::Text(text.into())).await?;
    Ok(())
}

async fn send_event(
    socket: &mut WsStream,
    namespace: &str,
    event: OutboundEvent,
) -> Result<(), FalconxError> {
    tracing::debug!(event = %event.event, "Emitting event");
    send_packet(
        socket,
        EnginePacket::Message(SocketPacket::event(namespace, event.event, event.payload)),
    )
    .await
}

/// Leave the namespace and close the socket, ignoring failures.
async fn leave(socket: &mut WsStream, namespace: &str) {
    let packet = EnginePacket::Message(SocketPacket::Disconnect {
        nsp: namespace.to_string(),
    });
    if let Err(e) = send_packet(socket, packet).await {
        tracing::debug!("Failed to send namespace disconnect: {}", e);
    }
    if let Err(e) = socket.close(None).await {
        tracing::debug!("Failed to close socket: {}", e);
    }
}
