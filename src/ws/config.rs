//! Streaming session configuration.

use std::time::Duration;

use url::Url;

use crate::error::FalconxError;

/// Streaming endpoint URLs and protocol constants.
pub mod endpoints {
    /// Production streaming endpoint.
    pub const WS_PRODUCTION: &str = "wss://ws.falconx.io";
    /// Stage streaming endpoint.
    pub const WS_STAGE: &str = "wss://ws-stage.falconx.io";
    /// Socket.IO namespace carrying the price stream.
    pub const NAMESPACE: &str = "/streaming";
    /// Route the handshake is signed for.
    pub const HANDSHAKE_PATH: &str = "/socket.io/";
    /// Engine.IO protocol revision spoken by the server.
    pub const ENGINE_IO_VERSION: &str = "3";
}

/// Configuration for a [`StreamingSession`](crate::ws::StreamingSession).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the streaming server (`ws`, `wss`, `http` or `https`).
    pub url: String,
    /// Socket.IO namespace to join.
    pub namespace: String,
    /// Upper bound for one connection attempt, handshake included.
    pub handshake_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: endpoints::WS_PRODUCTION.to_string(),
            namespace: endpoints::NAMESPACE.to_string(),
            handshake_timeout: Duration::from_secs(20),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// The WebSocket URL of the Socket.IO handshake.
    ///
    /// `https://ws.falconx.io` becomes
    /// `wss://ws.falconx.io/socket.io/?EIO=3&transport=websocket`.
    pub fn handshake_url(&self) -> Result<Url, FalconxError> {
        let mut url = Url::parse(&self.url).map_err(|e| {
            FalconxError::Config(format!("invalid streaming URL {}: {e}", self.url))
        })?;

        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(FalconxError::Config(format!(
                    "unsupported streaming URL scheme: {other}"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| FalconxError::Config(format!("cannot use scheme {scheme}")))?;

        url.set_path(endpoints::HANDSHAKE_PATH);
        url.query_pairs_mut()
            .clear()
            .append_pair("EIO", endpoints::ENGINE_IO_VERSION)
            .append_pair("transport", "websocket");

        Ok(url)
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Set the streaming server URL (useful for testing with a local server).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Use the stage environment.
    pub fn use_stage(mut self) -> Self {
        self.config.url = endpoints::WS_STAGE.to_string();
        self
    }

    /// Set the namespace; a missing leading `/` is added.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.config.namespace = if namespace.starts_with('/') {
            namespace
        } else {
            format!("/{namespace}")
        };
        self
    }

    /// Set the handshake timeout.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}
