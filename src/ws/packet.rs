//! Engine.IO v3 / Socket.IO v2 text framing.
//!
//! Every WebSocket text frame is one Engine.IO packet: a type digit followed
//! by its data. Message packets (`4`) carry a Socket.IO packet encoded as
//! `<type>[<nsp>,][<id>][<json>]`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::FalconxError;

/// Handshake data announced by the server's open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenInfo {
    /// Session ID.
    pub sid: String,
    /// Interval between client pings, in milliseconds.
    #[serde(rename = "pingInterval")]
    pub ping_interval: u64,
    /// Time to wait for a pong, in milliseconds.
    #[serde(rename = "pingTimeout")]
    pub ping_timeout: u64,
}

impl OpenInfo {
    /// Ping interval as a duration.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval)
    }

    /// Pong timeout as a duration.
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout)
    }
}

/// An Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenInfo),
    Close,
    Ping(Option<String>),
    Pong(Option<String>),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

/// A Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        nsp: String,
    },
    Disconnect {
        nsp: String,
    },
    Event {
        nsp: String,
        id: Option<u64>,
        name: String,
        payload: Value,
    },
    Ack {
        nsp: String,
        id: u64,
        data: Value,
    },
    Error {
        nsp: String,
        data: Value,
    },
}

impl SocketPacket {
    /// Namespace the packet belongs to.
    pub fn nsp(&self) -> &str {
        match self {
            SocketPacket::Connect { nsp }
            | SocketPacket::Disconnect { nsp }
            | SocketPacket::Event { nsp, .. }
            | SocketPacket::Ack { nsp, .. }
            | SocketPacket::Error { nsp, .. } => nsp,
        }
    }

    /// Event packet carrying `payload` as its single argument.
    pub fn event(nsp: impl Into<String>, name: impl Into<String>, payload: Value) -> Self {
        SocketPacket::Event {
            nsp: nsp.into(),
            id: None,
            name: name.into(),
            payload,
        }
    }

    fn encode(&self) -> Result<String, FalconxError> {
        let (kind, nsp, id, data) = match self {
            SocketPacket::Connect { nsp } => ('0', nsp, None, None),
            SocketPacket::Disconnect { nsp } => ('1', nsp, None, None),
            SocketPacket::Event {
                nsp,
                id,
                name,
                payload,
            } => {
                let mut args = vec![Value::String(name.clone())];
                if !payload.is_null() {
                    args.push(payload.clone());
                }
                ('2', nsp, *id, Some(Value::Array(args)))
            }
            SocketPacket::Ack { nsp, id, data } => {
                let args = match data {
                    Value::Array(_) => data.clone(),
                    other => Value::Array(vec![other.clone()]),
                };
                ('3', nsp, Some(*id), Some(args))
            }
            SocketPacket::Error { nsp, data } => ('4', nsp, None, Some(data.clone())),
        };

        let mut out = String::new();
        out.push(kind);
        if !nsp.is_empty() && nsp != "/" {
            out.push_str(nsp);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&serde_json::to_string(&data)?);
        }
        Ok(out)
    }

    fn decode(text: &str) -> Result<Self, FalconxError> {
        let kind = text
            .chars()
            .next()
            .ok_or_else(|| FalconxError::Stream("empty socket packet".into()))?;
        let mut rest = &text[kind.len_utf8()..];

        if matches!(kind, '5' | '6') {
            return Err(FalconxError::Stream(
                "binary socket packets are not supported".into(),
            ));
        }

        let mut nsp = "/".to_string();
        if rest.starts_with('/') {
            let end = rest
                .find(|c: char| c == ',' || c == '[' || c == '{' || c == '"')
                .unwrap_or(rest.len());
            nsp = rest[..end].to_string();
            rest = rest[end..].strip_prefix(',').unwrap_or(&rest[end..]);
        }

        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let id = if digits > 0 {
            Some(
                rest[..digits]
                    .parse::<u64>()
                    .map_err(|e| FalconxError::Stream(format!("invalid packet id: {e}")))?,
            )
        } else {
            None
        };
        rest = &rest[digits..];

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(rest)?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { nsp }),
            '1' => Ok(SocketPacket::Disconnect { nsp }),
            '2' => {
                let mut args = match data {
                    Some(Value::Array(args)) => args,
                    _ => {
                        return Err(FalconxError::Stream(
                            "event packet without argument array".into(),
                        ));
                    }
                };
                if args.is_empty() {
                    return Err(FalconxError::Stream("event packet without name".into()));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(FalconxError::Stream(format!(
                            "event name is not a string: {other}"
                        )));
                    }
                };
                let payload = match args.len() {
                    0 => Value::Null,
                    1 => args.remove(0),
                    _ => Value::Array(args),
                };
                Ok(SocketPacket::Event {
                    nsp,
                    id,
                    name,
                    payload,
                })
            }
            '3' => Ok(SocketPacket::Ack {
                nsp,
                id: id.ok_or_else(|| FalconxError::Stream("ack packet without id".into()))?,
                data: data.unwrap_or(Value::Array(Vec::new())),
            }),
            '4' => Ok(SocketPacket::Error {
                nsp,
                data: data.unwrap_or(Value::Null),
            }),
            other => Err(FalconxError::Stream(format!(
                "unknown socket packet type: {other}"
            ))),
        }
    }
}

impl EnginePacket {
    /// Encode the packet as the text of one WebSocket frame.
    pub fn encode(&self) -> Result<String, FalconxError> {
        Ok(match self {
            EnginePacket::Open(_) => {
                return Err(FalconxError::Stream(
                    "open packets are only sent by the server".into(),
                ));
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data.as_deref().unwrap_or("")),
            EnginePacket::Pong(data) => format!("3{}", data.as_deref().unwrap_or("")),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()?),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        })
    }

    /// Decode the text of one WebSocket frame.
    pub fn decode(text: &str) -> Result<Self, FalconxError> {
        let kind = text
            .chars()
            .next()
            .ok_or_else(|| FalconxError::Stream("empty engine packet".into()))?;
        let rest = &text[kind.len_utf8()..];
        let data = (!rest.is_empty()).then(|| rest.to_string());

        match kind {
            '0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(data)),
            '3' => Ok(EnginePacket::Pong(data)),
            '4' => Ok(EnginePacket::Message(SocketPacket::decode(rest)?)),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(FalconxError::Stream(format!(
                "unknown engine packet type: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open() {
        let packet = EnginePacket::decode(
            r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":5000}"#,
        )
        .unwrap();
        let EnginePacket::Open(info) = packet else {
            panic!("expected open packet");
        };
        assert_eq!(info.sid, "abc");
        assert_eq!(info.ping_interval(), Duration::from_secs(25));
        assert_eq!(info.ping_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_encode_namespace_connect() {
        let packet = EnginePacket::Message(SocketPacket::Connect {
            nsp: "/streaming".into(),
        });
        assert_eq!(packet.encode().unwrap(), "40/streaming,");
    }

    #[test]
    fn test_decode_namespace_connect_with_and_without_comma() {
        for text in ["40/streaming,", "40/streaming"] {
            assert_eq!(
                EnginePacket::decode(text).unwrap(),
                EnginePacket::Message(SocketPacket::Connect {
                    nsp: "/streaming".into()
                })
            );
        }
    }

    #[test]
    fn test_encode_event() {
        let packet = EnginePacket::Message(SocketPacket::event(
            "/streaming",
            "subscribe",
            json!({"client_request_id": "a", "quantity": [1]}),
        ));
        assert_eq!(
            packet.encode().unwrap(),
            r#"42/streaming,["subscribe",{"client_request_id":"a","quantity":[1]}]"#
        );
    }

    #[test]
    fn test_decode_event_with_id() {
        let packet =
            EnginePacket::decode(r#"42/streaming,7["stream",{"client_request_id":"x"}]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                nsp: "/streaming".into(),
                id: Some(7),
                name: "stream".into(),
                payload: json!({"client_request_id": "x"}),
            })
        );
    }

    #[test]
    fn test_decode_root_namespace_event_without_payload() {
        let packet = EnginePacket::decode(r#"42["ping"]"#).unwrap();
        let EnginePacket::Message(SocketPacket::Event { nsp, payload, .. }) = packet else {
            panic!("expected event");
        };
        assert_eq!(nsp, "/");
        assert_eq!(payload, Value::Null);
    }

    #[test]
    fn test_decode_namespace_error() {
        let packet = EnginePacket::decode(r#"44/streaming,"Invalid namespace""#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Error {
                nsp: "/streaming".into(),
                data: json!("Invalid namespace"),
            })
        );
    }

    #[test]
    fn test_binary_packets_rejected() {
        assert!(matches!(
            EnginePacket::decode(r#"451-/streaming,["x",{"_placeholder":true,"num":0}]"#),
            Err(FalconxError::Stream(_))
        ));
    }

    #[test]
    fn test_ping_pong() {
        assert_eq!(EnginePacket::Ping(None).encode().unwrap(), "2");
        assert_eq!(EnginePacket::decode("3").unwrap(), EnginePacket::Pong(None));
        assert_eq!(
            EnginePacket::decode("2probe").unwrap(),
            EnginePacket::Ping(Some("probe".into()))
        );
    }

    #[test]
    fn test_unknown_packet_type() {
        assert!(EnginePacket::decode("9").is_err());
        assert!(EnginePacket::decode("").is_err());
    }
}
