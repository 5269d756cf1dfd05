//! Socket.IO v4 client over WebSocket
//!
//! Only the text frames the backend uses are handled: Engine.IO open,
//! close, ping/pong and message, with Socket.IO connect, disconnect and
//! event packets on the default namespace. Binary attachments and acks
//! are not supported; such frames are logged and skipped.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use super::{ClientEvent, RawEvent, Transport};
use crate::error::TransportError;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// One decoded text frame
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// `0{...}` Engine.IO handshake with session parameters
    Open(Value),
    /// `1`
    Close,
    /// `2`
    Ping,
    /// `3`
    Pong,
    /// `40` or `40{...}`
    Connect(Option<Value>),
    /// `41`
    Disconnect,
    /// `42["name",payload]`, optionally with an ack id before the array
    Event {
        name: String,
        payload: Value,
        ack_id: Option<u64>,
    },
    /// `44{...}`
    ConnectError(Value),
    /// `6`
    Noop,
}

impl Packet {
    pub fn event(name: impl Into<String>, payload: Value) -> Self {
        Packet::Event {
            name: name.into(),
            payload,
            ack_id: None,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Packet::Open(data) => format!("0{data}"),
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => "3".to_string(),
            Packet::Connect(None) => "40".to_string(),
            Packet::Connect(Some(auth)) => format!("40{auth}"),
            Packet::Disconnect => "41".to_string(),
            Packet::Event {
                name,
                payload,
                ack_id,
            } => {
                let args = Value::Array(vec![Value::String(name.clone()), payload.clone()]);
                match ack_id {
                    Some(id) => format!("42{id}{args}"),
                    None => format!("42{args}"),
                }
            }
            Packet::ConnectError(data) => format!("44{data}"),
            Packet::Noop => "6".to_string(),
        }
    }

    pub fn decode(frame: &str) -> Result<Self, TransportError> {
        let mut chars = frame.chars();
        let engine = chars
            .next()
            .ok_or_else(|| TransportError::Protocol("Empty frame".to_string()))?;
        let rest = chars.as_str();

        match engine {
            '0' => Ok(Packet::Open(parse_json(rest)?)),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => decode_message(rest),
            '6' => Ok(Packet::Noop),
            other => Err(TransportError::Protocol(format!(
                "Unknown Engine.IO packet type '{other}'"
            ))),
        }
    }
}

fn decode_message(body: &str) -> Result<Packet, TransportError> {
    let mut chars = body.chars();
    let kind = chars
        .next()
        .ok_or_else(|| TransportError::Protocol("Empty message packet".to_string()))?;
    let rest = skip_namespace(chars.as_str());

    match kind {
        '0' if rest.is_empty() => Ok(Packet::Connect(None)),
        '0' => Ok(Packet::Connect(Some(parse_json(rest)?))),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(rest),
        '4' => Ok(Packet::ConnectError(parse_json(rest)?)),
        other => Err(TransportError::Protocol(format!(
            "Unsupported Socket.IO packet type '{other}'"
        ))),
    }
}

/// Strip a `/nsp,` prefix. Only the default namespace is used.
fn skip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.find(',') {
            Some(idx) => &body[idx + 1..],
            None => "",
        }
    } else {
        body
    }
}

fn decode_event(body: &str) -> Result<Packet, TransportError> {
    let split = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    let (digits, array) = body.split_at(split);
    let ack_id = if digits.is_empty() {
        None
    } else {
        Some(
            digits
                .parse::<u64>()
                .map_err(|e| TransportError::Protocol(format!("Bad ack id: {e}")))?,
        )
    };

    let args = match parse_json(array)? {
        Value::Array(args) => args,
        other => {
            return Err(TransportError::Protocol(format!(
                "Event arguments must be an array, got {other}"
            )))
        }
    };

    let mut args = args.into_iter();
    let name = match args.next() {
        Some(Value::String(name)) => name,
        _ => {
            return Err(TransportError::Protocol(
                "Event is missing its name".to_string(),
            ))
        }
    };

    Ok(Packet::Event {
        name,
        payload: args.next().unwrap_or(Value::Null),
        ack_id,
    })
}

fn parse_json(text: &str) -> Result<Value, TransportError> {
    serde_json::from_str(text).map_err(|e| TransportError::Protocol(format!("Bad JSON: {e}")))
}

/// Build the Engine.IO endpoint from a base socket URL
pub fn endpoint(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.contains("/socket.io") {
        if base.contains('?') {
            base.to_string()
        } else {
            format!("{base}/?EIO=4&transport=websocket")
        }
    } else {
        format!("{base}/socket.io/?EIO=4&transport=websocket")
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct SocketIoTransport {
    ws: Socket,
    pong_pending: bool,
    closed: bool,
}

impl SocketIoTransport {
    /// Open the WebSocket and complete the Engine.IO and Socket.IO handshakes
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let endpoint = endpoint(url);
        debug!(endpoint = %endpoint, "connecting socket");

        let (ws, _response) = timeout(HANDSHAKE_TIMEOUT, connect_async(endpoint.as_str()))
            .await
            .map_err(|_| TransportError::Connect("WebSocket connect timeout".to_string()))?
            .map_err(|e| TransportError::Connect(format!("WebSocket connect failed: {e}")))?;

        let mut transport = Self {
            ws,
            pong_pending: false,
            closed: false,
        };

        timeout(HANDSHAKE_TIMEOUT, transport.handshake())
            .await
            .map_err(|_| TransportError::Connect("Socket.IO handshake timeout".to_string()))??;

        debug!("socket connected");
        Ok(transport)
    }

    async fn handshake(&mut self) -> Result<(), TransportError> {
        match self.read_packet().await? {
            Some(Packet::Open(session)) => trace!(%session, "engine.io open"),
            Some(other) => {
                return Err(TransportError::Protocol(format!(
                    "Expected open packet, got {other:?}"
                )))
            }
            None => return Err(TransportError::Closed),
        }

        self.write(Packet::Connect(None)).await?;

        loop {
            match self.read_packet().await? {
                Some(Packet::Connect(_)) => return Ok(()),
                Some(Packet::ConnectError(data)) => {
                    return Err(TransportError::Connect(format!("Server refused: {data}")))
                }
                Some(Packet::Ping) => self.write(Packet::Pong).await?,
                Some(_) => continue,
                None => return Err(TransportError::Closed),
            }
        }
    }

    async fn write(&mut self, packet: Packet) -> Result<(), TransportError> {
        self.ws
            .send(Message::Text(packet.encode()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn flush_pong(&mut self) -> Result<(), TransportError> {
        if self.pong_pending {
            self.write(Packet::Pong).await?;
            self.pong_pending = false;
        }
        Ok(())
    }

    /// Next text frame, `None` when the socket is gone. Errors are socket
    /// failures only.
    async fn read_text(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let message = match self.ws.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(TransportError::Connect(e.to_string())),
                None => return Ok(None),
            };

            match message {
                Message::Text(text) => return Ok(Some(text)),
                Message::Close(_) => return Ok(None),
                // tungstenite answers WebSocket-level pings itself
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Binary(_) => warn!("ignoring binary socket frame"),
                Message::Frame(_) => continue,
            }
        }
    }

    /// Next decoded packet. A frame that does not decode is an error here.
    async fn read_packet(&mut self) -> Result<Option<Packet>, TransportError> {
        match self.read_text().await? {
            Some(text) => Packet::decode(&text).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Transport for SocketIoTransport {
    async fn emit(&mut self, event: &ClientEvent) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.flush_pong().await?;
        let packet = Packet::event(event.name(), event.payload()?);
        trace!(event = event.name(), "emit");
        self.write(packet).await
    }

    async fn next_event(&mut self) -> Result<Option<RawEvent>, TransportError> {
        if self.closed {
            return Ok(None);
        }
        loop {
            self.flush_pong().await?;

            let text = match self.read_text().await? {
                Some(text) => text,
                None => {
                    self.closed = true;
                    return Ok(None);
                }
            };
            let packet = match Packet::decode(&text) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!(error = %e, "dropping socket frame");
                    continue;
                }
            };

            match packet {
                Packet::Event { name, payload, .. } => return Ok(Some(RawEvent { name, payload })),
                Packet::Ping => self.pong_pending = true,
                Packet::Disconnect | Packet::Close => {
                    self.closed = true;
                    return Ok(None);
                }
                other => trace!(?other, "ignoring packet"),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // Best effort; the server may already be gone.
        let _ = self.write(Packet::Disconnect).await;
        self.ws
            .close(None)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}
