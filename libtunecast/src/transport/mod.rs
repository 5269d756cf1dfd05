//! Real-time transport abstraction
//!
//! The engine only needs two things from a socket: send a named event, and
//! wait for the next named event from the server. Connection management
//! (handshake, heartbeats) stays inside the implementation.
//!
//! - [`socketio::SocketIoTransport`]: Socket.IO v4 over WebSocket
//! - [`mock::MockTransport`]: in-memory, for tests

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::wire::{CreateRoom, ReadNotification, SendPrivateMessage};

pub mod mock;
pub mod socketio;

pub const CREATE_ROOM: &str = "create_room";
pub const SEND_PRIVATE_MESSAGE: &str = "messenger:send_private_message";
pub const READ_NOTIFICATION: &str = "notification:read_notification";

/// A named event delivered by the server
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub name: String,
    pub payload: Value,
}

impl RawEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Events the client emits
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    CreateRoom(CreateRoom),
    SendPrivateMessage(SendPrivateMessage),
    ReadNotification(ReadNotification),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CreateRoom(_) => CREATE_ROOM,
            ClientEvent::SendPrivateMessage(_) => SEND_PRIVATE_MESSAGE,
            ClientEvent::ReadNotification(_) => READ_NOTIFICATION,
        }
    }

    pub fn payload(&self) -> Result<Value, TransportError> {
        let value = match self {
            ClientEvent::CreateRoom(p) => serde_json::to_value(p),
            ClientEvent::SendPrivateMessage(p) => serde_json::to_value(p),
            ClientEvent::ReadNotification(p) => serde_json::to_value(p),
        };
        value.map_err(|e| TransportError::Protocol(format!("Unserializable payload: {e}")))
    }
}

#[async_trait]
pub trait Transport: Send {
    /// Send one event to the server
    async fn emit(&mut self, event: &ClientEvent) -> Result<(), TransportError>;

    /// Wait for the next server event. `Ok(None)` once the connection is
    /// closed.
    ///
    /// Must be cancel-safe: the engine polls it inside `select!`.
    async fn next_event(&mut self) -> Result<Option<RawEvent>, TransportError>;

    /// Close the connection. Further calls to `next_event` return `None`.
    async fn close(&mut self) -> Result<(), TransportError>;
}
