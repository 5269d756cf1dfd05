//! In-memory transport for tests
//!
//! [`MockTransport::pair`] returns the transport plus a [`MockServer`]
//! handle. The test pushes server events through the handle and inspects
//! everything the client emitted. Dropping or closing the handle ends the
//! event stream.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{ClientEvent, RawEvent, Transport};
use crate::error::TransportError;

pub struct MockTransport {
    incoming: mpsc::UnboundedReceiver<RawEvent>,
    emitted: Arc<Mutex<Vec<ClientEvent>>>,
    fail_emits: Arc<Mutex<bool>>,
    closed: bool,
}

/// Test-side handle of a [`MockTransport`]
#[derive(Clone)]
pub struct MockServer {
    outgoing: mpsc::UnboundedSender<RawEvent>,
    emitted: Arc<Mutex<Vec<ClientEvent>>>,
    fail_emits: Arc<Mutex<bool>>,
}

impl MockTransport {
    pub fn pair() -> (Self, MockServer) {
        let (tx, rx) = mpsc::unbounded_channel();
        let emitted = Arc::new(Mutex::new(Vec::new()));
        let fail_emits = Arc::new(Mutex::new(false));

        let transport = Self {
            incoming: rx,
            emitted: Arc::clone(&emitted),
            fail_emits: Arc::clone(&fail_emits),
            closed: false,
        };
        let server = MockServer {
            outgoing: tx,
            emitted,
            fail_emits,
        };
        (transport, server)
    }
}

impl MockServer {
    /// Deliver a push event to the client. Returns false once the client
    /// side is gone.
    pub fn push(&self, name: &str, payload: Value) -> bool {
        self.outgoing.send(RawEvent::new(name, payload)).is_ok()
    }

    /// Everything the client emitted so far, in order
    pub fn emitted(&self) -> Vec<ClientEvent> {
        self.emitted.lock().unwrap().clone()
    }

    /// Names of emitted events, in order
    pub fn emitted_names(&self) -> Vec<&'static str> {
        self.emitted.lock().unwrap().iter().map(|e| e.name()).collect()
    }

    /// Make subsequent emits fail with `TransportError::Send`
    pub fn fail_emits(&self, fail: bool) {
        *self.fail_emits.lock().unwrap() = fail;
    }

    /// End the event stream
    pub fn close(self) {
        drop(self.outgoing);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn emit(&mut self, event: &ClientEvent) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if *self.fail_emits.lock().unwrap() {
            return Err(TransportError::Send("mock emit failure".to_string()));
        }
        self.emitted.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<RawEvent>, TransportError> {
        if self.closed {
            return Ok(None);
        }
        Ok(self.incoming.recv().await)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        self.incoming.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::CreateRoom;
    use serde_json::json;

    #[tokio::test]
    async fn test_push_and_receive() {
        let (mut transport, server) = MockTransport::pair();
        assert!(server.push("post:num_like", json!({"postId": "p1"})));

        let event = transport.next_event().await.unwrap().unwrap();
        assert_eq!(event.name, "post:num_like");
        assert_eq!(event.payload["postId"], "p1");
    }

    #[tokio::test]
    async fn test_emits_are_recorded() {
        let (mut transport, server) = MockTransport::pair();
        let event = ClientEvent::CreateRoom(CreateRoom {
            user_id: "u1".to_string(),
        });
        transport.emit(&event).await.unwrap();

        assert_eq!(server.emitted(), vec![event]);
        assert_eq!(server.emitted_names(), vec!["create_room"]);
    }

    #[tokio::test]
    async fn test_failing_emits() {
        let (mut transport, server) = MockTransport::pair();
        server.fail_emits(true);
        let event = ClientEvent::CreateRoom(CreateRoom {
            user_id: "u1".to_string(),
        });
        assert!(matches!(
            transport.emit(&event).await,
            Err(TransportError::Send(_))
        ));
        assert!(server.emitted().is_empty());
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let (mut transport, server) = MockTransport::pair();
        server.close();
        assert!(transport.next_event().await.unwrap().is_none());
    }
}
