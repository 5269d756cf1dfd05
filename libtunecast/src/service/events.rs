//! Signal bus for scalar updates outside the store
//!
//! Some push events (the follower count) are not store state: any listener,
//! connected to the store or not, may want them. The bus is a
//! `tokio::sync::broadcast` channel created once at startup and passed by
//! handle to whoever needs it.
//!
//! Emitting with no subscribers drops the signal. A lagging subscriber loses
//! the oldest signals rather than blocking the emitter.
//!
//! ```
//! use libtunecast::service::events::{Signal, SignalBus};
//!
//! # async fn example() {
//! let bus = SignalBus::new(16);
//! let mut rx = bus.subscribe();
//! bus.emit(Signal::Followers { count: 10 });
//! assert_eq!(rx.recv().await.unwrap(), Signal::Followers { count: 10 });
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub type SignalReceiver = broadcast::Receiver<Signal>;

#[derive(Clone)]
pub struct SignalBus {
    sender: broadcast::Sender<Signal>,
}

impl SignalBus {
    /// `capacity` is the per-subscriber buffer before lagging sets in,
    /// at least 1.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> SignalReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, signal: Signal) {
        // Err only means nobody is listening.
        let _ = self.sender.send(signal);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// The logged-in user's follower count changed
    Followers { count: u64 },

    /// The engine subscribed to push events for a user
    Subscribed { user_id: String },

    /// The transport stopped delivering events
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = SignalBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit(Signal::Followers { count: 10 });

        assert_eq!(rx.recv().await.unwrap(), Signal::Followers { count: 10 });
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = SignalBus::new(10);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.emit(Signal::Disconnected);

        assert_eq!(a.recv().await.unwrap(), Signal::Disconnected);
        assert_eq!(b.recv().await.unwrap(), Signal::Disconnected);
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let bus = SignalBus::new(10);
        bus.emit(Signal::Followers { count: 1 });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_oldest() {
        let bus = SignalBus::new(2);
        let mut rx = bus.subscribe();

        for count in 0..5 {
            bus.emit(Signal::Followers { count });
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.unwrap(), Signal::Followers { count: 3 });
    }

    #[tokio::test]
    async fn test_zero_capacity_still_delivers() {
        let bus = SignalBus::new(0);
        let mut rx = bus.subscribe();
        bus.emit(Signal::Disconnected);
        assert_eq!(rx.recv().await.unwrap(), Signal::Disconnected);
    }

    #[test]
    fn test_signal_serialization() {
        let json = serde_json::to_string(&Signal::Followers { count: 7 }).unwrap();
        assert_eq!(json, r#"{"type":"followers","count":7}"#);
    }
}
