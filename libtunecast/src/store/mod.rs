//! Normalized client store
//!
//! - Actions: what can happen
//! - State: what is true right now
//! - Reducer: pure `(State, Action) -> State`
//!
//! [`Store`] is the shared handle around the state. Dispatch is synchronous:
//! the reducer runs under the channel's write lock, so two dispatches never
//! interleave and every watcher sees transitions in dispatch order.

pub mod actions;
pub mod entity;
pub mod reducer;
pub mod state;

pub use actions::Action;
pub use entity::{Entity, EntityList, Patch};
pub use reducer::reduce;
pub use state::{AppState, CommonState, MessengerState, UserState};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Receiver half handed to views that want to re-render on change
pub type StoreWatcher = watch::Receiver<AppState>;

/// Cloneable handle to the single global store
#[derive(Clone)]
pub struct Store {
    tx: Arc<watch::Sender<AppState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::new())
    }

    pub fn with_state(state: AppState) -> Self {
        let (tx, _) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Apply one action and notify watchers
    pub fn dispatch(&self, action: Action) {
        debug!(action = action.kind(), "dispatch");
        self.tx.send_modify(|state| {
            let current = std::mem::take(state);
            *state = reduce(current, action);
        });
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> AppState {
        self.tx.borrow().clone()
    }

    /// Read part of the state without cloning all of it
    pub fn select<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Subscribe to state changes
    pub fn watch(&self) -> StoreWatcher {
        self.tx.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
