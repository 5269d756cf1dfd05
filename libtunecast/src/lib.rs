//! Tunecast - client state sync for a social audio feed
//!
//! This library keeps a normalized client store in step with the backend:
//! REST loads when screens open, socket push events as they arrive, and the
//! account flows that sit around them.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod contact;
pub mod error;
pub mod kv;
pub mod logging;
pub mod selectors;
pub mod service;
pub mod store;
pub mod transport;
pub mod types;
pub mod wire;

// Re-export commonly used types
pub use config::Config;
pub use contact::ContactId;
pub use error::{Result, TunecastError};
pub use kv::KeyValueStore;
pub use service::TunecastService;
pub use store::{Action, AppState, Store};
pub use types::{Comment, Genre, Message, Notification, NotificationAction, Post, User};
