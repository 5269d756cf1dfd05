//! Service layer for Tunecast
//!
//! `TunecastService` is the entry point front ends use. It owns the shared
//! resources (store, signal bus, API handle, key-value store) and hands out
//! the sub-services and the sync engine built on them:
//!
//! - `SyncEngine`: socket intake, commands and screen loads
//! - `AccountService`: password recovery and profile edits
//! - `PostService`: post edits and fetches
//! - `SignalBus`: scalar updates outside the store
//!
//! # Example
//!
//! ```no_run
//! use libtunecast::service::TunecastService;
//!
//! # async fn example() -> libtunecast::Result<()> {
//! let service = TunecastService::new().await?;
//! let (engine, handle) = service.connect().await?;
//! tokio::spawn(engine.run());
//!
//! handle.subscribe("6412f0c1").ok();
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod engine;
pub mod events;
pub mod loader;
pub mod posts;
pub mod router;
pub mod validation;

pub use account::AccountService;
pub use engine::{EngineCommand, EngineHandle, SyncEngine};
pub use events::{Signal, SignalBus, SignalReceiver};
pub use loader::{Screen, ScreenEvent};
pub use posts::PostService;
pub use router::EventRouter;

use std::sync::Arc;

use crate::api::{Api, ApiClient, HttpApiClient};
use crate::bootstrap::{self, Folders};
use crate::error::{ConfigError, Result, TunecastError};
use crate::kv::KeyValueStore;
use crate::store::Store;
use crate::transport::socketio::SocketIoTransport;
use crate::transport::Transport;
use crate::Config;

pub struct TunecastService {
    config: Arc<Config>,
    store: Store,
    bus: SignalBus,
    api: Api,
    account: AccountService,
    posts: PostService,
}

impl TunecastService {
    /// Service over the default configuration file
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config).await
    }

    /// Service talking to the configured backend over HTTP
    pub async fn from_config(config: Config) -> Result<Self> {
        let client: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(&config.api)?);

        let kv_path = config.kv_path();
        let kv_path = kv_path.to_str().ok_or_else(|| {
            TunecastError::Config(ConfigError::MissingField(
                "storage.kv_path is not valid UTF-8".to_string(),
            ))
        })?;
        let kv = KeyValueStore::new(kv_path).await?;

        Ok(Self::with_parts(config, client, kv))
    }

    /// Service over an arbitrary API client, e.g. `MockApiClient`
    pub fn with_parts(config: Config, client: Arc<dyn ApiClient>, kv: KeyValueStore) -> Self {
        let store = Store::new();
        let bus = SignalBus::new(config.sync.signal_capacity);
        let api = Api::new(client, &config.sync);

        Self {
            account: AccountService::new(api.clone(), kv, store.clone()),
            posts: PostService::new(api.clone(), store.clone()),
            config: Arc::new(config),
            store,
            bus,
            api,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    pub fn subscribe(&self) -> SignalReceiver {
        self.bus.subscribe()
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn account(&self) -> &AccountService {
        &self.account
    }

    pub fn posts(&self) -> &PostService {
        &self.posts
    }

    /// Create the local media folders under the data directory
    pub fn bootstrap(&self) -> Result<Folders> {
        bootstrap::ensure_folders(&self.config.data_dir())
    }

    /// Build an engine over any transport
    pub fn engine<T: Transport>(&self, transport: T) -> (SyncEngine<T>, EngineHandle) {
        SyncEngine::new(
            transport,
            self.store.clone(),
            self.bus.clone(),
            self.api.clone(),
        )
    }

    /// Open the configured socket and build an engine over it
    pub async fn connect(&self) -> Result<(SyncEngine<SocketIoTransport>, EngineHandle)> {
        let transport = SocketIoTransport::connect(&self.config.socket.url).await?;
        Ok(self.engine(transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApiClient;
    use crate::store::Action;
    use crate::types::User;
    use tempfile::TempDir;

    async fn service(data_dir: &str) -> TunecastService {
        let mut config = Config::default_config();
        config.storage.data_dir = data_dir.to_string();
        let kv = KeyValueStore::in_memory().await.unwrap();
        TunecastService::with_parts(config, Arc::new(MockApiClient::new()), kv)
    }

    #[tokio::test]
    async fn test_sub_services_share_the_store() {
        let service = service("/tmp/unused").await;
        service.store().dispatch(Action::SetUser(User {
            id: "amy".to_string(),
            ..Default::default()
        }));

        assert_eq!(service.store().snapshot().me(), Some("amy"));
        assert_eq!(service.bus().subscriber_count(), 0);
        let _rx = service.subscribe();
        assert_eq!(service.bus().subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_uses_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path().to_str().unwrap()).await;

        let folders = service.bootstrap().unwrap();
        assert!(folders.user_avatars.starts_with(temp_dir.path()));
        assert!(folders.user_avatars.is_dir());
    }
}
